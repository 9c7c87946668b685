//! Block content types and list styles.
//!
//! `BlockType` is open-ended: editors add block types faster than the core
//! learns about them, so unknown names survive as `Other` instead of failing
//! to parse. Only `Card` and `Mailbox` carry structural side effects here.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// What a block *is*.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "kebab-case")]
pub enum BlockType {
    #[default]
    Text,
    Heading,
    Image,
    /// Opens a child page (`block/card`).
    Card,
    /// Owns archive and draft pages.
    Mailbox,
    Link,
    Embed,
    Button,
    Code,
    Math,
    Blockquote,
    HorizontalRule,
    #[strum(default)]
    Other(String),
}

impl BlockType {
    /// Wire name.
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::Image => "image",
            BlockType::Card => "card",
            BlockType::Mailbox => "mailbox",
            BlockType::Link => "link",
            BlockType::Embed => "embed",
            BlockType::Button => "button",
            BlockType::Code => "code",
            BlockType::Math => "math",
            BlockType::Blockquote => "blockquote",
            BlockType::HorizontalRule => "horizontal-rule",
            BlockType::Other(name) => name,
        }
    }
}

impl From<String> for BlockType {
    fn from(s: String) -> Self {
        // `#[strum(default)]` makes parsing infallible.
        <Self as FromStr>::from_str(&s).unwrap_or(BlockType::Other(s))
    }
}

impl From<BlockType> for String {
    fn from(t: BlockType) -> String {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marker style of a list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ListStyle {
    #[default]
    Unordered,
    Ordered,
}

impl ListStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListStyle::Unordered => "unordered",
            ListStyle::Ordered => "ordered",
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, ListStyle::Ordered)
    }
}

impl std::fmt::Display for ListStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of page a block container represents (`page/type`).
pub const PAGE_TYPE_CANVAS: &str = "canvas";
