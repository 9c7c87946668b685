//! Attribute vocabulary and schema.
//!
//! Every fact names one attribute. The attribute decides how many facts an
//! entity may hold for it (cardinality) and which payload shape its value
//! carries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// How many live facts an `(entity, attribute)` pair may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// Re-asserting replaces the previous value.
    One,
    /// Every assertion adds a fact.
    Many,
}

/// Payload shape expected for an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Boolean,
    Number,
    ListStyle,
    BlockType,
    Reference,
    OrderedReference,
}

/// Attributes understood by the block model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString)]
pub enum Attribute {
    /// Parent → child containment. Value carries the child entity and position.
    #[serde(rename = "card/block")]
    #[strum(serialize = "card/block")]
    CardBlock,
    #[serde(rename = "block/type")]
    #[strum(serialize = "block/type")]
    BlockType,
    #[serde(rename = "block/is-list")]
    #[strum(serialize = "block/is-list")]
    IsList,
    #[serde(rename = "block/list-style")]
    #[strum(serialize = "block/list-style")]
    ListStyle,
    #[serde(rename = "block/list-number")]
    #[strum(serialize = "block/list-number")]
    ListNumber,
    #[serde(rename = "block/check-list")]
    #[strum(serialize = "block/check-list")]
    CheckList,
    /// Page opened by a card block.
    #[serde(rename = "block/card")]
    #[strum(serialize = "block/card")]
    Card,
    #[serde(rename = "mailbox/archive")]
    #[strum(serialize = "mailbox/archive")]
    MailboxArchive,
    #[serde(rename = "mailbox/draft")]
    #[strum(serialize = "mailbox/draft")]
    MailboxDraft,
    /// `doc` or `canvas`.
    #[serde(rename = "page/type")]
    #[strum(serialize = "page/type")]
    PageType,
}

impl Attribute {
    /// Every attribute, in declaration order.
    pub const ALL: [Attribute; 10] = [
        Attribute::CardBlock,
        Attribute::BlockType,
        Attribute::IsList,
        Attribute::ListStyle,
        Attribute::ListNumber,
        Attribute::CheckList,
        Attribute::Card,
        Attribute::MailboxArchive,
        Attribute::MailboxDraft,
        Attribute::PageType,
    ];

    /// Parse from the wire name (e.g. `"card/block"`).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::CardBlock => "card/block",
            Attribute::BlockType => "block/type",
            Attribute::IsList => "block/is-list",
            Attribute::ListStyle => "block/list-style",
            Attribute::ListNumber => "block/list-number",
            Attribute::CheckList => "block/check-list",
            Attribute::Card => "block/card",
            Attribute::MailboxArchive => "mailbox/archive",
            Attribute::MailboxDraft => "mailbox/draft",
            Attribute::PageType => "page/type",
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Attribute::CardBlock => Cardinality::Many,
            _ => Cardinality::One,
        }
    }

    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            Attribute::CardBlock => PayloadKind::OrderedReference,
            Attribute::BlockType => PayloadKind::BlockType,
            Attribute::IsList | Attribute::CheckList => PayloadKind::Boolean,
            Attribute::ListStyle => PayloadKind::ListStyle,
            Attribute::ListNumber => PayloadKind::Number,
            Attribute::Card | Attribute::MailboxArchive | Attribute::MailboxDraft => {
                PayloadKind::Reference
            }
            Attribute::PageType => PayloadKind::Text,
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
