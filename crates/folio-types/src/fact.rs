//! Facts: the only persisted unit.
//!
//! A fact is an immutable `(id, entity, attribute, data)` record. Higher level
//! structures (blocks, lists, pages) are views computed over the fact set.
//! The JSON shape matches what editors exchange:
//!
//! ```json
//! { "id": "…", "entity": "…", "attribute": "card/block",
//!   "data": { "type": "ordered-reference", "value": "…", "position": "a0" } }
//! ```

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, PayloadKind};
use crate::block::{BlockType, ListStyle};
use crate::ids::{EntityId, FactId};

/// Typed fact payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FactData {
    Text { value: String },
    Boolean { value: bool },
    Number { value: i64 },
    #[serde(rename = "list-style-union")]
    ListStyle { value: ListStyle },
    #[serde(rename = "block-type-union")]
    BlockType { value: BlockType },
    Reference { value: EntityId },
    /// Child entity placed at a fractional `position` among its siblings.
    OrderedReference { value: EntityId, position: String },
}

impl FactData {
    pub fn kind(&self) -> PayloadKind {
        match self {
            FactData::Text { .. } => PayloadKind::Text,
            FactData::Boolean { .. } => PayloadKind::Boolean,
            FactData::Number { .. } => PayloadKind::Number,
            FactData::ListStyle { .. } => PayloadKind::ListStyle,
            FactData::BlockType { .. } => PayloadKind::BlockType,
            FactData::Reference { .. } => PayloadKind::Reference,
            FactData::OrderedReference { .. } => PayloadKind::OrderedReference,
        }
    }

    /// Entity this payload points at, if it is a reference.
    pub fn referenced_entity(&self) -> Option<EntityId> {
        match self {
            FactData::Reference { value } | FactData::OrderedReference { value, .. } => {
                Some(*value)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FactData::Boolean { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            FactData::Number { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactData::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_list_style(&self) -> Option<ListStyle> {
        match self {
            FactData::ListStyle { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_block_type(&self) -> Option<&BlockType> {
        match self {
            FactData::BlockType { value } => Some(value),
            _ => None,
        }
    }

    /// Position of an ordered reference.
    pub fn position(&self) -> Option<&str> {
        match self {
            FactData::OrderedReference { position, .. } => Some(position),
            _ => None,
        }
    }
}

/// Payload does not match the attribute's schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactError {
    #[error("attribute {attribute} expects a {expected:?} payload, got {got:?}")]
    PayloadMismatch {
        attribute: Attribute,
        expected: PayloadKind,
        got: PayloadKind,
    },
}

/// One entity–attribute–value record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub entity: EntityId,
    pub attribute: Attribute,
    pub data: FactData,
}

impl Fact {
    /// Create a fact with a fresh id.
    pub fn new(entity: EntityId, attribute: Attribute, data: FactData) -> Self {
        Self {
            id: FactId::new(),
            entity,
            attribute,
            data,
        }
    }

    /// Containment fact placing `child` under `parent` at `position`.
    pub fn child(parent: EntityId, child: EntityId, position: impl Into<String>) -> Self {
        Self::new(
            parent,
            Attribute::CardBlock,
            FactData::OrderedReference {
                value: child,
                position: position.into(),
            },
        )
    }

    /// Check the payload against the attribute schema.
    pub fn validate(&self) -> Result<(), FactError> {
        let expected = self.attribute.payload_kind();
        let got = self.data.kind();
        if expected == got {
            Ok(())
        } else {
            Err(FactError::PayloadMismatch {
                attribute: self.attribute,
                expected,
                got,
            })
        }
    }

    /// Sibling sort key for containment facts: `(position, id)`.
    ///
    /// Non-containment facts sort with an empty position.
    pub fn sibling_key(&self) -> (&str, FactId) {
        (self.data.position().unwrap_or(""), self.id)
    }
}

/// Sort containment facts into sibling order: position first, fact id on ties.
pub fn sort_siblings(facts: &mut [Fact]) {
    facts.sort_by(|a, b| a.sibling_key().cmp(&b.sibling_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_reference_json_shape() {
        let parent = EntityId::named("parent");
        let child = EntityId::named("child");
        let fact = Fact::child(parent, child, "a0");
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["attribute"], "card/block");
        assert_eq!(json["data"]["type"], "ordered-reference");
        assert_eq!(json["data"]["position"], "a0");
        assert_eq!(json["data"]["value"], child.to_string());
    }

    #[test]
    fn test_list_style_payload_tag() {
        let data = FactData::ListStyle {
            value: ListStyle::Ordered,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "list-style-union");
        assert_eq!(json["value"], "ordered");
    }

    #[test]
    fn test_validate_rejects_mismatch() {
        let fact = Fact::new(
            EntityId::new(),
            Attribute::ListNumber,
            FactData::Boolean { value: true },
        );
        assert!(matches!(
            fact.validate(),
            Err(FactError::PayloadMismatch {
                expected: PayloadKind::Number,
                ..
            })
        ));
    }

    #[test]
    fn test_sort_siblings_ties_break_on_fact_id() {
        let parent = EntityId::new();
        let mut a = Fact::child(parent, EntityId::new(), "b");
        let mut b = Fact::child(parent, EntityId::new(), "b");
        let c = Fact::child(parent, EntityId::new(), "a");
        a.id = FactId::parse("00000000-0000-7000-8000-000000000002").unwrap();
        b.id = FactId::parse("00000000-0000-7000-8000-000000000001").unwrap();

        let mut facts = vec![a.clone(), b.clone(), c.clone()];
        sort_siblings(&mut facts);
        assert_eq!(facts, vec![c, b, a]);
    }
}
