//! Fact fixtures for unit tests.

use folio_store::MemoryFactStore;
use folio_types::{Attribute, BlockType, EntityId, Fact, FactData, ListStyle};
use rand::Rng;

/// A container plus the facts describing its blocks.
pub(crate) struct Fixture {
    pub root: EntityId,
    pub facts: Vec<Fact>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            root: EntityId::new(),
            facts: Vec::new(),
        }
    }

    /// Plain text block directly under the container.
    pub fn text(&mut self, position: &str) -> EntityId {
        self.text_under(self.root, position)
    }

    /// List item under `parent`, ordered or unordered, without a number.
    pub fn item(&mut self, parent: EntityId, position: &str, ordered: bool) -> EntityId {
        let entity = self.text_under(parent, position);
        self.facts.push(Fact::new(
            entity,
            Attribute::IsList,
            FactData::Boolean { value: true },
        ));
        let style = if ordered {
            ListStyle::Ordered
        } else {
            ListStyle::Unordered
        };
        self.facts.push(Fact::new(
            entity,
            Attribute::ListStyle,
            FactData::ListStyle { value: style },
        ));
        entity
    }

    fn text_under(&mut self, parent: EntityId, position: &str) -> EntityId {
        let entity = EntityId::new();
        self.facts.push(Fact::child(parent, entity, position));
        self.facts.push(Fact::new(
            entity,
            Attribute::BlockType,
            FactData::BlockType {
                value: BlockType::Text,
            },
        ));
        entity
    }

    /// Make `entity` ordered, optionally with a stored number.
    pub fn set_ordered(&mut self, entity: EntityId, number: Option<i64>) {
        self.facts
            .retain(|f| !(f.entity == entity && f.attribute == Attribute::ListStyle));
        self.facts.push(Fact::new(
            entity,
            Attribute::ListStyle,
            FactData::ListStyle {
                value: ListStyle::Ordered,
            },
        ));
        if let Some(n) = number {
            self.set_number(entity, n);
        }
    }

    pub fn set_number(&mut self, entity: EntityId, number: i64) {
        self.facts
            .retain(|f| !(f.entity == entity && f.attribute == Attribute::ListNumber));
        self.facts.push(Fact::new(
            entity,
            Attribute::ListNumber,
            FactData::Number { value: number },
        ));
    }

    /// Initialized in-memory store holding the fixture's facts.
    pub fn store(&self) -> MemoryFactStore {
        MemoryFactStore::with_facts(self.facts.clone())
    }

    /// A random document: plain blocks and list trees of mixed style, with
    /// some stale numbers and the odd untyped row.
    pub fn random(rng: &mut impl Rng, blocks: usize) -> Self {
        let mut fx = Self::new();
        let mut items: Vec<EntityId> = Vec::new();
        for i in 0..blocks {
            let position = format!("{:04}", rng.gen_range(0..10_000));
            let roll = rng.gen_range(0..10);
            if roll == 0 {
                fx.facts.push(Fact::child(fx.root, EntityId::new(), position));
            } else if roll < 3 || (items.is_empty() && roll < 5) {
                fx.text(&position);
            } else {
                let parent = if items.is_empty() || rng.gen_bool(0.4) {
                    fx.root
                } else {
                    items[rng.gen_range(0..items.len())]
                };
                let item = fx.item(parent, &position, rng.gen_bool(0.7));
                if rng.gen_bool(0.5) {
                    fx.set_number(item, i as i64 + 1);
                }
                items.push(item);
            }
        }
        fx
    }
}
