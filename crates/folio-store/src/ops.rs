//! Fact store traits.
//!
//! [`FactRead`] is the read side: scans by entity–attribute and by referenced
//! value. [`FactStore`] adds the write primitives and, on top of them, the
//! structural block moves as default methods. Backends only implement the
//! primitives; every move is expressed in terms of them so the memory and
//! SQLite backends agree on structure by construction.

use std::collections::HashSet;

use async_trait::async_trait;

use folio_types::{Attribute, Cardinality, EntityId, Fact, FactData, FactId, sort_siblings};

use crate::StoreResult;
use crate::position::{position_after, position_between};

/// Where [`FactStore::move_block`] places a block among its new siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockPosition {
    /// Before every existing child.
    First,
    /// After every existing child.
    End,
    /// Directly after this sibling (falls back to `End` if it is not a child).
    After(EntityId),
}

/// Arguments for [`FactStore::outdent_block`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutdentMove {
    pub block: EntityId,
    pub new_parent: EntityId,
    pub old_parent: EntityId,
    /// Sibling in `new_parent` the block lands after.
    pub after: EntityId,
    /// Old siblings that must not be adopted (they are moving in the same batch).
    pub exclude_from_siblings: Vec<EntityId>,
}

/// Read side of the fact store.
///
/// Scans return facts in insertion order. Cardinality-one attributes hold at
/// most one live fact, so `[0]` is the value.
#[async_trait]
pub trait FactRead: Send + Sync {
    /// False until the store has been seeded. Tree queries treat an
    /// uninitialized store as "no data yet", distinct from an empty one.
    async fn is_initialized(&self) -> StoreResult<bool>;

    /// All facts with `entity` and `attribute`.
    async fn scan_eav(&self, entity: EntityId, attribute: Attribute) -> StoreResult<Vec<Fact>>;

    /// All `attribute` facts whose reference payload points at `value`.
    async fn scan_vae(&self, value: EntityId, attribute: Attribute) -> StoreResult<Vec<Fact>>;

    /// Every fact about `entity`.
    async fn entity_facts(&self, entity: EntityId) -> StoreResult<Vec<Fact>>;

    /// Every live fact, in insertion order.
    async fn all_facts(&self) -> StoreResult<Vec<Fact>>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Payload of the first fact for `(entity, attribute)`.
    async fn value(&self, entity: EntityId, attribute: Attribute) -> StoreResult<Option<FactData>> {
        Ok(self
            .scan_eav(entity, attribute)
            .await?
            .into_iter()
            .next()
            .map(|f| f.data))
    }

    /// Containment facts of `parent`, in sibling order.
    async fn children(&self, parent: EntityId) -> StoreResult<Vec<Fact>> {
        let mut facts = self.scan_eav(parent, Attribute::CardBlock).await?;
        sort_siblings(&mut facts);
        Ok(facts)
    }
}

/// Write side of the fact store.
#[async_trait]
pub trait FactStore: FactRead {
    /// Set the `initialized` sentinel.
    async fn set_initialized(&self) -> StoreResult<()>;

    /// Insert a fact, or replace the fact with the same id.
    ///
    /// For cardinality-one attributes any other fact on the same
    /// `(entity, attribute)` pair is dropped, so the pair stays single-valued.
    async fn put_fact(&self, fact: Fact) -> StoreResult<()>;

    /// Remove one fact. Unknown ids are ignored.
    async fn retract_fact(&self, id: FactId) -> StoreResult<()>;

    /// Remove every fact on `(entity, attribute)`.
    async fn retract_attribute(&self, entity: EntityId, attribute: Attribute) -> StoreResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Assert a value. Cardinality-one attributes keep their fact id and
    /// have their payload replaced; cardinality-many attributes gain a fact.
    async fn assert_fact(
        &self,
        entity: EntityId,
        attribute: Attribute,
        data: FactData,
    ) -> StoreResult<FactId> {
        let id = match attribute.cardinality() {
            Cardinality::One => self
                .scan_eav(entity, attribute)
                .await?
                .first()
                .map(|f| f.id)
                .unwrap_or_default(),
            Cardinality::Many => FactId::new(),
        };
        self.put_fact(Fact {
            id,
            entity,
            attribute,
            data,
        })
        .await?;
        Ok(id)
    }

    // ========================================================================
    // Structural moves
    // ========================================================================

    /// Append `entity` as the last child of `parent` under containment fact `fact_id`.
    async fn add_last_block(
        &self,
        parent: EntityId,
        fact_id: FactId,
        entity: EntityId,
    ) -> StoreResult<()> {
        let siblings = self.children(parent).await?;
        let last = siblings.last().and_then(|f| f.data.position());
        let position = position_after(last);
        tracing::debug!(%parent, %entity, %position, "add_last_block");
        self.put_fact(Fact {
            id: fact_id,
            entity: parent,
            attribute: Attribute::CardBlock,
            data: FactData::OrderedReference {
                value: entity,
                position,
            },
        })
        .await
    }

    /// Move `block` out of `old_parent` into `new_parent` at `position`.
    ///
    /// No-op if `block` is not a child of `old_parent`.
    async fn move_block(
        &self,
        block: EntityId,
        old_parent: EntityId,
        new_parent: EntityId,
        position: BlockPosition,
    ) -> StoreResult<()> {
        let old_siblings = self.children(old_parent).await?;
        let Some(containment) = old_siblings
            .iter()
            .find(|f| f.data.referenced_entity() == Some(block))
        else {
            tracing::debug!(%block, %old_parent, "move_block: not a child, skipping");
            return Ok(());
        };
        self.retract_fact(containment.id).await?;

        let siblings = self.children(new_parent).await?;
        let new_position = match position {
            BlockPosition::First => {
                position_between(None, siblings.first().and_then(|f| f.data.position()))
            }
            BlockPosition::End => position_after(siblings.last().and_then(|f| f.data.position())),
            BlockPosition::After(anchor) => {
                match siblings
                    .iter()
                    .position(|f| f.data.referenced_entity() == Some(anchor))
                {
                    Some(i) => position_between(
                        siblings[i].data.position(),
                        siblings.get(i + 1).and_then(|f| f.data.position()),
                    ),
                    None => position_after(siblings.last().and_then(|f| f.data.position())),
                }
            }
        };

        tracing::debug!(%block, %old_parent, %new_parent, position = %new_position, "move_block");
        self.put_fact(Fact::child(new_parent, block, new_position)).await
    }

    /// Move every child of `old_parent` into `new_parent`, directly after
    /// `after`, keeping their relative order.
    async fn move_children(
        &self,
        old_parent: EntityId,
        new_parent: EntityId,
        after: EntityId,
    ) -> StoreResult<()> {
        let children = self.children(old_parent).await?;
        if children.is_empty() {
            return Ok(());
        }

        let siblings = self.children(new_parent).await?;
        let (mut lower, upper) = match siblings
            .iter()
            .position(|f| f.data.referenced_entity() == Some(after))
        {
            Some(i) => (
                siblings[i].data.position().map(str::to_string),
                siblings
                    .get(i + 1)
                    .and_then(|f| f.data.position())
                    .map(str::to_string),
            ),
            None => (
                siblings
                    .last()
                    .and_then(|f| f.data.position())
                    .map(str::to_string),
                None,
            ),
        };

        tracing::debug!(%old_parent, %new_parent, %after, count = children.len(), "move_children");
        for child in children {
            let Some(entity) = child.data.referenced_entity() else {
                continue;
            };
            self.retract_fact(child.id).await?;
            let position = position_between(lower.as_deref(), upper.as_deref());
            self.put_fact(Fact::child(new_parent, entity, position.clone()))
                .await?;
            lower = Some(position);
        }
        Ok(())
    }

    /// Outdent: place `block` in `new_parent` directly after `after`, and
    /// adopt the block's following siblings in `old_parent` (minus the
    /// excluded ones) as its last children.
    ///
    /// Returns false without touching anything if `block` is not a child of
    /// `old_parent` or `after` is not a child of `new_parent`.
    async fn outdent_block(&self, mv: OutdentMove) -> StoreResult<bool> {
        let new_siblings = self.children(mv.new_parent).await?;
        let old_siblings = self.children(mv.old_parent).await?;

        let Some(current) = old_siblings
            .iter()
            .position(|f| f.data.referenced_entity() == Some(mv.block))
        else {
            tracing::debug!(block = %mv.block, old_parent = %mv.old_parent, "outdent_block: not a child");
            return Ok(false);
        };
        let Some(anchor) = new_siblings
            .iter()
            .position(|f| f.data.referenced_entity() == Some(mv.after))
        else {
            tracing::debug!(after = %mv.after, new_parent = %mv.new_parent, "outdent_block: anchor missing");
            return Ok(false);
        };
        let new_position = position_between(
            new_siblings[anchor].data.position(),
            new_siblings.get(anchor + 1).and_then(|f| f.data.position()),
        );

        let adopted: Vec<&Fact> = old_siblings[current + 1..]
            .iter()
            .filter(|f| {
                f.data
                    .referenced_entity()
                    .is_some_and(|e| !mv.exclude_from_siblings.contains(&e))
            })
            .collect();

        let own_children = self.children(mv.block).await?;
        let mut last = own_children
            .last()
            .and_then(|f| f.data.position())
            .map(str::to_string);

        self.retract_fact(old_siblings[current].id).await?;
        for sibling in adopted {
            let Some(entity) = sibling.data.referenced_entity() else {
                continue;
            };
            self.retract_fact(sibling.id).await?;
            let position = position_after(last.as_deref());
            self.put_fact(Fact::child(mv.block, entity, position.clone()))
                .await?;
            last = Some(position);
        }

        tracing::debug!(
            block = %mv.block,
            new_parent = %mv.new_parent,
            after = %mv.after,
            position = %new_position,
            "outdent_block"
        );
        self.put_fact(Fact::child(mv.new_parent, mv.block, new_position))
            .await?;
        Ok(true)
    }

    /// Remove `block`: its containment facts, its own facts, and its
    /// descendants.
    async fn remove_block(&self, block: EntityId) -> StoreResult<()> {
        let mut stack = vec![block];
        let mut seen = HashSet::new();

        while let Some(entity) = stack.pop() {
            if !seen.insert(entity) {
                continue;
            }
            for child in self.scan_eav(entity, Attribute::CardBlock).await? {
                if let Some(e) = child.data.referenced_entity() {
                    stack.push(e);
                }
            }
            for fact in self.scan_vae(entity, Attribute::CardBlock).await? {
                self.retract_fact(fact.id).await?;
            }
            for fact in self.entity_facts(entity).await? {
                self.retract_fact(fact.id).await?;
            }
        }

        tracing::debug!(%block, removed = seen.len(), "remove_block");
        Ok(())
    }
}
