//! Reconstructed block views.
//!
//! A [`Block`] is never persisted. It is recomputed from facts on every query
//! and identified by its entity (`value`); two views of the same entity taken
//! from the same snapshot always agree.

use folio_types::{BlockType, EntityId, FactId, ListStyle};

/// One step of a list item's ancestry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathEntry {
    pub depth: u32,
    pub entity: EntityId,
}

/// List metadata, present iff the block is a list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListData {
    /// 1 for a list root directly under the container.
    pub depth: u32,
    /// Container whose content was enumerated (not the structural parent).
    pub parent: EntityId,
    /// Ancestor list items from the root down, excluding this item.
    /// `path.len() == depth - 1` and `path[i].depth == i + 1`.
    pub path: Vec<PathEntry>,
    pub list_style: Option<ListStyle>,
    pub list_number: Option<u32>,
    pub checklist: bool,
}

impl ListData {
    pub fn is_ordered(&self) -> bool {
        self.list_style.is_some_and(|s| s.is_ordered())
    }
}

/// A block as seen from its container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// The block's entity.
    pub value: EntityId,
    /// Container whose content was enumerated.
    pub parent: EntityId,
    /// Containment fact placing this block under its structural parent.
    pub fact_id: FactId,
    pub position: String,
    pub block_type: BlockType,
    pub list_data: Option<ListData>,
}

impl Block {
    pub fn is_list(&self) -> bool {
        self.list_data.is_some()
    }

    /// List depth, if this is a list item.
    pub fn depth(&self) -> Option<u32> {
        self.list_data.as_ref().map(|l| l.depth)
    }

    pub fn is_ordered(&self) -> bool {
        self.list_data.as_ref().is_some_and(ListData::is_ordered)
    }

    /// The list item at `depth` in this block's ancestry: the block itself
    /// at its own depth, an ancestor from `path` above it, `None` below it.
    pub fn list_ancestor(&self, depth: u32) -> Option<EntityId> {
        let list = self.list_data.as_ref()?;
        if depth == list.depth {
            return Some(self.value);
        }
        if depth == 0 || depth > list.depth {
            return None;
        }
        list.path
            .iter()
            .find(|p| p.depth == depth)
            .map(|p| p.entity)
    }

    /// Entity whose `card/block` fact holds this block.
    pub fn structural_parent(&self) -> EntityId {
        match &self.list_data {
            Some(list) if list.depth > 1 => self
                .list_ancestor(list.depth - 1)
                .unwrap_or(self.parent),
            _ => self.parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(depth: u32, path: Vec<PathEntry>) -> Block {
        let container = EntityId::named("container");
        Block {
            value: EntityId::new(),
            parent: container,
            fact_id: FactId::new(),
            position: "V".into(),
            block_type: BlockType::Text,
            list_data: Some(ListData {
                depth,
                parent: container,
                path,
                list_style: Some(ListStyle::Ordered),
                list_number: None,
                checklist: false,
            }),
        }
    }

    #[test]
    fn test_list_ancestor_includes_self() {
        let root = EntityId::new();
        let block = item(2, vec![PathEntry { depth: 1, entity: root }]);
        assert_eq!(block.list_ancestor(1), Some(root));
        assert_eq!(block.list_ancestor(2), Some(block.value));
        assert_eq!(block.list_ancestor(3), None);
        assert_eq!(block.list_ancestor(0), None);
    }

    #[test]
    fn test_structural_parent() {
        let root = EntityId::new();
        let nested = item(2, vec![PathEntry { depth: 1, entity: root }]);
        assert_eq!(nested.structural_parent(), root);

        let top = item(1, vec![]);
        assert_eq!(top.structural_parent(), EntityId::named("container"));
    }
}
