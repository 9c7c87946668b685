//! Block tree reconstruction.
//!
//! Turns the flat fact set under a container into the flattened pre-order
//! sequence of [`Block`]s the editor renders: every block is immediately
//! followed by all of its list descendants before the next sibling.
//!
//! Two entry points share one walker:
//!
//! - [`build_tree_local`] walks a pre-fetched fact list synchronously.
//! - [`build_tree`] reads through a [`FactRead`] handle, fetching exactly the
//!   facts the walker consults, then walks them. Both therefore produce the
//!   same sequence for the same fact set.
//!
//! Children without a `block/type` fact are skipped together with their
//! subtree; they are rows that were never fully materialized.

use std::collections::{HashMap, HashSet};

use folio_store::{FactRead, StoreResult};
use folio_types::{Attribute, BlockType, EntityId, Fact, FactData, FactId, ListStyle};

use crate::block::{Block, ListData, PathEntry};

/// Maximum list nesting the walker follows. Deeper containment almost
/// certainly means a cycle or corruption.
pub const MAX_LIST_DEPTH: u32 = 512;

/// Synchronous `(entity, attribute)` index over a fact slice.
pub struct FactIndex<'a> {
    eav: HashMap<(EntityId, Attribute), Vec<&'a Fact>>,
}

impl<'a> FactIndex<'a> {
    pub fn new(facts: &'a [Fact]) -> Self {
        let mut eav: HashMap<(EntityId, Attribute), Vec<&'a Fact>> = HashMap::new();
        for fact in facts {
            eav.entry((fact.entity, fact.attribute))
                .or_default()
                .push(fact);
        }
        Self { eav }
    }

    /// Facts for `(entity, attribute)` in slice order.
    pub fn eav(&self, entity: EntityId, attribute: Attribute) -> &[&'a Fact] {
        self.eav
            .get(&(entity, attribute))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn first(&self, entity: EntityId, attribute: Attribute) -> Option<&'a FactData> {
        self.eav(entity, attribute).first().map(|f| &f.data)
    }

    /// Containment facts of `parent`, in sibling order.
    fn children(&self, parent: EntityId) -> Vec<&'a Fact> {
        let mut children = self.eav(parent, Attribute::CardBlock).to_vec();
        children.sort_by(|a, b| a.sibling_key().cmp(&b.sibling_key()));
        children
    }

    fn block_type(&self, entity: EntityId) -> Option<BlockType> {
        self.first(entity, Attribute::BlockType)
            .and_then(FactData::as_block_type)
            .cloned()
    }

    fn is_list(&self, entity: EntityId) -> bool {
        self.first(entity, Attribute::IsList)
            .and_then(FactData::as_bool)
            .unwrap_or(false)
    }

    fn list_style(&self, entity: EntityId) -> Option<ListStyle> {
        self.first(entity, Attribute::ListStyle)
            .and_then(FactData::as_list_style)
    }

    fn list_number(&self, entity: EntityId) -> Option<u32> {
        self.first(entity, Attribute::ListNumber)
            .and_then(FactData::as_number)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
    }

    fn checklist(&self, entity: EntityId) -> bool {
        self.first(entity, Attribute::CheckList)
            .and_then(FactData::as_bool)
            .unwrap_or(false)
    }
}

/// Build the block sequence for `container` from a pre-fetched fact list.
pub fn build_tree_local(facts: &[Fact], container: EntityId) -> Vec<Block> {
    let index = FactIndex::new(facts);
    let mut out = Vec::new();

    for child in index.children(container) {
        let Some(entity) = child.data.referenced_entity() else {
            continue;
        };
        let Some(block_type) = index.block_type(entity) else {
            continue;
        };
        if index.is_list(entity) {
            expand_list(&index, container, child, &mut out);
        } else {
            out.push(Block {
                value: entity,
                parent: container,
                fact_id: child.id,
                position: child.data.position().unwrap_or_default().to_string(),
                block_type,
                list_data: None,
            });
        }
    }

    out
}

/// One pending list node: its containment fact, depth, and ancestors.
struct Frame<'a> {
    fact: &'a Fact,
    depth: u32,
    path: Vec<PathEntry>,
}

/// Depth-first pre-order expansion of one list root.
fn expand_list(index: &FactIndex<'_>, container: EntityId, root: &Fact, out: &mut Vec<Block>) {
    let mut stack = vec![Frame {
        fact: root,
        depth: 1,
        path: Vec::new(),
    }];

    while let Some(Frame { fact, depth, path }) = stack.pop() {
        let Some(entity) = fact.data.referenced_entity() else {
            continue;
        };
        let Some(block_type) = index.block_type(entity) else {
            continue;
        };
        if depth > MAX_LIST_DEPTH {
            tracing::warn!(%container, %entity, "list nesting exceeds MAX_LIST_DEPTH ({MAX_LIST_DEPTH}), truncating");
            continue;
        }

        let mut child_path = path.clone();
        child_path.push(PathEntry { depth, entity });

        out.push(Block {
            value: entity,
            parent: container,
            fact_id: fact.id,
            position: fact.data.position().unwrap_or_default().to_string(),
            block_type,
            list_data: Some(ListData {
                depth,
                parent: container,
                path,
                list_style: index.list_style(entity),
                list_number: index.list_number(entity),
                checklist: index.checklist(entity),
            }),
        });

        // Reverse push so the first sibling pops first.
        for child in index.children(entity).into_iter().rev() {
            let Some(child_entity) = child.data.referenced_entity() else {
                continue;
            };
            if child_path.iter().any(|p| p.entity == child_entity) {
                tracing::warn!(%container, entity = %child_entity, "containment cycle, skipping");
                continue;
            }
            stack.push(Frame {
                fact: child,
                depth: depth + 1,
                path: child_path.clone(),
            });
        }
    }
}

/// Build the block sequence for `container` reading through `reader`.
///
/// Returns `None` while the store is uninitialized ("no data yet"), which is
/// distinct from an initialized container with no children.
pub async fn build_tree<R>(reader: &R, container: EntityId) -> StoreResult<Option<Vec<Block>>>
where
    R: FactRead + ?Sized,
{
    if !reader.is_initialized().await? {
        return Ok(None);
    }
    let facts = fetch_tree_facts(reader, container).await?;
    Ok(Some(build_tree_local(&facts, container)))
}

/// Fetch every fact the walker consults for `container`.
async fn fetch_tree_facts<R>(reader: &R, container: EntityId) -> StoreResult<Vec<Fact>>
where
    R: FactRead + ?Sized,
{
    let mut facts = Vec::new();
    let mut seen_facts: HashSet<FactId> = HashSet::new();
    let mut keep = |batch: Vec<Fact>, facts: &mut Vec<Fact>| {
        for fact in batch {
            if seen_facts.insert(fact.id) {
                facts.push(fact);
            }
        }
    };

    let top = reader.scan_eav(container, Attribute::CardBlock).await?;
    let mut stack: Vec<(EntityId, u32)> = Vec::new();
    for child in &top {
        let Some(entity) = child.data.referenced_entity() else {
            continue;
        };
        let types = reader.scan_eav(entity, Attribute::BlockType).await?;
        let is_list = reader.scan_eav(entity, Attribute::IsList).await?;
        let list_root = !types.is_empty()
            && is_list
                .first()
                .and_then(|f| f.data.as_bool())
                .unwrap_or(false);
        keep(types, &mut facts);
        keep(is_list, &mut facts);
        if list_root {
            stack.push((entity, 1));
        }
    }
    keep(top, &mut facts);

    let mut expanded: HashSet<EntityId> = HashSet::new();
    while let Some((entity, depth)) = stack.pop() {
        if depth > MAX_LIST_DEPTH || !expanded.insert(entity) {
            continue;
        }
        let types = reader.scan_eav(entity, Attribute::BlockType).await?;
        if types.is_empty() {
            continue;
        }
        let children = reader.scan_eav(entity, Attribute::CardBlock).await?;
        for child in &children {
            if let Some(e) = child.data.referenced_entity() {
                stack.push((e, depth + 1));
            }
        }
        keep(types, &mut facts);
        keep(children, &mut facts);
        for attribute in [Attribute::ListStyle, Attribute::ListNumber, Attribute::CheckList] {
            keep(reader.scan_eav(entity, attribute).await?, &mut facts);
        }
    }

    Ok(facts)
}

#[cfg(test)]
mod tests {
    use folio_store::MemoryFactStore;

    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn test_flat_blocks_in_position_order() {
        let mut fx = Fixture::new();
        let b = fx.text("2");
        let a = fx.text("1");
        let c = fx.text("3");

        let tree = build_tree_local(&fx.facts, fx.root);
        let values: Vec<EntityId> = tree.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![a, b, c]);
        assert!(tree.iter().all(|b| b.list_data.is_none()));
        assert!(tree.iter().all(|b| b.parent == fx.root));
    }

    #[test]
    fn test_untyped_child_is_dropped() {
        let mut fx = Fixture::new();
        let a = fx.text("1");
        let ghost = EntityId::new();
        fx.facts.push(Fact::child(fx.root, ghost, "2"));

        let tree = build_tree_local(&fx.facts, fx.root);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].value, a);
    }

    #[test]
    fn test_nested_list_is_preorder_with_paths() {
        let mut fx = Fixture::new();
        let a = fx.item(fx.root, "1", true);
        let a1 = fx.item(a, "1", true);
        let a1x = fx.item(a1, "1", true);
        let a2 = fx.item(a, "2", true);
        let b = fx.item(fx.root, "2", true);

        let tree = build_tree_local(&fx.facts, fx.root);
        let values: Vec<EntityId> = tree.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![a, a1, a1x, a2, b]);

        let depths: Vec<u32> = tree.iter().filter_map(Block::depth).collect();
        assert_eq!(depths, vec![1, 2, 3, 2, 1]);

        let deep = &tree[2];
        let list = deep.list_data.as_ref().unwrap();
        assert_eq!(
            list.path,
            vec![
                PathEntry { depth: 1, entity: a },
                PathEntry { depth: 2, entity: a1 },
            ]
        );
        assert_eq!(list.parent, fx.root);
        assert_eq!(deep.structural_parent(), a1);
    }

    #[test]
    fn test_untyped_list_descendant_drops_subtree() {
        let mut fx = Fixture::new();
        let a = fx.item(fx.root, "1", true);
        let ghost = EntityId::new();
        fx.facts.push(Fact::child(a, ghost, "1"));
        let orphan = fx.item(ghost, "1", true);

        let tree = build_tree_local(&fx.facts, fx.root);
        assert_eq!(tree.len(), 1);
        assert!(tree.iter().all(|b| b.value != orphan));
    }

    #[test]
    fn test_equal_positions_break_ties_on_fact_id() {
        let mut fx = Fixture::new();
        let a = fx.text("5");
        let b = fx.text("5");
        let fa = fx.facts.iter().find(|f| f.data.referenced_entity() == Some(a)).unwrap().id;
        let fb = fx.facts.iter().find(|f| f.data.referenced_entity() == Some(b)).unwrap().id;

        let tree = build_tree_local(&fx.facts, fx.root);
        let expected = if fa < fb { vec![a, b] } else { vec![b, a] };
        assert_eq!(tree.iter().map(|b| b.value).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_containment_cycle_terminates() {
        let mut fx = Fixture::new();
        let a = fx.item(fx.root, "1", true);
        let b = fx.item(a, "1", true);
        fx.facts.push(Fact::child(b, a, "1"));

        let tree = build_tree_local(&fx.facts, fx.root);
        assert_eq!(tree.iter().map(|b| b.value).collect::<Vec<_>>(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_uninitialized_store_is_none() {
        let store = MemoryFactStore::new();
        assert!(build_tree(&store, EntityId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialized_empty_container() {
        let store = MemoryFactStore::with_facts([]);
        assert_eq!(build_tree(&store, EntityId::new()).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_store_and_local_agree() {
        let mut fx = Fixture::new();
        let a = fx.item(fx.root, "1", true);
        fx.item(a, "1", true);
        fx.text("2");
        let b = fx.item(fx.root, "3", true);
        fx.set_ordered(b, Some(4));

        let store = MemoryFactStore::with_facts(fx.facts.clone());
        let remote = build_tree(&store, fx.root).await.unwrap().unwrap();
        assert_eq!(remote, build_tree_local(&fx.facts, fx.root));
    }

    #[tokio::test]
    async fn test_store_and_local_agree_on_random_documents() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let fx = Fixture::random(&mut rng, 40);
            let store = fx.store();
            let remote = build_tree(&store, fx.root).await.unwrap().unwrap();
            let local = build_tree_local(&fx.facts, fx.root);
            assert_eq!(remote, local);

            for block in &local {
                let Some(list) = &block.list_data else {
                    continue;
                };
                assert_eq!(list.path.len() as u32, list.depth - 1);
                for (i, entry) in list.path.iter().enumerate() {
                    assert_eq!(entry.depth, i as u32 + 1);
                }
            }
        }
    }
}
