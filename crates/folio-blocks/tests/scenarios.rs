//! End-to-end list editing scenarios over both store backends.

use folio_blocks::{Block, BlockOps, MemoryUiState, SelectedBlock, UiState, build_tree};
use folio_store::{FactStore, MemoryFactStore, SqliteFactStore};
use folio_types::{Attribute, BlockType, EntityId, Fact, FactData, ListStyle};

/// Seed `parent -> item` as an ordered list item with an optional number.
async fn ordered_item(
    store: &impl FactStore,
    parent: EntityId,
    position: &str,
    number: Option<i64>,
) -> EntityId {
    let entity = EntityId::new();
    let facts = [
        Fact::child(parent, entity, position),
        Fact::new(
            entity,
            Attribute::BlockType,
            FactData::BlockType {
                value: BlockType::Text,
            },
        ),
        Fact::new(entity, Attribute::IsList, FactData::Boolean { value: true }),
        Fact::new(
            entity,
            Attribute::ListStyle,
            FactData::ListStyle {
                value: ListStyle::Ordered,
            },
        ),
    ];
    for fact in facts {
        store.put_fact(fact).await.unwrap();
    }
    if let Some(n) = number {
        store
            .assert_fact(entity, Attribute::ListNumber, FactData::Number { value: n })
            .await
            .unwrap();
    }
    entity
}

async fn blocks(store: &impl FactStore, container: EntityId) -> Vec<Block> {
    build_tree(store, container).await.unwrap().unwrap()
}

fn find(blocks: &[Block], entity: EntityId) -> &Block {
    blocks.iter().find(|b| b.value == entity).unwrap()
}

fn number(blocks: &[Block], entity: EntityId) -> Option<u32> {
    find(blocks, entity).list_data.as_ref().and_then(|l| l.list_number)
}

fn previous(blocks: &[Block], entity: EntityId) -> Option<&Block> {
    let i = blocks.iter().position(|b| b.value == entity)?;
    i.checked_sub(1).map(|i| &blocks[i])
}

async fn delete_middle_item(store: &impl FactStore) {
    store.set_initialized().await.unwrap();
    let page = EntityId::new();
    let a = ordered_item(store, page, "1", Some(1)).await;
    let b = ordered_item(store, page, "2", Some(2)).await;
    let c = ordered_item(store, page, "3", Some(3)).await;

    let ui = MemoryUiState::new();
    ui.focus_page(page);
    ui.set_selected_block(SelectedBlock {
        value: b,
        parent: page,
    });
    let ops = BlockOps::new(store, &ui);

    let outcome = ops.delete_blocks(&[b]).await.unwrap();
    assert_eq!(outcome.renumbered.written, vec![c]);

    let after = blocks(store, page).await;
    assert_eq!(after.iter().map(|b| b.value).collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(number(&after, a), Some(1));
    assert_eq!(number(&after, c), Some(2));
}

#[tokio::test]
async fn delete_renumbers_survivors_in_memory() {
    delete_middle_item(&MemoryFactStore::new()).await;
}

#[tokio::test]
async fn delete_renumbers_survivors_in_sqlite() {
    delete_middle_item(&SqliteFactStore::in_memory().unwrap()).await;
}

#[tokio::test]
async fn indent_starts_a_nested_run() {
    let store = MemoryFactStore::new();
    store.set_initialized().await.unwrap();
    let page = EntityId::new();
    let a = ordered_item(&store, page, "1", Some(1)).await;
    let b = ordered_item(&store, page, "2", Some(2)).await;
    let c = ordered_item(&store, page, "3", Some(3)).await;
    let ui = MemoryUiState::new();
    let ops = BlockOps::new(&store, &ui);

    let before = blocks(&store, page).await;
    assert!(
        ops.indent(find(&before, c), previous(&before, c))
            .await
            .unwrap()
    );

    let after = blocks(&store, page).await;
    let c_block = find(&after, c);
    assert_eq!(c_block.depth(), Some(2));
    assert_eq!(c_block.structural_parent(), b);
    assert_eq!(number(&after, c), Some(1));
    assert_eq!(number(&after, a), Some(1));
    assert_eq!(number(&after, b), Some(2));
}

#[tokio::test]
async fn outdent_depth_one_releases_children_in_order() {
    let store = MemoryFactStore::new();
    store.set_initialized().await.unwrap();
    let page = EntityId::new();
    let a = ordered_item(&store, page, "1", Some(1)).await;
    let x = ordered_item(&store, a, "1", Some(1)).await;
    let y = ordered_item(&store, a, "2", Some(2)).await;
    let b = ordered_item(&store, page, "2", Some(2)).await;
    let ui = MemoryUiState::new();
    let ops = BlockOps::new(&store, &ui);

    let before = blocks(&store, page).await;
    assert!(ops.outdent(find(&before, a), None, &[]).await.unwrap());

    let after = blocks(&store, page).await;
    let shape: Vec<(EntityId, Option<u32>)> = after.iter().map(|b| (b.value, b.depth())).collect();
    assert_eq!(shape, vec![(a, None), (x, Some(1)), (y, Some(1)), (b, Some(1))]);
    assert_eq!(number(&after, x), Some(1));
    assert_eq!(number(&after, y), Some(2));
    assert_eq!(number(&after, b), Some(3));
}

#[tokio::test]
async fn nested_runs_under_different_parents_are_independent() {
    let store = MemoryFactStore::new();
    store.set_initialized().await.unwrap();
    let page = EntityId::new();
    let a = ordered_item(&store, page, "1", Some(1)).await;
    let a1 = ordered_item(&store, a, "1", Some(1)).await;
    let a2 = ordered_item(&store, a, "2", Some(2)).await;
    let b = ordered_item(&store, page, "2", Some(2)).await;
    let b1 = ordered_item(&store, b, "1", Some(1)).await;
    let b2 = ordered_item(&store, b, "2", None).await;
    let ui = MemoryUiState::new();
    let ops = BlockOps::new(&store, &ui);

    let result = ops
        .renumber(page, &[folio_blocks::AffectedBlock::new(b2, 2)])
        .await
        .unwrap();
    assert_eq!(result.written, vec![b2]);

    let after = blocks(&store, page).await;
    assert_eq!(number(&after, a1), Some(1));
    assert_eq!(number(&after, a2), Some(2));
    assert_eq!(number(&after, b1), Some(1));
    assert_eq!(number(&after, b2), Some(2));
}

#[tokio::test]
async fn renumber_twice_writes_nothing_the_second_time() {
    let store = SqliteFactStore::in_memory().unwrap();
    store.set_initialized().await.unwrap();
    let page = EntityId::new();
    let a = ordered_item(&store, page, "1", Some(5)).await;
    ordered_item(&store, page, "2", None).await;
    ordered_item(&store, page, "3", Some(1)).await;
    let ui = MemoryUiState::new();
    let ops = BlockOps::new(&store, &ui);
    let affected = [folio_blocks::AffectedBlock::new(a, 1)];

    let first = ops.renumber(page, &affected).await.unwrap();
    assert_eq!(first.written.len(), 3);
    let second = ops.renumber(page, &affected).await.unwrap();
    assert!(second.written.is_empty());
    assert_eq!(first.assigned, second.assigned);
}
