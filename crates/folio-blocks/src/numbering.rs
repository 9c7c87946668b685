//! Number estimate for a freshly placed list item.

use folio_types::EntityId;

use crate::block::Block;

/// Largest number a manual edit may set. Leaves headroom so a run counting
/// on from it stays far from `u32::MAX`.
pub const MAX_LIST_NUMBER: u32 = 1 << 30;

/// Number `target` should carry given its place in `blocks`.
///
/// Walks backwards from `target` skipping deeper items. The first item at the
/// same depth decides: ordered means its number plus one, anything else
/// (unordered item, shallower item, non-list block, start of sequence) means
/// `target` starts a run and gets 1. An ordered predecessor with no stored
/// number counts as 0, so `target` gets 1.
pub fn number_for_placement(blocks: &[Block], target: EntityId) -> u32 {
    let Some(index) = blocks.iter().position(|b| b.value == target) else {
        return 1;
    };
    let Some(depth) = blocks[index].depth() else {
        return 1;
    };

    for block in blocks[..index].iter().rev() {
        let Some(list) = &block.list_data else {
            return 1;
        };
        if list.depth > depth {
            continue;
        }
        if list.depth < depth || !list.is_ordered() {
            return 1;
        }
        return list.list_number.unwrap_or(0).saturating_add(1);
    }
    1
}
