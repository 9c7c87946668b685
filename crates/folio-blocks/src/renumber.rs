//! Ordered-list renumbering.
//!
//! After a structural edit the caller names the blocks it touched and the
//! depths they were at before and after. Every ordered run at those depths is
//! recomputed from the current tree:
//!
//! - at depth 1 a run is a maximal stretch of consecutive depth-1 ordered
//!   items; any non-list block or unordered depth-1 item ends it, deeper
//!   items do not;
//! - at deeper levels runs are grouped by structural parent, and an
//!   unordered sibling splits a parent's children into separate runs.
//!
//! Each run counts up from 1, or from a pinned number. Only numbers that
//! differ from what is stored are written, so repeating a pass is free.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;

use folio_store::{FactStore, StoreResult};
use folio_types::{Attribute, EntityId, FactData};

use crate::block::Block;
use crate::config::NumberingConfig;
use crate::tree::build_tree;

/// A block touched by a structural edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedBlock {
    pub entity: EntityId,
    /// Depth after the edit.
    pub new_depth: u32,
    /// Depth before the edit, when it changed.
    pub previous_depth: Option<u32>,
    /// Number the block's run must resume from at this block.
    pub pinned: Option<u32>,
}

impl AffectedBlock {
    pub fn new(entity: EntityId, new_depth: u32) -> Self {
        Self {
            entity,
            new_depth,
            previous_depth: None,
            pinned: None,
        }
    }

    pub fn with_previous_depth(mut self, depth: u32) -> Self {
        self.previous_depth = Some(depth);
        self
    }

    pub fn pinned(mut self, number: u32) -> Self {
        self.pinned = Some(number);
        self
    }
}

/// One planned number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub entity: EntityId,
    pub number: u32,
    /// Number stored before the pass.
    pub current: Option<u32>,
}

impl Assignment {
    pub fn changed(&self) -> bool {
        self.current != Some(self.number)
    }
}

/// What a renumber pass decided and wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenumberResult {
    /// Number for every ordered item in a recomputed run, in tree order.
    pub assigned: IndexMap<EntityId, u32>,
    /// Entities whose stored number was rewritten.
    pub written: Vec<EntityId>,
}

/// Depths a pass must recompute.
pub fn affected_depths(affected: &[AffectedBlock], config: &NumberingConfig) -> BTreeSet<u32> {
    let mut depths = BTreeSet::new();
    for block in affected {
        depths.insert(block.new_depth);
        if let Some(previous) = block.previous_depth {
            depths.insert(previous);
        }
    }
    if config.cascade_adjacent_depths {
        let base: Vec<u32> = depths.iter().copied().collect();
        for depth in base {
            if depth > 1 {
                depths.insert(depth - 1);
            }
            depths.insert(depth + 1);
        }
    }
    depths.retain(|d| *d >= 1);
    depths
}

/// Ordered runs at `depth`, in tree order.
pub fn ordered_runs(blocks: &[Block], depth: u32) -> Vec<Vec<&Block>> {
    if depth == 1 {
        let mut runs = Vec::new();
        let mut current: Vec<&Block> = Vec::new();
        for block in blocks {
            match &block.list_data {
                Some(list) if list.depth > 1 => {}
                Some(list) if list.is_ordered() => current.push(block),
                _ => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        return runs;
    }

    let mut by_parent: IndexMap<EntityId, Vec<Vec<&Block>>> = IndexMap::new();
    for block in blocks {
        let Some(list) = &block.list_data else {
            continue;
        };
        if list.depth != depth {
            continue;
        }
        let group = by_parent
            .entry(block.structural_parent())
            .or_insert_with(|| vec![Vec::new()]);
        if list.is_ordered() {
            if let Some(run) = group.last_mut() {
                run.push(block);
            }
        } else if group.last().is_some_and(|run| !run.is_empty()) {
            group.push(Vec::new());
        }
    }

    by_parent
        .into_values()
        .flatten()
        .filter(|run| !run.is_empty())
        .collect()
}

/// Compute the numbers for every run at the affected depths.
pub fn plan_renumber(
    blocks: &[Block],
    affected: &[AffectedBlock],
    config: &NumberingConfig,
) -> Vec<Assignment> {
    let pins: HashMap<EntityId, u32> = affected
        .iter()
        .filter_map(|a| a.pinned.map(|n| (a.entity, n)))
        .collect();

    let mut plan = Vec::new();
    for depth in affected_depths(affected, config) {
        for run in ordered_runs(blocks, depth) {
            let mut next = 1;
            for block in run {
                if let Some(pin) = pins.get(&block.value) {
                    next = *pin;
                }
                plan.push(Assignment {
                    entity: block.value,
                    number: next,
                    current: block.list_data.as_ref().and_then(|l| l.list_number),
                });
                next = next.saturating_add(1);
            }
        }
    }
    plan
}

/// Recompute ordered numbering under `container` and persist what changed.
///
/// An uninitialized store or an empty `affected` set is a no-op.
pub async fn renumber<S>(
    store: &S,
    container: EntityId,
    affected: &[AffectedBlock],
    config: &NumberingConfig,
) -> StoreResult<RenumberResult>
where
    S: FactStore + ?Sized,
{
    let mut result = RenumberResult::default();
    if affected.is_empty() {
        return Ok(result);
    }
    let Some(blocks) = build_tree(store, container).await? else {
        tracing::debug!(%container, "renumber: store not initialized");
        return Ok(result);
    };

    for assignment in plan_renumber(&blocks, affected, config) {
        if assignment.changed() {
            store
                .assert_fact(
                    assignment.entity,
                    Attribute::ListNumber,
                    FactData::Number {
                        value: i64::from(assignment.number),
                    },
                )
                .await?;
            result.written.push(assignment.entity);
        }
        result.assigned.insert(assignment.entity, assignment.number);
    }

    tracing::debug!(
        %container,
        assigned = result.assigned.len(),
        written = result.written.len(),
        "renumber"
    );
    Ok(result)
}
