//! Structural block operations.
//!
//! [`BlockOps`] bundles the collaborators every operation needs (fact store,
//! UI state, numbering config) and sequences store moves, UI updates, and the
//! renumber pass. Operations whose preconditions do not hold return
//! `Ok(false)` without touching anything; store failures propagate.
//!
//! Placement numbers written right after a move are estimates so the item has
//! a number immediately. The renumber pass that follows is authoritative.

use std::collections::HashSet;

use futures::future::try_join_all;

use folio_store::{BlockPosition, FactRead, FactStore, OutdentMove};
use folio_types::{Attribute, BlockType, EntityId, FactData, FactId, ListStyle, PAGE_TYPE_CANVAS};

use crate::Result;
use crate::block::Block;
use crate::config::NumberingConfig;
use crate::numbering::{MAX_LIST_NUMBER, number_for_placement};
use crate::renumber::{AffectedBlock, RenumberResult, ordered_runs, renumber};
use crate::tree::build_tree;
use crate::ui::{Caret, SelectedBlock, UiState};

/// Result of [`BlockOps::delete_blocks`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: Vec<EntityId>,
    /// Pages closed because their card or mailbox was deleted.
    pub closed_pages: Vec<EntityId>,
    pub renumbered: RenumberResult,
}

/// Structural operations over a fact store and UI state.
pub struct BlockOps<'a, S: ?Sized, U: ?Sized> {
    store: &'a S,
    ui: &'a U,
    config: NumberingConfig,
}

impl<'a, S, U> BlockOps<'a, S, U>
where
    S: FactStore + ?Sized,
    U: UiState + ?Sized,
{
    pub fn new(store: &'a S, ui: &'a U) -> Self {
        Self {
            store,
            ui,
            config: NumberingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: NumberingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NumberingConfig {
        &self.config
    }

    /// Renumber `container` for `affected` with this instance's config.
    pub async fn renumber(
        &self,
        container: EntityId,
        affected: &[AffectedBlock],
    ) -> Result<RenumberResult> {
        renumber(self.store, container, affected, &self.config).await
    }

    /// Make `block` the last child of the item before it at its depth.
    pub async fn indent(&self, block: &Block, previous: Option<&Block>) -> Result<bool> {
        let Some(depth) = block.depth() else {
            tracing::debug!(block = %block.value, "indent: not a list item");
            return Ok(false);
        };
        let Some(new_parent) = previous.and_then(|p| p.list_ancestor(depth)) else {
            tracing::debug!(block = %block.value, "indent: no list item to nest under");
            return Ok(false);
        };
        if new_parent == block.value {
            return Ok(false);
        }

        self.ui.unfold(new_parent);
        self.store.retract_fact(block.fact_id).await?;
        self.store
            .add_last_block(new_parent, FactId::new(), block.value)
            .await?;

        if block.is_ordered() {
            self.set_list_number_for_new_block(block.value, block.parent)
                .await?;
        }
        self.renumber(
            block.parent,
            &[AffectedBlock::new(block.value, depth + 1).with_previous_depth(depth)],
        )
        .await?;

        tracing::debug!(block = %block.value, %new_parent, depth = depth + 1, "indent");
        Ok(true)
    }

    /// Move `block` one level up.
    ///
    /// A depth-1 item stops being a list item and its children follow it
    /// into the container. Deeper items land after their old parent and
    /// adopt their following siblings, minus `exclude` (blocks outdented in
    /// the same batch).
    pub async fn outdent(
        &self,
        block: &Block,
        previous: Option<&Block>,
        exclude: &[EntityId],
    ) -> Result<bool> {
        let Some(depth) = block.depth() else {
            tracing::debug!(block = %block.value, "outdent: not a list item");
            return Ok(false);
        };
        let container = block.parent;

        if depth == 1 {
            let children = self.tree_children(container, block.value).await?;
            self.store
                .assert_fact(block.value, Attribute::IsList, FactData::Boolean { value: false })
                .await?;
            self.store
                .move_children(block.value, container, block.value)
                .await?;

            let mut affected = vec![AffectedBlock::new(block.value, 1).with_previous_depth(1)];
            affected.extend(
                children
                    .into_iter()
                    .map(|child| AffectedBlock::new(child, 1).with_previous_depth(2)),
            );
            self.renumber(container, &affected).await?;
            tracing::debug!(block = %block.value, "outdent: left list");
            return Ok(true);
        }

        let Some(previous) = previous.filter(|p| p.is_list()) else {
            tracing::debug!(block = %block.value, "outdent: no previous list item");
            return Ok(false);
        };
        let Some(after) = previous.list_ancestor(depth - 1) else {
            return Ok(false);
        };
        let new_parent = if depth == 2 {
            container
        } else {
            match previous.list_ancestor(depth - 2) {
                Some(e) => e,
                None => return Ok(false),
            }
        };

        self.ui.unfold(new_parent);
        let moved = self
            .store
            .outdent_block(OutdentMove {
                block: block.value,
                new_parent,
                old_parent: block.structural_parent(),
                after,
                exclude_from_siblings: exclude.to_vec(),
            })
            .await?;
        if !moved {
            return Ok(false);
        }

        if block.is_ordered() {
            self.set_list_number_for_new_block(block.value, container)
                .await?;
        }
        self.renumber(
            container,
            &[AffectedBlock::new(block.value, depth - 1).with_previous_depth(depth)],
        )
        .await?;

        tracing::debug!(block = %block.value, %new_parent, depth = depth - 1, "outdent");
        Ok(true)
    }

    /// Take `block` out of its list entirely: it becomes a plain block in the
    /// container right after its depth-1 ancestor, followed by its children.
    pub async fn outdent_full(&self, block: &Block) -> Result<bool> {
        let Some(depth) = block.depth() else {
            tracing::debug!(block = %block.value, "outdent_full: not a list item");
            return Ok(false);
        };
        let Some(root) = block.list_ancestor(1) else {
            return Ok(false);
        };
        let container = block.parent;
        let children = self.tree_children(container, block.value).await?;

        self.store
            .assert_fact(block.value, Attribute::IsList, FactData::Boolean { value: false })
            .await?;
        if depth > 1 {
            self.store
                .move_block(
                    block.value,
                    block.structural_parent(),
                    container,
                    BlockPosition::After(root),
                )
                .await?;
        }
        self.store
            .move_children(block.value, container, block.value)
            .await?;

        let mut affected = vec![AffectedBlock::new(block.value, 1).with_previous_depth(depth)];
        affected.extend(
            children
                .into_iter()
                .map(|child| AffectedBlock::new(child, 1).with_previous_depth(depth + 1)),
        );
        self.renumber(container, &affected).await?;

        tracing::debug!(block = %block.value, from_depth = depth, "outdent_full");
        Ok(true)
    }

    /// Delete `entities` and everything under them.
    ///
    /// Pages opened from deleted cards and mailboxes are closed, focus moves
    /// to the block before the selection (or after it), and ordered runs the
    /// deleted items belonged to are renumbered.
    pub async fn delete_blocks(&self, entities: &[EntityId]) -> Result<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();
        if entities.is_empty() {
            return Ok(outcome);
        }

        let mut ordered_items = Vec::new();
        for &entity in entities {
            let block_type = self
                .store
                .value(entity, Attribute::BlockType)
                .await?
                .and_then(|d| d.as_block_type().cloned());
            match block_type {
                Some(BlockType::Card) => {
                    if let Some(page) = self.reference(entity, Attribute::Card).await? {
                        outcome.closed_pages.push(page);
                    }
                }
                Some(BlockType::Mailbox) => {
                    for attribute in [Attribute::MailboxArchive, Attribute::MailboxDraft] {
                        if let Some(page) = self.reference(entity, attribute).await? {
                            outcome.closed_pages.push(page);
                        }
                    }
                }
                _ => {}
            }

            let ordered = self
                .store
                .value(entity, Attribute::ListStyle)
                .await?
                .and_then(|d| d.as_list_style())
                == Some(ListStyle::Ordered);
            if ordered {
                ordered_items.push(entity);
            }
        }

        let container = match self.ui.focused_entity() {
            Some(focused) => Some(focused.container()),
            None => self.page_root(entities[0]).await?,
        };

        let mut affected = Vec::new();
        if let Some(container) = container {
            let siblings = build_tree(self.store, container).await?.unwrap_or_default();
            self.move_focus_for_delete(container, &siblings, entities)
                .await?;
            for entity in ordered_items {
                let mut item = AffectedBlock::new(entity, 1);
                if let Some(depth) = siblings
                    .iter()
                    .find(|b| b.value == entity)
                    .and_then(Block::depth)
                {
                    item = item.with_previous_depth(depth);
                }
                affected.push(item);
            }
        }

        for page in &outcome.closed_pages {
            self.ui.close_page(*page);
        }

        try_join_all(entities.iter().map(|e| self.store.remove_block(*e))).await?;
        outcome.removed = entities.to_vec();

        if let Some(container) = container {
            outcome.renumbered = self.renumber(container, &affected).await?;
        }

        tracing::debug!(
            removed = outcome.removed.len(),
            closed_pages = outcome.closed_pages.len(),
            "delete_blocks"
        );
        Ok(outcome)
    }

    /// Switch `block` and its list to ordered numbering.
    pub async fn order_list_items(&self, block: &Block) -> Result<bool> {
        let Some(depth) = block.depth() else {
            return Ok(false);
        };
        self.store
            .assert_fact(
                block.value,
                Attribute::ListStyle,
                FactData::ListStyle {
                    value: ListStyle::Ordered,
                },
            )
            .await?;
        self.set_list_number_for_new_block(block.value, block.parent)
            .await?;
        self.renumber(block.parent, &[AffectedBlock::new(block.value, depth)])
            .await?;
        Ok(true)
    }

    /// Switch `block` to bullets; the ordered runs around it are renumbered.
    pub async fn unorder_list_items(&self, block: &Block) -> Result<bool> {
        let Some(depth) = block.depth() else {
            return Ok(false);
        };
        self.store
            .assert_fact(
                block.value,
                Attribute::ListStyle,
                FactData::ListStyle {
                    value: ListStyle::Unordered,
                },
            )
            .await?;
        self.renumber(block.parent, &[AffectedBlock::new(block.value, depth)])
            .await?;
        Ok(true)
    }

    /// Manual number edit: `block` takes `number` and the rest of its run
    /// counts on from there. Earlier items in the run keep their numbers.
    pub async fn set_list_number(&self, block: &Block, number: i64) -> Result<bool> {
        let Some(depth) = block.depth() else {
            return Ok(false);
        };
        let number = match u32::try_from(number) {
            Ok(n) if (1..=MAX_LIST_NUMBER).contains(&n) => n,
            _ => {
                tracing::debug!(block = %block.value, number, "set_list_number: out of range");
                return Ok(false);
            }
        };

        self.store
            .assert_fact(
                block.value,
                Attribute::ListNumber,
                FactData::Number {
                    value: i64::from(number),
                },
            )
            .await?;

        let mut affected = vec![AffectedBlock::new(block.value, depth).pinned(number)];
        if let Some(blocks) = build_tree(self.store, block.parent).await? {
            let run_start = ordered_runs(&blocks, depth)
                .into_iter()
                .find(|run| run.iter().any(|b| b.value == block.value))
                .and_then(|run| run.first().copied().cloned());
            if let Some(start) = run_start.filter(|s| s.value != block.value) {
                if let Some(current) = start.list_data.as_ref().and_then(|l| l.list_number) {
                    affected.push(AffectedBlock::new(start.value, depth).pinned(current));
                }
            }
        }
        self.renumber(block.parent, &affected).await?;
        Ok(true)
    }

    /// Write the placement estimate for `entity` in `container`. Returns the
    /// number written, or `None` if the entity is not an ordered list item
    /// there.
    pub async fn set_list_number_for_new_block(
        &self,
        entity: EntityId,
        container: EntityId,
    ) -> Result<Option<u32>> {
        let Some(blocks) = build_tree(self.store, container).await? else {
            return Ok(None);
        };
        if !blocks.iter().any(|b| b.value == entity && b.is_ordered()) {
            return Ok(None);
        }
        let number = number_for_placement(&blocks, entity);
        self.store
            .assert_fact(
                entity,
                Attribute::ListNumber,
                FactData::Number {
                    value: i64::from(number),
                },
            )
            .await?;
        Ok(Some(number))
    }

    /// Entities directly nested under `parent` in `container`'s tree.
    async fn tree_children(&self, container: EntityId, parent: EntityId) -> Result<Vec<EntityId>> {
        let blocks = build_tree(self.store, container).await?.unwrap_or_default();
        Ok(blocks
            .iter()
            .filter(|b| b.is_list() && b.value != parent && b.structural_parent() == parent)
            .map(|b| b.value)
            .collect())
    }

    async fn reference(&self, entity: EntityId, attribute: Attribute) -> Result<Option<EntityId>> {
        Ok(self
            .store
            .value(entity, attribute)
            .await?
            .and_then(|d| d.referenced_entity()))
    }

    /// Outermost container above `entity`: the page it lives on, not its
    /// nearest list parent.
    async fn page_root(&self, entity: EntityId) -> Result<Option<EntityId>> {
        let mut seen = HashSet::from([entity]);
        let mut root = None;
        let mut current = entity;
        while let Some(parent) = self
            .store
            .scan_vae(current, Attribute::CardBlock)
            .await?
            .first()
            .map(|f| f.entity)
        {
            if !seen.insert(parent) {
                tracing::warn!(%entity, %parent, "containment cycle");
                break;
            }
            root = Some(parent);
            current = parent;
        }
        Ok(root)
    }

    async fn move_focus_for_delete(
        &self,
        container: EntityId,
        siblings: &[Block],
        deleting: &[EntityId],
    ) -> Result<()> {
        let page_type = self.store.value(container, Attribute::PageType).await?;
        if page_type.as_ref().and_then(|d| d.as_text()) == Some(PAGE_TYPE_CANVAS) {
            self.ui.focus_page(container);
            self.ui.set_selected_blocks(Vec::new());
            return Ok(());
        }

        let mut selected = self.ui.selected_blocks();
        if selected.is_empty() {
            selected = deleting
                .iter()
                .map(|e| SelectedBlock {
                    value: *e,
                    parent: container,
                })
                .collect();
        }
        let index_of =
            |entity: EntityId| siblings.iter().position(|b| b.value == entity);
        let first = selected.first().and_then(|s| index_of(s.value));
        let last = selected.last().and_then(|s| index_of(s.value));

        let before = first
            .and_then(|i| i.checked_sub(1))
            .map(|i| &siblings[i])
            .filter(|b| !deleting.contains(&b.value));
        let after = last
            .and_then(|i| siblings.get(i + 1))
            .filter(|b| !deleting.contains(&b.value));

        if let Some(target) = before {
            self.ui.set_selected_block(SelectedBlock::from(target));
            self.ui.focus_block(target, Caret::End);
        } else if let Some(target) = after {
            self.ui.set_selected_block(SelectedBlock::from(target));
            self.ui.focus_block(target, Caret::Start);
        }
        Ok(())
    }
}
