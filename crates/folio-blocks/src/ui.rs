//! Editor UI context consulted by structural operations.
//!
//! Operations read folding, selection, and focus, and update them after an
//! edit (focus moves to a neighbour after delete, an indented block's new
//! parent is unfolded). [`UiState`] is the seam; [`MemoryUiState`] is a
//! plain in-process implementation.

use std::collections::HashSet;

use parking_lot::RwLock;

use folio_types::EntityId;

use crate::block::Block;

/// A selected block and the container it is shown in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SelectedBlock {
    pub value: EntityId,
    pub parent: EntityId,
}

impl From<&Block> for SelectedBlock {
    fn from(block: &Block) -> Self {
        Self {
            value: block.value,
            parent: block.parent,
        }
    }
}

/// What currently has keyboard focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusedEntity {
    Page { entity: EntityId },
    Block { entity: EntityId, parent: EntityId },
}

impl FocusedEntity {
    /// Container the focus is in: the page itself, or the focused block's
    /// container.
    pub fn container(&self) -> EntityId {
        match self {
            FocusedEntity::Page { entity } => *entity,
            FocusedEntity::Block { parent, .. } => *parent,
        }
    }
}

/// Caret placement when focusing a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Caret {
    #[default]
    Start,
    End,
}

/// UI state as seen by block operations.
pub trait UiState: Send + Sync {
    fn is_folded(&self, entity: EntityId) -> bool;
    fn toggle_fold(&self, entity: EntityId);

    fn focused_entity(&self) -> Option<FocusedEntity>;
    fn focus_page(&self, page: EntityId);
    fn focus_block(&self, block: &Block, caret: Caret);

    fn selected_blocks(&self) -> Vec<SelectedBlock>;
    fn set_selected_blocks(&self, blocks: Vec<SelectedBlock>);

    /// Close an open page (a card's page or a mailbox's archive/draft).
    fn close_page(&self, page: EntityId);

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    fn unfold(&self, entity: EntityId) {
        if self.is_folded(entity) {
            self.toggle_fold(entity);
        }
    }

    fn set_selected_block(&self, block: SelectedBlock) {
        self.set_selected_blocks(vec![block]);
    }
}

#[derive(Default)]
struct Inner {
    folded: HashSet<EntityId>,
    focused: Option<FocusedEntity>,
    caret: Caret,
    selected: Vec<SelectedBlock>,
    open_pages: Vec<EntityId>,
}

/// In-process UI state.
#[derive(Default)]
pub struct MemoryUiState {
    inner: RwLock<Inner>,
}

impl MemoryUiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_page(&self, page: EntityId) {
        let mut inner = self.inner.write();
        if !inner.open_pages.contains(&page) {
            inner.open_pages.push(page);
        }
    }

    pub fn open_pages(&self) -> Vec<EntityId> {
        self.inner.read().open_pages.clone()
    }

    pub fn caret(&self) -> Caret {
        self.inner.read().caret
    }
}

impl UiState for MemoryUiState {
    fn is_folded(&self, entity: EntityId) -> bool {
        self.inner.read().folded.contains(&entity)
    }

    fn toggle_fold(&self, entity: EntityId) {
        let mut inner = self.inner.write();
        if !inner.folded.remove(&entity) {
            inner.folded.insert(entity);
        }
    }

    fn focused_entity(&self) -> Option<FocusedEntity> {
        self.inner.read().focused
    }

    fn focus_page(&self, page: EntityId) {
        let mut inner = self.inner.write();
        inner.focused = Some(FocusedEntity::Page { entity: page });
        inner.caret = Caret::Start;
    }

    fn focus_block(&self, block: &Block, caret: Caret) {
        let mut inner = self.inner.write();
        inner.focused = Some(FocusedEntity::Block {
            entity: block.value,
            parent: block.parent,
        });
        inner.caret = caret;
    }

    fn selected_blocks(&self) -> Vec<SelectedBlock> {
        self.inner.read().selected.clone()
    }

    fn set_selected_blocks(&self, blocks: Vec<SelectedBlock>) {
        self.inner.write().selected = blocks;
    }

    fn close_page(&self, page: EntityId) {
        tracing::debug!(%page, "close_page");
        self.inner.write().open_pages.retain(|p| *p != page);
    }
}
