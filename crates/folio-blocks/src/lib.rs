//! # folio-blocks
//!
//! Block views and list structure over the folio fact store.
//!
//! Key components:
//!
//! - [`build_tree`] / [`build_tree_local`] - flatten a container's facts into
//!   the pre-order [`Block`] sequence the editor renders
//! - [`number_for_placement`] - number estimate for a freshly placed item
//! - [`renumber`] - authoritative ordered-list renumbering
//! - [`BlockOps`] - indent, outdent, delete, and list-style operations
//! - [`UiState`] - folding, selection, and focus as seen by operations
//!
//! ## Design Decisions
//!
//! - **Blocks are views**: nothing here persists a `Block`; every query
//!   rebuilds from facts, so two reads of one snapshot agree.
//! - **One numbering authority**: operations write a placement estimate for
//!   immediate display, then run [`renumber`], which alone decides final
//!   numbers and only writes what changed.
//! - **Injected UI**: operations take a [`UiState`] rather than reaching for
//!   global editor state.

mod block;
mod config;
mod numbering;
mod ops;
mod renumber;
mod tree;
mod ui;

#[cfg(test)]
mod testing;

pub use block::{Block, ListData, PathEntry};
pub use config::NumberingConfig;
pub use numbering::{MAX_LIST_NUMBER, number_for_placement};
pub use ops::{BlockOps, DeleteOutcome};
pub use renumber::{
    AffectedBlock, Assignment, RenumberResult, affected_depths, ordered_runs, plan_renumber,
    renumber,
};
pub use tree::{FactIndex, MAX_LIST_DEPTH, build_tree, build_tree_local};
pub use ui::{Caret, FocusedEntity, MemoryUiState, SelectedBlock, UiState};

/// Result type for block operations.
pub type Result<T> = std::result::Result<T, folio_store::StoreError>;
