//! # folio-store
//!
//! Fact store accessor for folio.
//!
//! Key components:
//!
//! - [`FactRead`] / [`FactStore`] - async traits over the triple store, with
//!   the structural block moves as default methods
//! - [`MemoryFactStore`] - in-memory backend (tests, ephemeral sessions)
//! - [`SqliteFactStore`] - SQLite backend
//! - [`position_between`] - fractional sibling positions
//!
//! ## Design Decisions
//!
//! - **Primitives vs moves**: backends implement scans, put, and retract;
//!   moves are composed from those so every backend moves blocks identically.
//! - **Insertion-ordered scans**: scans return facts in the order they were
//!   first written; sibling order is decided by `(position, fact id)`, never
//!   by scan order.

mod error;
mod memory;
mod ops;
pub mod position;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryFactStore;
pub use ops::{BlockPosition, FactRead, FactStore, OutdentMove};
pub use position::{position_after, position_between};
pub use sqlite::SqliteFactStore;
