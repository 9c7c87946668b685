//! Identity, attribute, and fact types for folio.
//!
//! This crate is the triple-store foundation: typed IDs, the attribute
//! vocabulary with its schema, and the fact record itself. It has **no
//! internal folio dependencies**: a pure leaf crate the store and block
//! crates build on.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`EntityId`]      | Which entity (page, block, list item)        |
//! | [`FactId`]        | Which fact (also the sibling tie-break)      |
//! | [`Attribute`]     | Attribute name + cardinality + payload kind  |
//! | [`FactData`]      | Typed payload                                |
//! | [`Fact`]          | `(id, entity, attribute, data)`              |
//! | [`BlockType`]     | What a block is                              |
//! | [`ListStyle`]     | Ordered or unordered list marker             |
//! |-------------------|----------------------------------------------|

pub mod attribute;
pub mod block;
pub mod fact;
pub mod ids;

pub use attribute::{Attribute, Cardinality, PayloadKind};
pub use block::{BlockType, ListStyle, PAGE_TYPE_CANVAS};
pub use fact::{Fact, FactData, FactError, sort_siblings};
pub use ids::{EntityId, FactId};
