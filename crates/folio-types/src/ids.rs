//! Typed identifiers for entities and facts.
//!
//! Both ID types wrap UUIDv7 (time-ordered, globally unique) and display as
//! standard UUID text for logging. The `short()` form (first 8 hex chars) is
//! for human-facing output only, never a lookup key.
//!
//! Ordering is byte-wise, which is the same order as comparing the lowercase
//! hex strings. Sibling blocks with equal positions fall back to this order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An entity identifier (UUIDv7, or UUIDv5 for named entities).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(uuid::Uuid);

/// A fact identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactId(uuid::Uuid);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new time-ordered ID (UUIDv7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// First 8 hex characters, for human display only (not lookup).
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }

            /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::str::FromStr for $T {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Full UUID with hyphens for log readability
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_typed_id!(EntityId, "EntityId");
impl_typed_id!(FactId, "FactId");

// ── Named entities ──────────────────────────────────────────────────────────

/// Fixed namespace for deriving deterministic EntityIds via UUIDv5.
const FOLIO_ENTITY_NS: uuid::Uuid = uuid::uuid!("3f1c9a62-8d4e-4b7a-9e25-6a0d2c7b81f4");

impl EntityId {
    /// Derive a stable entity ID from a name.
    ///
    /// Same input always produces the same output (UUIDv5). Used for
    /// well-known roots and for fixtures that need readable identities.
    pub fn named(name: &str) -> Self {
        Self(uuid::Uuid::new_v5(&FOLIO_ENTITY_NS, name.as_bytes()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
        assert_ne!(FactId::new(), FactId::new());
    }

    #[test]
    fn test_named_is_deterministic() {
        assert_eq!(EntityId::named("page"), EntityId::named("page"));
        assert_ne!(EntityId::named("page"), EntityId::named("other"));
    }

    #[test]
    fn test_parse_accepts_hex_and_hyphenated() {
        let id = FactId::new();
        let hex = id.0.as_simple().to_string();
        assert_eq!(FactId::parse(&hex).unwrap(), id);
        assert_eq!(id.to_string().parse::<FactId>().unwrap(), id);
    }

    #[test]
    fn test_ordering_matches_hex_ordering() {
        let mut ids: Vec<FactId> = (0..32).map(|_| FactId(uuid::Uuid::new_v4())).collect();
        let mut by_hex = ids.clone();
        ids.sort();
        by_hex.sort_by_key(|id| id.0.as_simple().to_string());
        assert_eq!(ids, by_hex);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = EntityId::named("root");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
