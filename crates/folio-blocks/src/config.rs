//! Numbering configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the renumbering engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Also renumber the depths directly above and below each affected
    /// depth. Off by default: the new and previous depths already cover
    /// every run a single structural edit can touch.
    pub cascade_adjacent_depths: bool,
}
