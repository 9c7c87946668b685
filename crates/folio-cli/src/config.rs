//! CLI configuration, loaded from RON.
//!
//! ```ron
//! (
//!     database: Some("/home/me/notes/facts.db"),
//!     numbering: (cascade_adjacent_depths: false),
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use folio_blocks::NumberingConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Database file. Falls back to the XDG data dir.
    pub database: Option<PathBuf>,
    pub numbering: NumberingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl FolioConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Load `explicit` if given, else the default config file if present,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Database path: command-line override, then config, then default.
    pub fn database_path(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.database.clone())
            .unwrap_or_else(default_database_path)
    }
}

/// `$XDG_CONFIG_HOME/folio/config.ron`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("folio").join("config.ron"))
}

/// `$XDG_DATA_HOME/folio/facts.db`, or `./facts.db` without a data dir.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("folio"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("facts.db")
}
