//! # Configuration
//!
//! The storage root is the only input the store needs. The remaining keys just
//! supply defaults for callers that do not pass their own.
//!
//! Resolved in priority order by [`confique`]:
//! 1. **Environment variables**: `ASSISTANT_STORE_ROOT`, etc.
//! 2. **Config file**: an optional TOML file handed to [`StoreConfig::load`].
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `root` | OS data dir | Directory holding the four documents |
//! | `max_snapshot_age_secs` | `3600` | Age past which a snapshot is stale |
//! | `history_limit` | `10` | Exchanges returned by `TranscriptLog::recent` |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_SNAPSHOT_AGE_SECS: u64 = 3600;
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage root. Created recursively when missing. When absent, the OS
    /// data directory is used (see `init::resolve_root`).
    #[config(env = "ASSISTANT_STORE_ROOT")]
    pub root: Option<PathBuf>,

    #[config(env = "ASSISTANT_STORE_MAX_SNAPSHOT_AGE", default = 3600)]
    pub max_snapshot_age_secs: u64,

    #[config(env = "ASSISTANT_STORE_HISTORY_LIMIT", default = 10)]
    pub history_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_snapshot_age_secs: DEFAULT_MAX_SNAPSHOT_AGE_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl StoreConfig {
    /// Config rooted at `root` with every other key at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Load from the environment layered over an optional TOML file.
    /// A file path that does not exist is skipped.
    pub fn load(file: Option<&Path>) -> Result<Self, confique::Error> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        builder.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.root, None);
        assert_eq!(config.max_snapshot_age_secs, 3600);
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn test_with_root() {
        let config = StoreConfig::with_root("/tmp/somewhere");
        assert_eq!(config.root, Some(PathBuf::from("/tmp/somewhere")));
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("store.toml");
        fs::write(
            &file,
            "root = \"/srv/assistant\"\nmax_snapshot_age_secs = 60\n",
        )
        .unwrap();

        let config = StoreConfig::load(Some(&file)).unwrap();
        assert_eq!(config.max_snapshot_age_secs, 60);
        assert_eq!(config.history_limit, 10);
    }
}
