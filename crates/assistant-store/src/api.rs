//! # API Facade
//!
//! [`AssistantStore`] bundles the four resources that share one storage root.
//! Callers talk to the component they need:
//!
//! - chat handler: [`AssistantStore::transcripts`] (`append`, `query`)
//! - preference UI: [`AssistantStore::preferences`] (`get`, `set`)
//! - data adapters: [`AssistantStore::players`] / [`AssistantStore::matches`]
//!   (`is_stale`, `save`, `load`)
//! - export command: [`AssistantStore::export_transcripts`]
//!
//! The components do not know about each other; each owns one document and
//! one lock. Build the facade through [`crate::init::initialize`].

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::export;
use crate::preferences::PreferenceTable;
use crate::snapshot::{MatchCache, PlayerCache};
use crate::transcript::TranscriptLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct AssistantStore {
    root: PathBuf,
    transcripts: TranscriptLog,
    preferences: PreferenceTable,
    players: PlayerCache,
    matches: MatchCache,
}

impl AssistantStore {
    /// Wire the components under `root` without touching the disk.
    pub(crate) fn new(root: PathBuf, config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            transcripts: TranscriptLog::new(&root)
                .with_clock(Arc::clone(&clock))
                .with_history_limit(config.history_limit),
            preferences: PreferenceTable::new(&root),
            players: PlayerCache::new(&root)
                .with_clock(Arc::clone(&clock))
                .with_max_age_secs(config.max_snapshot_age_secs),
            matches: MatchCache::new(&root)
                .with_clock(clock)
                .with_max_age_secs(config.max_snapshot_age_secs),
            root,
        }
    }

    /// Create any of the four documents that are missing.
    pub fn ensure_initialized(&self) -> Result<()> {
        self.transcripts.ensure_initialized()?;
        self.preferences.ensure_initialized()?;
        self.players.ensure_initialized()?;
        self.matches.ensure_initialized()?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn transcripts(&self) -> &TranscriptLog {
        &self.transcripts
    }

    pub fn preferences(&self) -> &PreferenceTable {
        &self.preferences
    }

    pub fn players(&self) -> &PlayerCache {
        &self.players
    }

    pub fn matches(&self) -> &MatchCache {
        &self.matches
    }

    pub fn export_transcripts(&self, output: &Path) -> Result<usize> {
        export::export_csv(&self.transcripts, output)
    }
}
