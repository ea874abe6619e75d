//! # Domain Snapshot Cache
//!
//! Holds the latest payload fetched from an external source together with the
//! time it was saved. Fetchers ask [`SnapshotCache::is_stale`] whether to
//! reuse the cache or fetch again and [`SnapshotCache::save`] the result.
//!
//! ## Lifecycle
//!
//! ```text
//! UNINITIALIZED --save--> FRESH --time passes max_age--> STALE --save--> FRESH
//! ```
//!
//! A missing, corrupt or never-saved document counts as `UNINITIALIZED`: it
//! is always stale and loads as empty. Reading a missing snapshot writes the
//! empty default to disk. Staleness is strict: a snapshot exactly
//! `max_age` old is still fresh.

use crate::clock::{self, format_timestamp, parse_timestamp, Clock};
use crate::config::DEFAULT_MAX_SNAPSHOT_AGE_SECS;
use crate::error::Result;
use crate::model::{Matches, Players, SnapshotDocument, SnapshotKind};
use crate::store::{self, DocumentStore};
use chrono::{Duration, NaiveDateTime};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub type PlayerCache = SnapshotCache<Players>;
pub type MatchCache = SnapshotCache<Matches>;

pub struct SnapshotCache<K: SnapshotKind> {
    doc: DocumentStore<SnapshotDocument<K>>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl<K: SnapshotKind> Clone for SnapshotCache<K> {
    fn clone(&self) -> Self {
        Self {
            doc: self.doc.clone(),
            clock: Arc::clone(&self.clock),
            max_age: self.max_age,
        }
    }
}

impl<K: SnapshotKind> SnapshotCache<K> {
    pub fn new(root: &Path) -> Self {
        Self {
            doc: DocumentStore::new(root.join(K::FILE_NAME)),
            clock: clock::system(),
            max_age: seconds(DEFAULT_MAX_SNAPSHOT_AGE_SECS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Threshold used by [`SnapshotCache::is_stale_default`].
    pub fn with_max_age_secs(mut self, secs: u64) -> Self {
        self.max_age = seconds(secs);
        self
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    pub fn ensure_initialized(&self) -> Result<bool> {
        self.doc.ensure_initialized(&SnapshotDocument::default())
    }

    /// Replace the stored payload and stamp it with the current time. A
    /// shorter payload shrinks the snapshot.
    pub fn save(&self, payload: Vec<K::Item>) -> Result<()> {
        let count = payload.len();
        let doc = SnapshotDocument::<K>::new(format_timestamp(self.clock.now()), payload);
        let res = self.doc.save(&doc);
        match &res {
            Ok(()) => tracing::debug!(kind = K::PAYLOAD_KEY, count, "saved snapshot"),
            Err(e) => {
                tracing::warn!(kind = K::PAYLOAD_KEY, path = %self.path().display(), error = %e, "could not save snapshot")
            }
        }
        res
    }

    pub fn load(&self) -> Vec<K::Item> {
        match self.doc.load_or_init(SnapshotDocument::default) {
            Ok(doc) => doc.payload,
            Err(e) => {
                tracing::warn!(kind = K::PAYLOAD_KEY, path = %self.path().display(), error = %e, "snapshot unreadable, returning empty");
                Vec::new()
            }
        }
    }

    /// When the snapshot was last saved, if it ever was.
    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.doc
            .load_or_init(SnapshotDocument::default)
            .ok()
            .and_then(|doc| doc.last_updated)
            .and_then(|raw| parse_timestamp(&raw))
    }

    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        stale_since(self.last_updated(), seconds(max_age_secs), self.clock.now())
    }

    pub fn is_stale_default(&self) -> bool {
        stale_since(self.last_updated(), self.max_age, self.clock.now())
    }
}

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

fn stale_since(last_updated: Option<NaiveDateTime>, max_age: Duration, now: NaiveDateTime) -> bool {
    match last_updated {
        Some(at) => now.signed_duration_since(at) > max_age,
        None => true,
    }
}

/// The staleness rule applied to any document with a top-level
/// `last_updated` string. Missing file, unreadable content, missing field or
/// unparseable timestamp all count as stale.
pub fn is_document_stale(path: &Path, max_age_secs: u64, now: NaiveDateTime) -> bool {
    let doc: Value = match store::load(path) {
        Ok(doc) => doc,
        Err(_) => return true,
    };
    let last_updated = doc
        .get("last_updated")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    stale_since(last_updated, seconds(max_age_secs), now)
}
