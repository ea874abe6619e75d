//! # Startup
//!
//! Resolves the storage root and makes sure every document exists before the
//! first request is served.
//!
//! ## Root Resolution
//!
//! 1. `root` from [`StoreConfig`] (file or `ASSISTANT_STORE_ROOT`), used as is.
//! 2. Otherwise the OS data directory for the application (via the
//!    `directories` crate), e.g. `~/.local/share/assistant-store` on Linux.
//! 3. If the platform has no such directory, `./data`.
//!
//! The root is created recursively. Failing to create it, or to write any of
//! the default documents, is a startup error: nothing else in the crate can
//! work without them.

use crate::api::AssistantStore;
use crate::clock::{self, Clock};
use crate::config::StoreConfig;
use crate::error::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const FALLBACK_ROOT: &str = "data";

pub fn resolve_root(config: &StoreConfig) -> PathBuf {
    if let Some(root) = &config.root {
        return root.clone();
    }
    ProjectDirs::from("com", "assistant-store", "assistant-store")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_ROOT))
}

pub fn initialize(config: &StoreConfig) -> Result<AssistantStore> {
    initialize_with_clock(config, clock::system())
}

pub fn initialize_with_clock(config: &StoreConfig, clock: Arc<dyn Clock>) -> Result<AssistantStore> {
    let root = resolve_root(config);
    if !root.exists() {
        fs::create_dir_all(&root)?;
    }

    let store = AssistantStore::new(root, config, clock);
    if let Err(e) = store.ensure_initialized() {
        tracing::error!(root = %store.root().display(), error = %e, "could not initialize storage");
        return Err(e);
    }
    tracing::debug!(root = %store.root().display(), "storage ready");
    Ok(store)
}
