//! # Preference Table
//!
//! Per-user overrides live under `favorites[user_id][name]`. The top-level
//! `theme` and `use_ai` fields are the process-wide defaults.
//!
//! A user with no entry simply has no overrides. Reads fall back to the
//! caller's default on any error; writes return it. The first access of
//! either kind creates the document with the built-in defaults.

use crate::error::Result;
use crate::model::{PreferenceDocument, DEFAULT_THEME};
use crate::store::{DocumentStore, PREFERENCES_FILE};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub theme: String,
    pub use_ai: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            use_ai: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceTable {
    doc: DocumentStore<PreferenceDocument>,
}

impl PreferenceTable {
    pub fn new(root: &Path) -> Self {
        Self {
            doc: DocumentStore::new(root.join(PREFERENCES_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    pub fn ensure_initialized(&self) -> Result<bool> {
        self.doc.ensure_initialized(&PreferenceDocument::default())
    }

    pub fn set(&self, user_id: &str, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.write("preference", |doc| {
            doc.favorites
                .entry(user_id.to_string())
                .or_default()
                .insert(name.to_string(), value);
        })
    }

    /// `favorites[user_id][name]`, or `default` when either key is missing or
    /// the document cannot be read.
    pub fn get(&self, user_id: &str, name: &str, default: Value) -> Value {
        match self.doc.load_or_init(PreferenceDocument::default) {
            Ok(doc) => doc.lookup(user_id, name).cloned().unwrap_or(default),
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "preferences unreadable, using default");
                default
            }
        }
    }

    pub fn defaults(&self) -> Defaults {
        match self.doc.load_or_init(PreferenceDocument::default) {
            Ok(doc) => Defaults {
                theme: doc.theme,
                use_ai: doc.use_ai,
            },
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "preferences unreadable, using built-in defaults");
                Defaults::default()
            }
        }
    }

    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.write("theme", |doc| doc.theme = theme.to_string())
    }

    pub fn set_use_ai(&self, use_ai: bool) -> Result<()> {
        self.write("use_ai", |doc| doc.use_ai = use_ai)
    }

    fn write<F: FnOnce(&mut PreferenceDocument)>(&self, what: &str, mutate: F) -> Result<()> {
        let res = self.doc.update(PreferenceDocument::default, mutate);
        if let Err(e) = &res {
            tracing::warn!(path = %self.path().display(), error = %e, "could not save {}", what);
        }
        res
    }
}
