//! # Document Store
//!
//! Every resource in this crate is a single JSON document on disk. This module
//! is the only place that touches the filesystem for them.
//!
//! ## Operations
//!
//! - [`ensure_initialized`]: create the file with a default value if absent.
//!   Repeated or concurrent calls leave exactly one well-formed document.
//! - [`load`]: read and parse. `NotFound` if absent, `CorruptData` if the
//!   content does not match the declared shape (including an empty file).
//! - [`save`]: atomic replace.
//! - [`DocumentStore::load_or_init`]: the read path the components use. A
//!   missing document is created from its default before it is read, so any
//!   first access, read or write, leaves the file on disk.
//!
//! ## Atomic Writes
//!
//! Saves write to `.{name}-{uuid}.tmp` in the target's directory, fsync, then
//! rename over the target. A reader sees the old document or the new one,
//! never a prefix of either.
//!
//! ## Locking
//!
//! Each document path has its own process-wide mutex (see `lock`).
//! [`DocumentStore::update`] holds it from load through save so two concurrent
//! read-modify-write cycles cannot drop each other's change. Reads do not lock.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! ├── chat_history.json       # Transcript Log
//! ├── user_preferences.json   # Preference Table
//! ├── players_data.json       # Players snapshot
//! └── match_data.json         # Matches snapshot
//! ```

pub mod document;
mod lock;

pub use document::{ensure_initialized, load, save, DocumentStore};

pub const TRANSCRIPT_FILE: &str = "chat_history.json";
pub const PREFERENCES_FILE: &str = "user_preferences.json";
