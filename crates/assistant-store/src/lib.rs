//! # Assistant Store Architecture
//!
//! Local persistence for a chat assistant: the conversation transcript,
//! per-user preferences, and two cached domain snapshots (players and
//! matches). Populating the caches, generating replies and rendering are the
//! callers' business; this crate only stores and serves.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Facade (api.rs, wired by init.rs)                          │
//! │  - One storage root, four resources                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Components                                                 │
//! │  - TranscriptLog, PreferenceTable, SnapshotCache<K>         │
//! │  - export (CSV view of the transcript)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Document Store (store/)                                    │
//! │  - ensure_initialized / load / atomic save                  │
//! │  - one lock per document path                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//!
//! - **Writes** (`append`, `set`, `save`, `export_csv`) return [`error::Result`].
//!   Callers surface a soft warning and carry on.
//! - **Reads** (`query`, `get`, `load`, `is_stale`) never fail. A missing
//!   document is created with its default and read as such. A corrupt one
//!   reads as empty, as the caller's default, or as stale.
//! - **Startup** ([`init::initialize`]) fails hard if the root or a default
//!   document cannot be written.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade bundling all resources
//! - [`init`]: Root resolution and startup initialization
//! - [`store`]: Document load/save primitives and per-path locking
//! - [`transcript`]: Append-only chat log
//! - [`export`]: CSV export of the chat log
//! - [`preferences`]: Per-user preference overrides
//! - [`snapshot`]: Timestamped caches with a staleness test
//! - [`model`]: Document shapes
//! - [`clock`]: Injectable time source
//! - [`config`]: Configuration
//! - [`error`]: Error types

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod init;
pub mod model;
pub mod preferences;
pub mod snapshot;
pub mod store;
pub mod transcript;

pub use api::AssistantStore;
pub use error::{Result, StoreError};
