//! # Transcript Log
//!
//! Append-only record of chat exchanges, stored as `{"chats": [...]}`.
//!
//! Writes report failure through `Result` so a chat turn can carry on with a
//! warning. Reads never fail: an unreadable transcript is an empty one.

use crate::clock::{self, format_timestamp, Clock};
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::error::Result;
use crate::model::{ChatExchange, TranscriptDocument};
use crate::store::{DocumentStore, TRANSCRIPT_FILE};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct TranscriptLog {
    doc: DocumentStore<TranscriptDocument>,
    clock: Arc<dyn Clock>,
    history_limit: usize,
}

impl TranscriptLog {
    pub fn new(root: &Path) -> Self {
        Self {
            doc: DocumentStore::new(root.join(TRANSCRIPT_FILE)),
            clock: clock::system(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    pub fn ensure_initialized(&self) -> Result<bool> {
        self.doc.ensure_initialized(&TranscriptDocument::default())
    }

    /// Stamp and append one exchange. The whole load-append-save runs under
    /// the transcript's lock.
    pub fn append(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_response: &str,
    ) -> Result<ChatExchange> {
        let exchange = ChatExchange {
            user_id: user_id.to_string(),
            timestamp: format_timestamp(self.clock.now()),
            user_message: user_message.to_string(),
            assistant_response: assistant_response.to_string(),
        };

        let res = self.doc.update(TranscriptDocument::default, |doc| {
            doc.chats.push(exchange.clone());
        });
        if let Err(e) = &res {
            tracing::warn!(path = %self.path().display(), error = %e, "could not save chat exchange");
        }
        res.map(|_| exchange)
    }

    /// The most recent `limit` exchanges (optionally for one user), oldest
    /// first.
    ///
    /// A `None` or zero `limit` returns every match. An empty `user_id` is the
    /// same as `None`: no filter. A transcript that was never written is
    /// created empty by this call.
    pub fn query(&self, user_id: Option<&str>, limit: Option<usize>) -> Vec<ChatExchange> {
        match self.doc.load_or_init(TranscriptDocument::default) {
            Ok(doc) => tail(doc.chats, user_id, limit),
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "transcript unreadable, returning empty history");
                Vec::new()
            }
        }
    }

    /// [`TranscriptLog::query`] with the configured history limit.
    pub fn recent(&self, user_id: Option<&str>) -> Vec<ChatExchange> {
        self.query(user_id, Some(self.history_limit))
    }

    /// The full document, with errors intact. Used by the exporter, which
    /// must not mistake a broken transcript for an empty one. A missing
    /// transcript is created empty first.
    pub fn load(&self) -> Result<TranscriptDocument> {
        self.doc.load_or_init(TranscriptDocument::default)
    }
}

fn tail(chats: Vec<ChatExchange>, user_id: Option<&str>, limit: Option<usize>) -> Vec<ChatExchange> {
    let mut matching: Vec<ChatExchange> = match user_id.filter(|id| !id.is_empty()) {
        Some(id) => chats.into_iter().filter(|c| c.user_id == id).collect(),
        None => chats,
    };
    if let Some(limit) = limit.filter(|&n| n > 0) {
        let skip = matching.len().saturating_sub(limit);
        matching.drain(..skip);
    }
    matching
}
