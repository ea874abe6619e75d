//! CSV export of the full transcript.
//!
//! Columns are fixed: `user_id,timestamp,user_message,assistant_response`, one
//! row per exchange in document order. Quoting follows RFC 4180 so embedded
//! commas, quotes and newlines survive a round trip.

use crate::error::Result;
use crate::model::ChatExchange;
use crate::store::document::replace_file;
use crate::transcript::TranscriptLog;
use std::io::Write;
use std::path::Path;

pub const CSV_HEADER: [&str; 4] = ["user_id", "timestamp", "user_message", "assistant_response"];

/// Write every exchange to `output`. Returns the number of rows written,
/// not counting the header.
///
/// The CSV is built in a temp file next to `output` and renamed into place,
/// so a failed export leaves any previous file at `output` as it was.
pub fn export_csv(log: &TranscriptLog, output: &Path) -> Result<usize> {
    let res = log
        .load()
        .and_then(|doc| replace_file(output, |file| write_csv(file, &doc.chats)));

    match &res {
        Ok(rows) => tracing::debug!(output = %output.display(), rows, "exported transcript"),
        Err(e) => {
            tracing::warn!(output = %output.display(), error = %e, "could not export transcript")
        }
    }
    res
}

pub fn write_csv<W: Write>(writer: W, chats: &[ChatExchange]) -> Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER)?;
    for chat in chats {
        out.write_record([
            chat.user_id.as_str(),
            chat.timestamp.as_str(),
            chat.user_message.as_str(),
            chat.assistant_response.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(chats.len())
}
