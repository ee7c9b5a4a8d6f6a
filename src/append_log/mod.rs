//! Append-only, line-oriented record streams.
//!
//! Each stream (heartbeat, stock, report, reminders) is an independent target.
//! Appends to the same target are serialized so concurrent writers never
//! interleave or truncate each other's lines.

mod file_log;
mod memory_log;
mod record;

pub use file_log::FileAppendLog;
pub use memory_log::MemoryAppendLog;
pub use record::{LogRecord, Severity, StreamId};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("no target configured for stream {0}")]
    UnknownStream(StreamId),

    #[error("failed to append to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write side of the record streams.
pub trait AppendLog: Send + Sync {
    /// Append `record` as one complete line to `stream`.
    fn append(&self, stream: StreamId, record: &LogRecord) -> Result<(), LogError>;
}
