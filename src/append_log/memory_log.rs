use super::{AppendLog, LogError, LogRecord, StreamId};
use std::sync::Mutex;

/// In-memory streams, used by tests and dry runs.
#[derive(Default)]
pub struct MemoryAppendLog {
    records: Mutex<Vec<(StreamId, LogRecord)>>,
}

impl MemoryAppendLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records appended to `stream`, in append order.
    pub fn records(&self, stream: StreamId) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Rendered lines of `stream`, in append order.
    pub fn lines(&self, stream: StreamId) -> Vec<String> {
        self.records(stream).iter().map(LogRecord::to_line).collect()
    }

    /// Messages of `stream` without timestamps.
    pub fn messages(&self, stream: StreamId) -> Vec<String> {
        self.records(stream).into_iter().map(|r| r.message).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AppendLog for MemoryAppendLog {
    fn append(&self, stream: StreamId, record: &LogRecord) -> Result<(), LogError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((stream, record.clone()));
        Ok(())
    }
}
