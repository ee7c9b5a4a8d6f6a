use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, append-only destination for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamId {
    Heartbeat,
    Stock,
    Report,
    Reminders,
}

impl StreamId {
    pub const ALL: [StreamId; 4] = [
        StreamId::Heartbeat,
        StreamId::Stock,
        StreamId::Report,
        StreamId::Reminders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamId::Heartbeat => "heartbeat",
            StreamId::Stock => "stock",
            StreamId::Report => "report",
            StreamId::Reminders => "reminders",
        }
    }

    /// Render `message` at `timestamp` in this stream's line layout.
    fn layout(&self, timestamp: &DateTime<Local>, message: &str) -> String {
        match self {
            StreamId::Heartbeat | StreamId::Stock => {
                format!("{} {}", timestamp.format("%d/%m/%Y-%H:%M:%S"), message)
            }
            StreamId::Report => {
                format!("{} - {}", timestamp.format("%Y-%m-%d %H:%M:%S"), message)
            }
            StreamId::Reminders => {
                format!("[{}] {}", timestamp.format("%Y-%m-%d %H:%M:%S,%3f"), message)
            }
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One line of a stream. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub stream: StreamId,
    pub severity: Severity,
    pub message: String,
}

impl LogRecord {
    pub fn new(
        timestamp: DateTime<Local>,
        stream: StreamId,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            stream,
            severity,
            message: message.into(),
        }
    }

    /// The line as written to the stream, without the trailing newline.
    ///
    /// Line breaks inside the message are flattened so a record is always one line.
    pub fn to_line(&self) -> String {
        let flat: String = self
            .message
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let body = match self.severity {
            Severity::Warning => format!("WARNING: {}", flat),
            Severity::Info | Severity::Error => flat,
        };
        self.stream.layout(&self.timestamp, &body)
    }
}
