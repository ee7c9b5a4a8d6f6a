use chrono::{DateTime, Local};

/// Context provided to jobs while a tick is prepared and interpreted.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Wall-clock time at which the tick started.
    pub now: DateTime<Local>,
}

impl JobContext {
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now }
    }
}
