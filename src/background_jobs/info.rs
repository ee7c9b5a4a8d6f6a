use super::job::JobSpec;
use serde::Serialize;

/// Information about a registered job, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub stream: String,
    pub interval_secs: u64,
    pub operation: Option<String>,
}

impl From<&dyn JobSpec> for JobInfo {
    fn from(job: &dyn JobSpec) -> Self {
        Self {
            id: job.id().to_string(),
            name: job.name().to_string(),
            description: job.description().to_string(),
            stream: job.stream().to_string(),
            interval_secs: job.interval().as_secs(),
            operation: job.query().operation_name.map(str::to_string),
        }
    }
}

/// Render a duration in seconds as the largest whole unit.
pub fn format_interval(secs: u64) -> String {
    const UNITS: [(u64, &str); 4] = [(604_800, "w"), (86_400, "d"), (3_600, "h"), (60, "m")];
    for (size, suffix) in UNITS {
        if secs >= size && secs % size == 0 {
            return format!("{}{}", secs / size, suffix);
        }
    }
    format!("{}s", secs)
}
