//! CRM heartbeat job.
//!
//! Records that the scheduler is alive, then checks that the GraphQL
//! endpoint answers the trivial `hello` query. The two steps produce two
//! separate records; the first never depends on the network.

use crate::append_log::StreamId;
use crate::background_jobs::{
    context::JobContext,
    job::{decode_field, Entry, Interpretation, JobSpec},
};
use crate::graphql::{ApiError, QueryDocument, RawResult};
use std::time::Duration;

const HELLO_QUERY: QueryDocument = QueryDocument::new("query { hello }");

/// Value recorded when the response lacks the `hello` field.
const NO_RESPONSE: &str = "No response";

pub struct HeartbeatJob {
    interval: Duration,
}

impl HeartbeatJob {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl JobSpec for HeartbeatJob {
    fn id(&self) -> &'static str {
        "heartbeat"
    }

    fn name(&self) -> &'static str {
        "CRM Heartbeat"
    }

    fn description(&self) -> &'static str {
        "Record that the CRM is alive and check the GraphQL hello field"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn stream(&self) -> StreamId {
        StreamId::Heartbeat
    }

    fn query(&self) -> &QueryDocument {
        &HELLO_QUERY
    }

    fn preamble(&self, _ctx: &JobContext) -> Vec<Entry> {
        vec![Entry::info("CRM is alive")]
    }

    fn interpret(&self, data: &RawResult, _ctx: &JobContext) -> Interpretation {
        let mut out = Interpretation::new();
        let hello: Option<String> = decode_field(data, "hello", &mut out);
        out.info(format!(
            "GraphQL hello: {}",
            hello.as_deref().unwrap_or(NO_RESPONSE)
        ));
        out
    }

    fn failure_message(&self, error: &ApiError) -> String {
        format!("GraphQL check failed: {}", error)
    }
}
