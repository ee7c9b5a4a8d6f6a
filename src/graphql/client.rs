use super::error::ApiError;
use super::query::{QueryDocument, RawResult, Variables};
use super::retry_policy::RetryPolicy;
use super::transport::Transport;
use std::sync::Arc;

/// Retrying GraphQL client.
///
/// Stateless apart from its configuration, so one instance can serve
/// concurrent ticks of any number of jobs. Emits no log output; callers
/// decide how failures are recorded.
#[derive(Clone)]
pub struct GraphQlClient {
    transport: Arc<dyn Transport>,
    retry_policy: RetryPolicy,
}

impl GraphQlClient {
    pub fn new(transport: Arc<dyn Transport>, retry_policy: RetryPolicy) -> Self {
        Self {
            transport,
            retry_policy,
        }
    }

    /// Execute `query` with `variables`, retrying transient transport failures.
    ///
    /// Application errors and 4xx rejections are returned after the attempt
    /// that produced them.
    pub fn execute(
        &self,
        query: &QueryDocument,
        variables: &Variables,
    ) -> Result<RawResult, ApiError> {
        let request = query.request(variables);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self
                .transport
                .send(&request, self.retry_policy.attempt_timeout)
            {
                Ok(response) => return response.into_result(),
                Err(err) if self.retry_policy.should_retry(&err, attempts) => {
                    let delay = self.retry_policy.backoff(attempts);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(source) => return Err(ApiError::Transport { attempts, source }),
            }
        }
    }
}
