use thiserror::Error;

/// Failure to obtain a well-formed response from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    /// 5xx from the endpoint.
    #[error("server returned HTTP {0}")]
    ServerStatus(u16),

    /// 4xx without a GraphQL error payload.
    #[error("request rejected with HTTP {0}")]
    ClientStatus(u16),

    /// The body could not be decoded as a GraphQL response.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::ClientStatus(_))
    }
}

/// Errors returned by [`super::GraphQlClient::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport kept failing (or failed fast) after `attempts` attempts.
    #[error("{source} (after {attempts} attempt(s))")]
    Transport {
        attempts: u32,
        source: TransportError,
    },

    /// The API answered with a structured error payload.
    #[error("{}", .0.join("; "))]
    Application(Vec<String>),

    /// The API answered with neither data nor errors.
    #[error("response contained no data")]
    MissingData,
}
