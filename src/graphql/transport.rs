//! HTTP transport for the CRM GraphQL endpoint.

use super::error::TransportError;
use super::query::{GraphQlRequest, GraphQlResponse};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

/// A single round trip to the endpoint.
///
/// Implementations perform exactly one attempt; retrying is the client's job.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &GraphQlRequest,
        timeout: Duration,
    ) -> Result<GraphQlResponse, TransportError>;
}

/// Blocking `reqwest` transport posting JSON to a fixed URL.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("crm-jobs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: &GraphQlRequest,
        timeout: Duration,
    ) -> Result<GraphQlResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(request)
            .send()
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(TransportError::ServerStatus(status.as_u16()));
        }

        let body = response.text().map_err(classify_reqwest_error)?;

        if status.is_client_error() {
            // GraphQL servers answer invalid documents with 400 and an error payload
            return match serde_json::from_str::<GraphQlResponse>(&body) {
                Ok(parsed) if parsed.has_errors() => Ok(parsed),
                _ => Err(TransportError::ClientStatus(status.as_u16())),
            };
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_decode() {
        TransportError::Malformed(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
