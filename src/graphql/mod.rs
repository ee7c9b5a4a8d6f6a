//! Client side of the CRM GraphQL API.
//!
//! [`GraphQlClient`] executes fixed [`QueryDocument`]s through a [`Transport`],
//! applying a [`RetryPolicy`] to transient failures.

mod client;
mod error;
mod query;
mod retry_policy;
mod transport;

pub use client::GraphQlClient;
pub use error::{ApiError, TransportError};
pub use query::{
    GraphQlErrorMessage, GraphQlRequest, GraphQlResponse, QueryDocument, RawResult, Variables,
};
pub use retry_policy::RetryPolicy;
pub use transport::{HttpTransport, Transport};

#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
