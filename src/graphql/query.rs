//! Query documents and the request/response envelopes exchanged with the CRM endpoint.

use super::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named parameters bound to a document's variables.
pub type Variables = Map<String, Value>;

/// The decoded `data` member of a successful response.
pub type RawResult = Map<String, Value>;

/// A fixed query or mutation document.
///
/// Documents are versioned contracts with the remote API, so they are
/// declared as constants next to the job that sends them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDocument {
    pub operation_name: Option<&'static str>,
    pub text: &'static str,
}

impl QueryDocument {
    /// An anonymous document.
    pub const fn new(text: &'static str) -> Self {
        Self {
            operation_name: None,
            text,
        }
    }

    /// A document with a named operation (required when it declares variables).
    pub const fn named(operation_name: &'static str, text: &'static str) -> Self {
        Self {
            operation_name: Some(operation_name),
            text,
        }
    }

    /// Build the request body for this document.
    pub fn request(&self, variables: &Variables) -> GraphQlRequest {
        GraphQlRequest {
            query: self.text.to_string(),
            operation_name: self.operation_name.map(str::to_string),
            variables: variables.clone(),
        }
    }
}

/// JSON body posted to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub variables: Variables,
}

/// JSON body returned by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlErrorMessage {
    #[serde(default)]
    pub message: String,
}

impl GraphQlResponse {
    /// A response carrying only data, as a server would send on success.
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// A response carrying only error messages.
    pub fn with_errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: None,
            errors: Some(
                messages
                    .into_iter()
                    .map(|m| GraphQlErrorMessage { message: m.into() })
                    .collect(),
            ),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Split the envelope into data or an application-level error.
    ///
    /// Any error entry wins over partial data.
    pub fn into_result(self) -> Result<RawResult, ApiError> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            return Err(ApiError::Application(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        match self.data {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(ApiError::MissingData),
        }
    }
}
