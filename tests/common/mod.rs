//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{JobHarness, StubGraphQlServer, StubReply};
//! use serde_json::json;
//!
//! #[test]
//! fn test_heartbeat() {
//!     let server = StubGraphQlServer::always(StubReply::data(json!({ "hello": "Hello, GraphQL!" })));
//!     let harness = JobHarness::new(&server);
//!
//!     let outcome = harness.run("heartbeat");
//!     assert!(!outcome.is_failure());
//! }
//! ```

mod constants;
mod harness;
mod server;

// Public API - this is what tests import
pub use constants::*;
pub use harness::{test_now, JobHarness};
pub use server::{StubGraphQlServer, StubReply};
