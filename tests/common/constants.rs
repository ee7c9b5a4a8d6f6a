//! Shared constants for end-to-end tests
//!
//! Timestamps below are rendered from `harness::test_now()`.

// ============================================================================
// Retry tuning
// ============================================================================

pub const TEST_MAX_ATTEMPTS: u32 = 3;

pub const TEST_ATTEMPT_TIMEOUT_SECS: u64 = 1;

pub const TEST_BACKOFF_MS: u64 = 10;

// ============================================================================
// Rendered timestamps
// ============================================================================

/// Heartbeat and stock streams: `%d/%m/%Y-%H:%M:%S`
pub const HEARTBEAT_STAMP: &str = "14/03/2025-09:30:00";

/// Report stream: `%Y-%m-%d %H:%M:%S - `
pub const REPORT_STAMP: &str = "2025-03-14 09:30:00 - ";

/// Reminders stream: `[%Y-%m-%d %H:%M:%S,%3f] `
pub const REMINDER_STAMP: &str = "[2025-03-14 09:30:00,000] ";

/// Seven days before the test time.
pub const REMINDER_CUTOFF: &str = "2025-03-07";

/// Address nothing listens on.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1/graphql";
