//! Specific job implementations.
//!
//! This module contains implementations of the `JobSpec` trait for the
//! CRM maintenance tasks.

pub mod heartbeat;
pub mod low_stock_restock;
pub mod order_reminders;
pub mod weekly_report;

pub use heartbeat::HeartbeatJob;
pub use low_stock_restock::{LowStockRestockJob, RestockPolicy};
pub use order_reminders::OrderRemindersJob;
pub use weekly_report::WeeklyReportJob;

use super::JobSpec;
use crate::config::JobsSettings;
use std::sync::Arc;
use std::time::Duration;

/// Build every job from its settings, in a stable order.
pub fn all_jobs(settings: &JobsSettings) -> Vec<Arc<dyn JobSpec>> {
    vec![
        Arc::new(HeartbeatJob::new(Duration::from_secs(
            settings.heartbeat_interval_secs,
        ))),
        Arc::new(LowStockRestockJob::new(
            Duration::from_secs(settings.low_stock_interval_secs),
            RestockPolicy::new(settings.low_stock_threshold, settings.restock_amount),
        )),
        Arc::new(WeeklyReportJob::new(Duration::from_secs(
            settings.weekly_report_interval_secs,
        ))),
        Arc::new(OrderRemindersJob::new(
            Duration::from_secs(settings.order_reminders_interval_secs),
            settings.reminder_lookback_days,
        )),
    ]
}

/// Look a job up by its id.
pub fn find_job(settings: &JobsSettings, id: &str) -> Option<Arc<dyn JobSpec>> {
    all_jobs(settings).into_iter().find(|job| job.id() == id)
}
