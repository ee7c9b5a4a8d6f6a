//! Weekly CRM report job.
//!
//! Fetches every customer id and every order total, and records one
//! aggregate line with the customer count, order count and revenue.

use crate::append_log::StreamId;
use crate::background_jobs::{
    context::JobContext,
    job::{decode_field, Interpretation, JobSpec},
};
use crate::graphql::{ApiError, QueryDocument, RawResult};
use serde_json::Value;
use std::time::Duration;

const REPORT_QUERY: QueryDocument = QueryDocument::new(
    r#"query {
  customers { id }
  orders { totalAmount }
}"#,
);

/// Aggregated figures of one report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportTotals {
    pub customers: usize,
    pub orders: usize,
    pub revenue: f64,
}

impl ReportTotals {
    pub fn summary(&self) -> String {
        format!(
            "Report: {} customers, {} orders, {:.2} revenue",
            self.customers, self.orders, self.revenue
        )
    }
}

pub struct WeeklyReportJob {
    interval: Duration,
}

impl WeeklyReportJob {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Read an order's `totalAmount`, which the API sends as a decimal string or a number.
///
/// Absent and null amounts count as zero.
fn order_amount(order: &Value) -> Result<f64, String> {
    match order.get("totalAmount") {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("amount {} out of range", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("unparseable amount {:?}", s)),
        Some(other) => Err(format!("unexpected amount {}", other)),
    }
}

impl JobSpec for WeeklyReportJob {
    fn id(&self) -> &'static str {
        "weekly_report"
    }

    fn name(&self) -> &'static str {
        "Weekly CRM Report"
    }

    fn description(&self) -> &'static str {
        "Record customer count, order count and total revenue"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn stream(&self) -> StreamId {
        StreamId::Report
    }

    fn query(&self) -> &QueryDocument {
        &REPORT_QUERY
    }

    fn interpret(&self, data: &RawResult, _ctx: &JobContext) -> Interpretation {
        let mut anomalies = Interpretation::new();
        let customers: Vec<Value> = decode_field(data, "customers", &mut anomalies);
        let orders: Vec<Value> = decode_field(data, "orders", &mut anomalies);

        let mut revenue = 0.0;
        for (index, order) in orders.iter().enumerate() {
            match order_amount(order) {
                Ok(amount) => revenue += amount,
                Err(reason) => anomalies.warn(format!(
                    "Counting order at index {} as zero revenue: {}",
                    index, reason
                )),
            }
        }

        let totals = ReportTotals {
            customers: customers.len(),
            orders: orders.len(),
            revenue,
        };

        let mut out = Interpretation::new();
        out.info(totals.summary());
        let (entries, _) = anomalies.into_parts();
        for entry in entries {
            out.warn(entry.message);
        }
        out
    }

    fn failure_message(&self, error: &ApiError) -> String {
        format!("Report generation failed: {}", error)
    }
}
