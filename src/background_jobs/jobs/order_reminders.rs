//! Order reminder scan job.
//!
//! Fetches orders placed within the lookback window and records one line
//! per order with its id and the customer's email, then a count line.
//!
//! The cutoff is `now - lookback_days`, as a calendar date, and is inclusive:
//! an order placed exactly `lookback_days` days ago is still reminded.

use crate::append_log::StreamId;
use crate::background_jobs::{
    context::JobContext,
    job::{Interpretation, JobSpec},
};
use crate::graphql::{ApiError, QueryDocument, RawResult, Variables};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;
use std::time::Duration;

const RECENT_ORDERS_QUERY: QueryDocument = QueryDocument::named(
    "GetRecentOrders",
    r#"query GetRecentOrders($since: Date!) {
  orders(orderDate_Gte: $since) {
    id
    orderDate
    customer {
      email
    }
  }
}"#,
);

/// First calendar day inside the window ending at `now`.
///
/// Counts calendar days on `now`'s own wall-clock date, so a DST switch inside
/// the window does not move the cutoff.
pub fn cutoff_date<Tz: TimeZone>(now: &DateTime<Tz>, lookback_days: u32) -> NaiveDate {
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(lookback_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Whether an order placed on `order_date` falls inside the window starting at `cutoff`.
pub fn is_within_window(order_date: NaiveDate, cutoff: NaiveDate) -> bool {
    order_date >= cutoff
}

/// Parse the date part of an `orderDate` value (RFC 3339, naive datetime or plain date).
fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Orders as a plain list, or unwrapped from a Relay connection.
fn order_nodes(orders: &Value) -> Option<Vec<&Value>> {
    match orders {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(connection) => match connection.get("edges") {
            Some(Value::Array(edges)) => Some(
                edges
                    .iter()
                    .map(|edge| edge.get("node").unwrap_or(&Value::Null))
                    .collect(),
            ),
            None | Some(Value::Null) => Some(Vec::new()),
            Some(_) => None,
        },
        _ => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Reminder {
    order_id: String,
    email: String,
    order_date: Option<NaiveDate>,
}

fn read_reminder(node: &Value) -> Result<Reminder, &'static str> {
    let order_id = match node.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err("missing order id"),
    };
    let email = node
        .get("customer")
        .and_then(|c| c.get("email"))
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .ok_or("missing customer email")?
        .to_string();
    let order_date = node
        .get("orderDate")
        .and_then(Value::as_str)
        .and_then(parse_order_date);

    Ok(Reminder {
        order_id,
        email,
        order_date,
    })
}

pub struct OrderRemindersJob {
    interval: Duration,
    lookback_days: u32,
}

impl OrderRemindersJob {
    pub fn new(interval: Duration, lookback_days: u32) -> Self {
        Self {
            interval,
            lookback_days,
        }
    }
}

impl JobSpec for OrderRemindersJob {
    fn id(&self) -> &'static str {
        "order_reminders"
    }

    fn name(&self) -> &'static str {
        "Order Reminder Scan"
    }

    fn description(&self) -> &'static str {
        "Record recent orders and their customer emails for reminders"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn stream(&self) -> StreamId {
        StreamId::Reminders
    }

    fn query(&self) -> &QueryDocument {
        &RECENT_ORDERS_QUERY
    }

    fn variables(&self, ctx: &JobContext) -> Variables {
        let since = cutoff_date(&ctx.now, self.lookback_days);
        let mut variables = Variables::new();
        variables.insert(
            "since".to_string(),
            Value::String(since.format("%Y-%m-%d").to_string()),
        );
        variables
    }

    fn interpret(&self, data: &RawResult, ctx: &JobContext) -> Interpretation {
        let cutoff = cutoff_date(&ctx.now, self.lookback_days);
        let mut out = Interpretation::new();

        let nodes = match order_nodes(data.get("orders").unwrap_or(&Value::Null)) {
            Some(nodes) => nodes,
            None => {
                out.warn("Ignoring malformed 'orders' field: expected a list of orders");
                Vec::new()
            }
        };

        let mut reminded = 0usize;
        for (index, node) in nodes.into_iter().enumerate() {
            match read_reminder(node) {
                Ok(reminder) => {
                    if let Some(date) = reminder.order_date {
                        if !is_within_window(date, cutoff) {
                            tracing::debug!(
                                order_id = %reminder.order_id,
                                %date,
                                %cutoff,
                                "Dropping order placed before the cutoff"
                            );
                            continue;
                        }
                    }
                    out.info(format!(
                        "Order ID: {}, Customer Email: {}",
                        reminder.order_id, reminder.email
                    ));
                    reminded += 1;
                }
                Err(reason) => {
                    out.warn(format!("Skipping malformed order at index {}: {}", index, reason));
                }
            }
        }

        out.info(format!("Order reminders processed: {} order(s)", reminded));
        out
    }

    fn failure_message(&self, error: &ApiError) -> String {
        format!("Error fetching orders: {}", error)
    }
}
