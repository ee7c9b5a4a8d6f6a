//! Low-stock restock job.
//!
//! Runs the `updateLowStockProducts` mutation, which raises every product
//! below the stock threshold by a fixed amount, and records the summary
//! followed by one line per restocked product.

use crate::append_log::StreamId;
use crate::background_jobs::{
    context::JobContext,
    job::{decode_field, Interpretation, JobSpec},
};
use crate::graphql::{ApiError, QueryDocument, RawResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

const RESTOCK_MUTATION: QueryDocument = QueryDocument::new(
    r#"mutation {
  updateLowStockProducts {
    updatedProducts {
      name
      stock
    }
    success
  }
}"#,
);

/// Threshold and replenishment constants of the restock policy.
///
/// The server restocks every product strictly below `threshold` by adding
/// `amount` once. Stock never goes negative, so a product it reports as
/// restocked holds at least `amount`. With `amount >= threshold` a restocked
/// product is no longer low and a second run leaves it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockPolicy {
    pub threshold: i64,
    pub amount: i64,
}

impl RestockPolicy {
    pub fn new(threshold: i64, amount: i64) -> Self {
        Self { threshold, amount }
    }

    pub fn is_low(&self, stock: i64) -> bool {
        stock < self.threshold
    }

    /// Whether `new_stock` can be the level of a product that was just restocked.
    pub fn is_plausible_restock(&self, new_stock: i64) -> bool {
        new_stock >= self.amount
    }
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockPayload {
    #[serde(default)]
    updated_products: Option<Vec<Value>>,
    #[serde(default)]
    success: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatedProduct {
    name: String,
    stock: i64,
}

pub struct LowStockRestockJob {
    interval: Duration,
    policy: RestockPolicy,
}

impl LowStockRestockJob {
    pub fn new(interval: Duration, policy: RestockPolicy) -> Self {
        Self { interval, policy }
    }
}

impl JobSpec for LowStockRestockJob {
    fn id(&self) -> &'static str {
        "low_stock_restock"
    }

    fn name(&self) -> &'static str {
        "Low Stock Restock"
    }

    fn description(&self) -> &'static str {
        "Restock products below the stock threshold and record the updated levels"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn stream(&self) -> StreamId {
        StreamId::Stock
    }

    fn query(&self) -> &QueryDocument {
        &RESTOCK_MUTATION
    }

    fn interpret(&self, data: &RawResult, _ctx: &JobContext) -> Interpretation {
        let mut anomalies = Interpretation::new();
        let payload: RestockPayload = decode_field(data, "updateLowStockProducts", &mut anomalies);
        if let Some(server_message) = &payload.success {
            tracing::debug!(job = self.id(), "Server reported: {}", server_message);
        }

        let mut seen = HashSet::new();
        let mut products = Vec::new();
        for (index, raw) in payload.updated_products.unwrap_or_default().iter().enumerate() {
            match UpdatedProduct::deserialize(raw) {
                Ok(product) if !seen.insert(product.name.clone()) => {
                    anomalies.warn(format!(
                        "Skipping duplicate entry for product {}",
                        product.name
                    ));
                }
                Ok(product) => products.push(product),
                Err(e) => {
                    anomalies.warn(format!("Skipping malformed product at index {}: {}", index, e));
                }
            }
        }

        let mut out = Interpretation::new();
        if products.is_empty() {
            out.info("No low-stock products found");
        } else {
            out.info(format!("{} product(s) restocked", products.len()));
        }
        for product in &products {
            out.info(format!(
                "Product: {}, New Stock: {}",
                product.name, product.stock
            ));
            if !self.policy.is_plausible_restock(product.stock) {
                out.warn(format!(
                    "Product {} reports stock {}, less than the restock amount of {}",
                    product.name, product.stock, self.policy.amount
                ));
            } else if self.policy.is_low(product.stock) {
                out.warn(format!(
                    "Product {} is still below the threshold of {} after restocking",
                    product.name, self.policy.threshold
                ));
            }
        }

        let (entries, _) = anomalies.into_parts();
        for entry in entries {
            out.warn(entry.message);
        }
        out
    }

    fn failure_message(&self, error: &ApiError) -> String {
        format!("Low-stock update failed: {}", error)
    }
}
