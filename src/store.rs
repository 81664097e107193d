//! Persistence collaborators
//!
//! Customer override status and refresh statistics live outside the engine.
//! The traits here are the boundary; the in-memory implementations back the
//! batch binary and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Operator override applied to a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerBlockStatus {
    /// Block the customer regardless of match results
    Unsafe,
    /// Allow the customer regardless of match results
    Exception,
}

/// A customer's override, written by one operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStatus {
    /// Operator who set the status
    pub user_id: String,
    pub note: String,
    pub status: CustomerBlockStatus,
    pub created_at: DateTime<Utc>,
}

/// Record counts from one successful refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStats {
    #[serde(rename = "SDNs")]
    pub entities: usize,
    pub alt_names: usize,
    pub addresses: usize,
    pub denied_persons: usize,
    pub screening_list: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CustomerStatusStore: Send + Sync {
    /// The customer's one current status, if any
    async fn get(&self, customer_id: &str) -> Result<Option<CustomerStatus>, StoreError>;

    /// Write a status. It becomes current; earlier rows are retired.
    async fn upsert(&self, customer_id: &str, status: CustomerStatus) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DownloadStatsStore: Send + Sync {
    async fn record(&self, stats: DownloadStats) -> Result<(), StoreError>;

    /// Most recently recorded stats
    async fn latest(&self) -> Result<Option<DownloadStats>, StoreError>;
}

#[derive(Debug, Clone)]
struct StatusRow {
    status: CustomerStatus,
    retired: bool,
}

/// Customer statuses held in process memory
#[derive(Debug, Default)]
pub struct InMemoryCustomerStatusStore {
    /// customer ID -> rows, one per operator
    rows: RwLock<HashMap<String, Vec<StatusRow>>>,
}

impl InMemoryCustomerStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row for a customer, retired ones included
    pub async fn history(&self, customer_id: &str) -> Vec<(CustomerStatus, bool)> {
        self.rows
            .read()
            .await
            .get(customer_id)
            .map(|rows| {
                rows.iter()
                    .map(|r| (r.status.clone(), r.retired))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl CustomerStatusStore for InMemoryCustomerStatusStore {
    async fn get(&self, customer_id: &str) -> Result<Option<CustomerStatus>, StoreError> {
        if customer_id.is_empty() {
            return Err(StoreError::MissingCustomerId);
        }
        let rows = self.rows.read().await;
        Ok(rows
            .get(customer_id)
            .and_then(|rows| rows.iter().find(|r| !r.retired))
            .map(|r| r.status.clone()))
    }

    async fn upsert(&self, customer_id: &str, status: CustomerStatus) -> Result<(), StoreError> {
        if customer_id.is_empty() {
            return Err(StoreError::MissingCustomerId);
        }
        if status.user_id.is_empty() {
            return Err(StoreError::MissingOperatorId);
        }

        let mut all = self.rows.write().await;
        let rows = all.entry(customer_id.to_string()).or_default();
        for row in rows.iter_mut() {
            row.retired = true;
        }

        match rows
            .iter_mut()
            .find(|r| r.status.user_id == status.user_id)
        {
            Some(row) => {
                row.status = status;
                row.retired = false;
            }
            None => rows.push(StatusRow {
                status,
                retired: false,
            }),
        }

        tracing::debug!(customer_id, "customer status updated");
        Ok(())
    }
}

/// Download stats held in process memory, newest last
#[derive(Debug, Default)]
pub struct InMemoryDownloadStatsStore {
    history: RwLock<Vec<DownloadStats>>,
}

impl InMemoryDownloadStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DownloadStatsStore for InMemoryDownloadStatsStore {
    async fn record(&self, stats: DownloadStats) -> Result<(), StoreError> {
        self.history.write().await.push(stats);
        Ok(())
    }

    async fn latest(&self) -> Result<Option<DownloadStats>, StoreError> {
        Ok(self.history.read().await.last().cloned())
    }
}
