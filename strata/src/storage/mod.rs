//! Execution history for the strata migration engine.
//!
//! The history is the only state shared across runs. Executors read it to
//! decide what is already applied and append one record per node outcome.
//!
//! - [`SqliteHistory`]: Persistent SQLite-based storage with connection pooling
//! - [`InMemoryHistory`]: Fast in-memory storage for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use strata::storage::{History, InMemoryHistory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let history = InMemoryHistory::new();
//! history.initialize().await?;
//! # Ok(())
//! # }
//! ```

use crate::core::{EnvironmentId, NodeId};
use async_trait::async_trait;
use std::collections::HashMap;

mod error;
mod record;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod memory;

pub use error::{Result, StorageError};
pub use memory::InMemoryHistory;
pub use record::{ExecutionRecord, ExecutionStatus};

#[cfg(feature = "sqlite")]
pub use sqlite::{PoolConfig, SqliteHistory};

/// Trait for execution history backends.
///
/// Records for one environment are kept in insertion order, which is the
/// recency order every query uses. Implementations must be thread-safe.
///
/// A node is *executed* in an environment when its most recent record,
/// skipped records aside, is a successful forward run. The provided
/// methods encode that rule once; backends only override them to answer
/// faster.
#[async_trait]
pub trait History: Send + Sync {
    /// Prepare the backing store (create tables and so on).
    async fn initialize(&self) -> Result<()>;

    /// Append a record.
    async fn record(&self, record: ExecutionRecord) -> Result<()>;

    /// All records of one node in one environment, oldest first.
    async fn records_for_node(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Vec<ExecutionRecord>>;

    /// All records of one environment, oldest first.
    async fn all_records(&self, environment_id: &EnvironmentId) -> Result<Vec<ExecutionRecord>>;

    /// The newest record of a node, whatever its status.
    async fn find_latest_record(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Option<ExecutionRecord>> {
        Ok(self
            .records_for_node(node_id, environment_id)
            .await?
            .pop())
    }

    /// Whether the node currently counts as applied in the environment.
    async fn was_executed(&self, node_id: &NodeId, environment_id: &EnvironmentId) -> Result<bool> {
        let records = self.records_for_node(node_id, environment_id).await?;
        Ok(latest_outcome(&records).is_some_and(ExecutionRecord::is_applied))
    }

    /// Every node currently applied in the environment, in order of first
    /// appearance in the history.
    async fn executed_nodes(&self, environment_id: &EnvironmentId) -> Result<Vec<NodeId>> {
        let records = self.all_records(environment_id).await?;

        let mut order: Vec<&NodeId> = Vec::new();
        let mut latest: HashMap<&NodeId, &ExecutionRecord> = HashMap::new();
        for record in records.iter().filter(|r| !r.is_skipped()) {
            if latest.insert(record.node_id(), record).is_none() {
                order.push(record.node_id());
            }
        }

        Ok(order
            .into_iter()
            .filter(|id| latest.get(id).is_some_and(|r| r.is_applied()))
            .cloned()
            .collect())
    }
}

/// Newest record that says something about the node's state
pub(crate) fn latest_outcome(records: &[ExecutionRecord]) -> Option<&ExecutionRecord> {
    records.iter().rev().find(|r| !r.is_skipped())
}

// Implement History for Box<dyn History> to allow type-erased storage
#[async_trait]
impl History for Box<dyn History> {
    async fn initialize(&self) -> Result<()> {
        (**self).initialize().await
    }

    async fn record(&self, record: ExecutionRecord) -> Result<()> {
        (**self).record(record).await
    }

    async fn records_for_node(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Vec<ExecutionRecord>> {
        (**self).records_for_node(node_id, environment_id).await
    }

    async fn all_records(&self, environment_id: &EnvironmentId) -> Result<Vec<ExecutionRecord>> {
        (**self).all_records(environment_id).await
    }

    async fn find_latest_record(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Option<ExecutionRecord>> {
        (**self).find_latest_record(node_id, environment_id).await
    }

    async fn was_executed(&self, node_id: &NodeId, environment_id: &EnvironmentId) -> Result<bool> {
        (**self).was_executed(node_id, environment_id).await
    }

    async fn executed_nodes(&self, environment_id: &EnvironmentId) -> Result<Vec<NodeId>> {
        (**self).executed_nodes(environment_id).await
    }
}
