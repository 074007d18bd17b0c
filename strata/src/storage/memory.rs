use super::{error::Result, ExecutionRecord, History};
use crate::core::{EnvironmentId, NodeId};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory history using DashMap for concurrent access.
///
/// Records are kept in one append-only list per environment. Everything is
/// lost when the value is dropped, so this backend suits tests, dry runs,
/// and one-shot tools.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: DashMap<EnvironmentId, Vec<ExecutionRecord>>,
}

impl InMemoryHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all environments.
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl History for InMemoryHistory {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn record(&self, record: ExecutionRecord) -> Result<()> {
        self.records
            .entry(record.environment_id().clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn records_for_node(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Vec<ExecutionRecord>> {
        Ok(self
            .records
            .get(environment_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.node_id() == node_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn all_records(&self, environment_id: &EnvironmentId) -> Result<Vec<ExecutionRecord>> {
        Ok(self
            .records
            .get(environment_id)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }
}
