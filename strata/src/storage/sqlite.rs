use super::{error::Result, error::StorageError, ExecutionRecord, ExecutionStatus, History};
use crate::core::{EnvironmentId, ExecutionDirection, NodeId};
use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Default pool size for SQLite connection pool.
const DEFAULT_POOL_SIZE: u32 = 10;

/// Default connection timeout in seconds.
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

const SELECT_COLUMNS: &str = "id, node_id, environment_id, direction, status, executed_at, \
     description, serialized_undo, duration_ms, error_message";

/// Configuration for the SQLite connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_size: u32,
    /// Minimum number of idle connections to maintain.
    pub min_idle: Option<u32>,
    /// Maximum time to wait for a connection from the pool.
    pub connection_timeout: Duration,
    /// Maximum lifetime of a connection.
    pub max_lifetime: Option<Duration>,
    /// Idle timeout for connections.
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            min_idle: Some(1),
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
            max_lifetime: None,
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
        }
    }
}

/// SQLite-backed history with connection pooling.
///
/// Rows live in a single append-only `migration_history` table. An
/// autoincrement `seq` column gives the insertion order, so recency never
/// depends on clock resolution.
pub struct SqliteHistory {
    pool: SqlitePool,
    db_path: String,
}

impl SqliteHistory {
    /// Opens (or creates) the database at `db_path` with the default pool.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(db_path, PoolConfig::default()).await
    }

    /// Opens (or creates) the database at `db_path` with a custom pool.
    pub async fn with_config(db_path: impl AsRef<Path>, config: PoolConfig) -> Result<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        let connect_options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path_str))
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = Self::build_pool(connect_options, &config).await?;
        let history = Self {
            pool,
            db_path: db_path_str,
        };
        history.initialize().await?;

        info!(path = %history.db_path, "opened sqlite history");
        Ok(history)
    }

    /// Creates a private in-memory database.
    ///
    /// Uses a single connection that is never recycled, since every new
    /// connection to `:memory:` would see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let config = PoolConfig {
            max_size: 1,
            min_idle: Some(1),
            max_lifetime: None,
            idle_timeout: None,
            ..PoolConfig::default()
        };

        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .journal_mode(SqliteJournalMode::Memory)
            .synchronous(SqliteSynchronous::Normal);

        let pool = Self::build_pool(connect_options, &config).await?;
        let history = Self {
            pool,
            db_path: ":memory:".to_string(),
        };
        history.initialize().await?;

        Ok(history)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn build_pool(
        connect_options: SqliteConnectOptions,
        config: &PoolConfig,
    ) -> Result<Pool<Sqlite>> {
        let mut builder = SqlitePoolOptions::new()
            .max_connections(config.max_size)
            .acquire_timeout(config.connection_timeout)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout);

        if let Some(min_idle) = config.min_idle {
            builder = builder.min_connections(min_idle);
        }

        builder
            .connect_with(connect_options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn row_to_record(row: &SqliteRow) -> Result<ExecutionRecord> {
        let id_str: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id_str).map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let node_id = NodeId::new(row.try_get::<String, _>("node_id")?)?;
        let environment_id = EnvironmentId::new(row.try_get::<String, _>("environment_id")?)?;

        let direction_str: String = row.try_get("direction")?;
        let direction = ExecutionDirection::from_str(&direction_str)?;
        let status_str: String = row.try_get("status")?;
        let status = ExecutionStatus::from_str(&status_str)?;

        let executed_at_millis: i64 = row.try_get("executed_at")?;
        let executed_at = chrono::DateTime::from_timestamp_millis(executed_at_millis)
            .ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "executed_at {executed_at_millis} is out of range for record {id}"
                ))
            })?;

        let description: String = row.try_get("description")?;
        let serialized_undo: Option<String> = row.try_get("serialized_undo")?;
        let duration_ms: i64 = row.try_get("duration_ms")?;
        let duration_ms = u64::try_from(duration_ms).map_err(|_| {
            StorageError::Corrupt(format!(
                "negative duration_ms {duration_ms} for record {id}"
            ))
        })?;
        let error_message: Option<String> = row.try_get("error_message")?;

        Ok(ExecutionRecord::new(
            id,
            node_id,
            environment_id,
            direction,
            status,
            executed_at,
            description,
            serialized_undo,
            duration_ms,
            error_message,
        ))
    }
}

#[async_trait]
impl History for SqliteHistory {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS migration_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                node_id TEXT NOT NULL,
                environment_id TEXT NOT NULL,
                direction TEXT CHECK( direction IN ('UP','DOWN') ) NOT NULL,
                status TEXT CHECK( status IN ('SUCCESS','FAILURE','SKIPPED') ) NOT NULL,
                executed_at INTEGER NOT NULL,
                description TEXT NOT NULL,
                serialized_undo TEXT,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                error_message TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        // Lookups are always scoped to one environment, usually one node
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_migration_history_node
             ON migration_history(environment_id, node_id, seq)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record(&self, record: ExecutionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO migration_history (
                id, node_id, environment_id, direction, status, executed_at,
                description, serialized_undo, duration_ms, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id().to_string())
        .bind(record.node_id().as_str())
        .bind(record.environment_id().as_str())
        .bind(record.direction().as_str())
        .bind(record.status().as_str())
        .bind(record.executed_at().timestamp_millis())
        .bind(record.description())
        .bind(record.serialized_undo())
        .bind(i64::try_from(record.duration_ms()).unwrap_or(i64::MAX))
        .bind(record.error_message())
        .execute(&self.pool)
        .await?;

        debug!(
            node = %record.node_id(),
            environment = %record.environment_id(),
            direction = %record.direction(),
            status = record.status().as_str(),
            "recorded execution"
        );
        Ok(())
    }

    async fn records_for_node(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM migration_history
             WHERE environment_id = ? AND node_id = ?
             ORDER BY seq ASC"
        ))
        .bind(environment_id.as_str())
        .bind(node_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn all_records(&self, environment_id: &EnvironmentId) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM migration_history
             WHERE environment_id = ?
             ORDER BY seq ASC"
        ))
        .bind(environment_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn find_latest_record(
        &self,
        node_id: &NodeId,
        environment_id: &EnvironmentId,
    ) -> Result<Option<ExecutionRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM migration_history
             WHERE environment_id = ? AND node_id = ?
             ORDER BY seq DESC LIMIT 1"
        ))
        .bind(environment_id.as_str())
        .bind(node_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}
