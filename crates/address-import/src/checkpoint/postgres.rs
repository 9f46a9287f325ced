//! PostgreSQL checkpoint store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use super::{Checkpoint, CheckpointStore};
use crate::config::ImportConfig;
use crate::error::{CheckpointError, CheckpointResult, ImportError, ImportResult};

const SCHEMA: &str = "address_sync";
const LEGACY_SCHEMA: &str = "address_import";
const LEGACY_TABLE: &str = "transaction_store";

/// Checkpoints stored as rows of `address_sync.checkpoint_store`; the row with
/// the highest id is the last completed one.
#[derive(Debug, Clone)]
pub struct PostgresCheckpointStore {
    pool: PgPool,
    enable_migration: bool,
}

impl PostgresCheckpointStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            enable_migration: false,
        }
    }

    /// Store over an existing pool, with migration taken from `config`.
    #[must_use]
    pub fn from_config(pool: PgPool, config: &ImportConfig) -> Self {
        Self::new(pool).with_migration(config.enable_migration)
    }

    /// Connect to `config.database_url`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Configuration` if no database URL is configured,
    /// or a checkpoint error if the connection fails.
    pub async fn connect(config: &ImportConfig) -> ImportResult<Self> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            ImportError::configuration(
                "ADDRESS_IMPORT_DATABASE_URL is required for the checkpoint store",
            )
        })?;
        let pool = PgPool::connect(url).await.map_err(CheckpointError::from)?;
        info!(migration = config.enable_migration, "Connected checkpoint store");
        Ok(Self::from_config(pool, config))
    }

    /// Carry over the newest checkpoint from the legacy
    /// `address_import.transaction_store` table the first time the schema is
    /// created.
    #[must_use]
    pub fn with_migration(mut self, enable: bool) -> Self {
        self.enable_migration = enable;
        self
    }

    async fn table_exists(&self, schema: &str, table: &str) -> CheckpointResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )
            ",
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn legacy_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>> {
        if !self.table_exists(LEGACY_SCHEMA, LEGACY_TABLE).await? {
            return Ok(None);
        }

        let newest: Option<DateTime<Utc>> = sqlx::query_scalar(
            r"
            SELECT created_at FROM address_import.transaction_store
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(newest.map(Checkpoint::Timestamp))
    }
}

#[async_trait]
impl CheckpointStore for PostgresCheckpointStore {
    #[instrument(skip(self))]
    async fn init(&self) -> CheckpointResult<()> {
        if self.table_exists(SCHEMA, "checkpoint_store").await? {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("CREATE SCHEMA IF NOT EXISTS address_sync")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS address_sync.checkpoint_store (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                checkpoint JSONB NOT NULL
            )
            ",
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(schema = SCHEMA, "Created checkpoint store");

        if self.enable_migration {
            if let Some(checkpoint) = self.legacy_checkpoint().await? {
                self.store(checkpoint).await?;
                info!(%checkpoint, "Migrated checkpoint from legacy store");
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn last_completed(&self) -> CheckpointResult<Option<Checkpoint>> {
        let row = sqlx::query_as::<_, CheckpointRow>(
            r"
            SELECT id, created_at, checkpoint
            FROM address_sync.checkpoint_store
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                debug!(id = row.id, stored_at = %row.created_at, "Loaded last checkpoint");
                row.into_checkpoint().map(Some)
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn store(&self, checkpoint: Checkpoint) -> CheckpointResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO address_sync.checkpoint_store (checkpoint)
            VALUES ($1)
            ",
        )
        .bind(serde_json::to_value(checkpoint)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Database row for a stored checkpoint.
#[derive(Debug, sqlx::FromRow)]
struct CheckpointRow {
    id: i64,
    created_at: DateTime<Utc>,
    checkpoint: serde_json::Value,
}

impl CheckpointRow {
    fn into_checkpoint(self) -> CheckpointResult<Checkpoint> {
        Ok(serde_json::from_value(self.checkpoint)?)
    }
}
