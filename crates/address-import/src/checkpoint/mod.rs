//! Checkpoints: how far the register has been synchronized.
//!
//! A checkpoint is written only after every change up to it has been
//! applied, so the last stored checkpoint is always safe to resume from.

mod memory;
mod postgres;

pub use memory::InMemoryCheckpointStore;
pub use postgres::PostgresCheckpointStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::CheckpointResult;

/// A position in the registry's history.
///
/// Registries either version by wall-clock time or by transaction number.
/// Values of one variant are totally ordered; a deployment only ever sees one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Checkpoint {
    Timestamp(DateTime<Utc>),
    Transaction(u64),
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Checkpoint::Timestamp(at) => write!(f, "timestamp:{}", at.to_rfc3339()),
            Checkpoint::Transaction(id) => write!(f, "transaction:{id}"),
        }
    }
}

/// Range of history to import: after `from` up to and including `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRange {
    /// `None` requests the complete state as of `to`.
    pub from: Option<Checkpoint>,
    pub to: Checkpoint,
}

impl CheckpointRange {
    /// Everything up to `to`.
    #[must_use]
    pub fn full(to: Checkpoint) -> Self {
        Self { from: None, to }
    }

    /// Changes after `from` up to `to`.
    #[must_use]
    pub fn between(from: Checkpoint, to: Checkpoint) -> Self {
        Self {
            from: Some(from),
            to,
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.from.is_none()
    }

    /// Whether `checkpoint` falls inside the range.
    #[must_use]
    pub fn contains(&self, checkpoint: &Checkpoint) -> bool {
        self.from.map_or(true, |from| *checkpoint > from) && *checkpoint <= self.to
    }
}

impl Display for CheckpointRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.from {
            Some(from) => write!(f, "({from}, {}]", self.to),
            None => write!(f, "(.., {}]", self.to),
        }
    }
}

/// Durable record of completed checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Prepare the backing storage. Safe to call on every start.
    async fn init(&self) -> CheckpointResult<()>;

    /// The most recently stored checkpoint.
    async fn last_completed(&self) -> CheckpointResult<Option<Checkpoint>>;

    /// Record `checkpoint` as completed. Returns `false` if nothing was
    /// written.
    async fn store(&self, checkpoint: Checkpoint) -> CheckpointResult<bool>;

    /// Every discrete checkpoint after `from` up to and including `to`, in
    /// order. `None` when the store cannot enumerate them.
    async fn list_between(
        &self,
        _from: &Checkpoint,
        _to: &Checkpoint,
    ) -> CheckpointResult<Option<Vec<Checkpoint>>> {
        Ok(None)
    }
}
