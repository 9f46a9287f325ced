//! In-memory checkpoint store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{Checkpoint, CheckpointStore};
use crate::error::CheckpointResult;

/// Checkpoint store held in process memory.
///
/// Optionally knows the discrete checkpoints the registry has published, which
/// enables granular catch-up.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    stored: RwLock<Vec<Checkpoint>>,
    published: Option<Vec<Checkpoint>>,
    reject_stores: bool,
    init_calls: AtomicUsize,
}

impl InMemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously completed checkpoint.
    #[must_use]
    pub fn with_completed(checkpoint: Checkpoint) -> Self {
        Self {
            stored: RwLock::new(vec![checkpoint]),
            ..Self::default()
        }
    }

    /// Publish the discrete checkpoints `list_between` may return.
    #[must_use]
    pub fn with_published(mut self, mut checkpoints: Vec<Checkpoint>) -> Self {
        checkpoints.sort();
        checkpoints.dedup();
        self.published = Some(checkpoints);
        self
    }

    /// Make every `store` call report that nothing was written.
    #[must_use]
    pub fn rejecting_stores(mut self) -> Self {
        self.reject_stores = true;
        self
    }

    /// Every stored checkpoint, oldest first.
    pub async fn stored(&self) -> Vec<Checkpoint> {
        self.stored.read().await.clone()
    }

    /// Number of `init` calls.
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn init(&self) -> CheckpointResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn last_completed(&self) -> CheckpointResult<Option<Checkpoint>> {
        Ok(self.stored.read().await.last().copied())
    }

    async fn store(&self, checkpoint: Checkpoint) -> CheckpointResult<bool> {
        if self.reject_stores {
            return Ok(false);
        }
        self.stored.write().await.push(checkpoint);
        Ok(true)
    }

    async fn list_between(
        &self,
        from: &Checkpoint,
        to: &Checkpoint,
    ) -> CheckpointResult<Option<Vec<Checkpoint>>> {
        Ok(self.published.as_ref().map(|published| {
            published
                .iter()
                .filter(|c| *c > from && *c <= to)
                .copied()
                .collect()
        }))
    }
}
