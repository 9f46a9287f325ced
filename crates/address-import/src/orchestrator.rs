//! Top-level import control loop.
//!
//! One call to [`ImportOrchestrator::run`] brings the register up to the
//! registry's newest checkpoint:
//!
//! - no stored checkpoint: full import, then store the checkpoint it reached;
//! - stored checkpoint behind the feed: replay the changes, storing progress
//!   per checkpoint or once for the whole range;
//! - stored checkpoint equal to the feed's newest: nothing to do.

use address_register::AddressStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::change_import::ChangeImportEngine;
use crate::checkpoint::{Checkpoint, CheckpointRange, CheckpointStore};
use crate::config::{CheckpointMode, ImportConfig};
use crate::error::{ImportError, ImportResult};
use crate::feed::AddressFeed;
use crate::full_import::FullImportEngine;
use crate::statistics::ImportStatistics;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The register was bootstrapped from a snapshot.
    FullImport {
        checkpoint: Checkpoint,
        statistics: ImportStatistics,
    },
    /// Changes after `from` were replayed up to `to`.
    ChangeImport {
        from: Checkpoint,
        to: Checkpoint,
        checkpoints_stored: usize,
        statistics: ImportStatistics,
    },
    /// The register was already at the newest checkpoint.
    UpToDate { checkpoint: Checkpoint },
}

impl RunOutcome {
    /// Checkpoint the register is at after the run.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        match self {
            RunOutcome::FullImport { checkpoint, .. } | RunOutcome::UpToDate { checkpoint } => {
                *checkpoint
            }
            RunOutcome::ChangeImport { to, .. } => *to,
        }
    }
}

/// Chooses between full and change import and owns the checkpoint lifecycle.
pub struct ImportOrchestrator {
    config: ImportConfig,
    feed: Arc<dyn AddressFeed>,
    store: Arc<dyn AddressStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    full_import: FullImportEngine,
    change_import: ChangeImportEngine,
}

impl ImportOrchestrator {
    /// Create an orchestrator. Fails if `config` does not validate.
    pub fn new(
        config: ImportConfig,
        feed: Arc<dyn AddressFeed>,
        store: Arc<dyn AddressStore>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> ImportResult<Self> {
        config
            .validate()
            .map_err(|e| ImportError::configuration(e.to_string()))?;

        let full_import = FullImportEngine::new(feed.clone(), store.clone(), config.batch_size);
        let change_import = ChangeImportEngine::new(feed.clone(), store.clone());

        Ok(Self {
            config,
            feed,
            store,
            checkpoints,
            full_import,
            change_import,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Bring the register up to date.
    ///
    /// A checkpoint is stored only after everything up to it was applied. On
    /// error or cancellation the last stored checkpoint is left untouched, so
    /// the next run resumes from there.
    #[instrument(skip_all, fields(mode = %self.config.checkpoint_mode))]
    pub async fn run(&self, cancel: &CancellationToken) -> ImportResult<RunOutcome> {
        self.checkpoints.init().await?;
        // Entities written by an interrupted run are in the log but not yet
        // behind a checkpoint.
        self.store.rehydrate_index().await?;

        match self.checkpoints.last_completed().await? {
            None => self.bootstrap(cancel).await,
            Some(last) => self.catch_up(last, cancel).await,
        }
    }

    async fn bootstrap(&self, cancel: &CancellationToken) -> ImportResult<RunOutcome> {
        let newest = self.feed.latest_checkpoint().await?;
        info!(checkpoint = %newest, "No completed checkpoint, starting full import");

        let summary = self.full_import.run(newest, cancel).await?;
        let checkpoint = summary.checkpoint.unwrap_or(newest);
        self.commit(checkpoint).await?;

        Ok(RunOutcome::FullImport {
            checkpoint,
            statistics: summary.statistics,
        })
    }

    async fn catch_up(&self, last: Checkpoint, cancel: &CancellationToken) -> ImportResult<RunOutcome> {
        let newest = self.feed.latest_checkpoint().await?;
        if newest <= last {
            if newest < last {
                warn!(
                    last = %last,
                    newest = %newest,
                    "Feed reports a checkpoint older than the last completed one"
                );
            }
            info!(checkpoint = %last, "Register is up to date");
            return Ok(RunOutcome::UpToDate { checkpoint: last });
        }

        if self.config.checkpoint_mode == CheckpointMode::Granular {
            match self.checkpoints.list_between(&last, &newest).await? {
                Some(mut units) => {
                    if units.last().map_or(true, |unit| *unit < newest) {
                        debug!(
                            listed = units.len(),
                            newest = %newest,
                            "Listed checkpoints stop short of the feed, adding final unit"
                        );
                        units.push(newest);
                    }
                    return self.catch_up_granular(last, units, cancel).await;
                }
                None => warn!("Checkpoint store cannot enumerate checkpoints, using range mode"),
            }
        }

        info!(from = %last, to = %newest, "Importing changes");
        let statistics = self
            .change_import
            .run(CheckpointRange::between(last, newest), cancel)
            .await?;
        self.commit(newest).await?;

        Ok(RunOutcome::ChangeImport {
            from: last,
            to: newest,
            checkpoints_stored: 1,
            statistics,
        })
    }

    async fn catch_up_granular(
        &self,
        last: Checkpoint,
        units: Vec<Checkpoint>,
        cancel: &CancellationToken,
    ) -> ImportResult<RunOutcome> {
        info!(from = %last, pending = units.len(), "Importing changes per checkpoint");

        let mut previous = last;
        let mut statistics = ImportStatistics::new();
        let mut stored = 0;

        for unit in units {
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            let unit_statistics = self
                .change_import
                .run(CheckpointRange::between(previous, unit), cancel)
                .await?;
            self.commit(unit).await?;

            statistics.merge(&unit_statistics);
            stored += 1;
            previous = unit;
        }

        Ok(RunOutcome::ChangeImport {
            from: last,
            to: previous,
            checkpoints_stored: stored,
            statistics,
        })
    }

    async fn commit(&self, checkpoint: Checkpoint) -> ImportResult<()> {
        if !self.checkpoints.store(checkpoint).await? {
            return Err(ImportError::CheckpointNotStored { checkpoint });
        }
        info!(checkpoint = %checkpoint, "Stored checkpoint");
        Ok(())
    }
}
