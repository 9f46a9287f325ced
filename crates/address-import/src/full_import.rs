//! Full import: bootstrap the register from a snapshot of the registry.

use address_register::{AddressEntity, AddressStore, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::apply::{self, Prepared};
use crate::checkpoint::{Checkpoint, CheckpointRange};
use crate::classifier::{classify, ChangeOperation};
use crate::error::{FeedError, ImportError, ImportResult};
use crate::feed::{next_record, AddressFeed};
use crate::record::ExternalStatus;
use crate::resolver::ReferenceSnapshot;
use crate::statistics::{ImportStatistics, Outcome};

/// Status partitions requested from the feed per kind. `None` means
/// unfiltered.
#[must_use]
pub fn partitions(kind: EntityKind) -> &'static [Option<ExternalStatus>] {
    match kind {
        EntityKind::PostCode => &[None],
        EntityKind::Road => &[Some(ExternalStatus::Effective), Some(ExternalStatus::Temporary)],
        EntityKind::AccessAddress | EntityKind::UnitAddress => {
            &[Some(ExternalStatus::Active), Some(ExternalStatus::Pending)]
        }
    }
}

/// Result of a full import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullImportSummary {
    pub statistics: ImportStatistics,
    /// Snapshot marker reported by the feed, if any.
    pub checkpoint: Option<Checkpoint>,
}

impl FullImportSummary {
    /// Entities created for `kind`.
    #[must_use]
    pub fn created(&self, kind: EntityKind) -> u64 {
        self.statistics.counts(kind).inserted
    }
}

/// Streams the full registry state into the register, kind by kind.
pub struct FullImportEngine {
    feed: Arc<dyn AddressFeed>,
    store: Arc<dyn AddressStore>,
    batch_size: usize,
}

impl FullImportEngine {
    #[must_use]
    pub fn new(feed: Arc<dyn AddressFeed>, store: Arc<dyn AddressStore>, batch_size: usize) -> Self {
        Self {
            feed,
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Import everything as of `checkpoint`.
    ///
    /// Aborts on the first error that is not a skippable data-quality issue.
    /// Batches already written stay written; a rerun skips them by external
    /// id.
    #[instrument(skip(self, cancel))]
    pub async fn run(
        &self,
        checkpoint: Checkpoint,
        cancel: &CancellationToken,
    ) -> ImportResult<FullImportSummary> {
        let started = Instant::now();
        let range = CheckpointRange::full(checkpoint);
        let mut statistics = ImportStatistics::new();

        for kind in EntityKind::ALL {
            self.import_kind(kind, &range, &mut statistics, cancel)
                .await?;
            let counts = statistics.counts(kind);
            info!(
                kind = %kind,
                created = counts.inserted,
                skipped = counts.skipped,
                "Finished importing kind"
            );
        }

        let marker = self.feed.snapshot_marker(&checkpoint).await?;
        statistics.set_duration(started.elapsed());

        info!(
            created = statistics.total(Outcome::Inserted),
            duration_ms = statistics.duration_ms,
            "Full import completed"
        );

        Ok(FullImportSummary {
            statistics,
            checkpoint: marker,
        })
    }

    async fn import_kind(
        &self,
        kind: EntityKind,
        range: &CheckpointRange,
        statistics: &mut ImportStatistics,
        cancel: &CancellationToken,
    ) -> ImportResult<()> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut buffer: Vec<AddressEntity> = Vec::with_capacity(self.batch_size);

        for status in partitions(kind) {
            let snapshot = ReferenceSnapshot::capture(self.store.as_ref());
            let mut records = self.feed.stream(kind, *status, range);

            while let Some(record) = next_record(&mut records, cancel).await? {
                if record.kind() != kind {
                    return Err(FeedError::malformed(
                        kind,
                        format!("received {} record in {kind} stream", record.kind()),
                    )
                    .into());
                }

                let external_id = record.external_id();
                if !seen.insert(external_id.to_string())
                    || self.store.contains(kind, external_id)
                {
                    debug!(kind = %kind, external_id, "Already imported, skipping");
                    statistics.record(kind, Outcome::NoOp);
                    continue;
                }

                match classify(kind, false, record.status()) {
                    ChangeOperation::Insert => {}
                    ChangeOperation::Skip => {
                        debug!(
                            kind = %kind,
                            external_id,
                            status = %record.status(),
                            "Skipping terminal record during full import"
                        );
                        statistics.record(kind, Outcome::Skipped);
                        continue;
                    }
                    _ => {
                        return Err(ImportError::ambiguous_transition(
                            kind,
                            external_id,
                            false,
                            record.status(),
                        ));
                    }
                }

                match apply::insert(self.store.as_ref(), &snapshot, &record).await? {
                    Prepared::Write(entity) => buffer.push(entity),
                    Prepared::Settled(outcome) => statistics.record(kind, outcome),
                }

                if buffer.len() >= self.batch_size {
                    self.flush(kind, &mut buffer, statistics).await?;
                }
            }
        }

        self.flush(kind, &mut buffer, statistics).await
    }

    async fn flush(
        &self,
        kind: EntityKind,
        buffer: &mut Vec<AddressEntity>,
        statistics: &mut ImportStatistics,
    ) -> ImportResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let submitted = buffer.len();
        let written = self.store.store_many(std::mem::take(buffer)).await?;
        statistics.add(kind, Outcome::Inserted, written as u64);

        if written < submitted {
            warn!(
                kind = %kind,
                submitted,
                written,
                "Store skipped duplicates in batch"
            );
            statistics.add(kind, Outcome::NoOp, (submitted - written) as u64);
        }

        debug!(kind = %kind, written, "Flushed batch");
        Ok(())
    }
}
