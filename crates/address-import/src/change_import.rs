//! Change import: replay the registry's changes between two checkpoints.

use address_register::{AddressStore, EntityKind};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::apply::{self, Prepared};
use crate::checkpoint::CheckpointRange;
use crate::classifier::{classify, ChangeOperation};
use crate::error::{ImportError, ImportResult};
use crate::feed::{next_record, AddressFeed};
use crate::record::ExternalRecord;
use crate::resolver::ReferenceSnapshot;
use crate::statistics::{ImportStatistics, Outcome};

/// Applies the changes of a checkpoint range, one record at a time, in
/// dependency-safe order.
pub struct ChangeImportEngine {
    feed: Arc<dyn AddressFeed>,
    store: Arc<dyn AddressStore>,
}

impl ChangeImportEngine {
    #[must_use]
    pub fn new(feed: Arc<dyn AddressFeed>, store: Arc<dyn AddressStore>) -> Self {
        Self { feed, store }
    }

    /// Apply every change in `range`.
    ///
    /// Benign and skippable records are counted and logged. Anything else
    /// aborts the run; records applied before the failure stay applied and
    /// are no-ops when the range is replayed.
    #[instrument(skip(self, range, cancel), fields(range = %range))]
    pub async fn run(
        &self,
        range: CheckpointRange,
        cancel: &CancellationToken,
    ) -> ImportResult<ImportStatistics> {
        let started = Instant::now();
        let changes = self.fetch(&range, cancel).await?;
        info!(changes = changes.len(), "Fetched changes");

        let mut snapshot = ReferenceSnapshot::capture(self.store.as_ref());
        let mut statistics = ImportStatistics::new();

        for record in &changes {
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            let outcome = self.apply(record, &mut snapshot).await?;
            statistics.record(record.kind(), outcome);
        }

        statistics.set_duration(started.elapsed());
        info!(
            processed = statistics.processed(),
            inserted = statistics.total(Outcome::Inserted),
            updated = statistics.total(Outcome::Updated),
            deleted = statistics.total(Outcome::Deleted),
            no_op = statistics.total(Outcome::NoOp),
            skipped = statistics.total(Outcome::Skipped),
            rejected = statistics.total(Outcome::Rejected),
            "Change import completed"
        );

        Ok(statistics)
    }

    /// Collect the changes of every kind and order them for replay.
    async fn fetch(
        &self,
        range: &CheckpointRange,
        cancel: &CancellationToken,
    ) -> ImportResult<Vec<ExternalRecord>> {
        let mut changes = Vec::new();

        for kind in EntityKind::ALL {
            let before = changes.len();
            let mut records = self.feed.stream(kind, None, range);
            while let Some(record) = next_record(&mut records, cancel).await? {
                changes.push(record);
            }
            debug!(kind = %kind, count = changes.len() - before, "Fetched changes for kind");
        }

        order_changes(&mut changes);
        Ok(changes)
    }

    async fn apply(
        &self,
        record: &ExternalRecord,
        snapshot: &mut ReferenceSnapshot,
    ) -> ImportResult<Outcome> {
        let store = self.store.as_ref();
        let kind = record.kind();
        let external_id = record.external_id();
        let exists = store.contains(kind, external_id);

        let (prepared, applied) = match classify(kind, exists, record.status()) {
            ChangeOperation::Insert => (
                apply::insert(store, snapshot, record).await?,
                Outcome::Inserted,
            ),
            ChangeOperation::Update => (
                apply::update(store, snapshot, record).await?,
                Outcome::Updated,
            ),
            ChangeOperation::Delete => (apply::delete(store, record).await?, Outcome::Deleted),
            ChangeOperation::Skip => {
                warn!(
                    kind = %kind,
                    external_id,
                    status = %record.status(),
                    "Ignoring tombstone for entity that was never imported"
                );
                return Ok(Outcome::Skipped);
            }
            ChangeOperation::Error(reason) => {
                warn!(kind = %kind, external_id, reason = %reason, "Cannot classify change");
                return Err(ImportError::ambiguous_transition(
                    kind,
                    external_id,
                    exists,
                    record.status(),
                ));
            }
        };

        let entity = match prepared {
            Prepared::Write(entity) => entity,
            Prepared::Settled(outcome) => return Ok(outcome),
        };

        snapshot.add_entity(&entity);
        match store.store(entity).await {
            Ok(()) => {
                debug!(kind = %kind, external_id, outcome = %applied, "Applied change");
                Ok(applied)
            }
            Err(err) if err.is_duplicate() => {
                debug!(kind = %kind, external_id, "Entity already created");
                Ok(Outcome::NoOp)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Stable sort by ordering key. Ties keep fetch order, which is dependency
/// order of the kinds.
pub fn order_changes(changes: &mut [ExternalRecord]) {
    changes.sort_by_key(ExternalRecord::ordering_key);
}
