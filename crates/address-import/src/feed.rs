//! The external registry feed.

use address_register::EntityKind;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::checkpoint::{Checkpoint, CheckpointRange};
use crate::error::{FeedResult, ImportError, ImportResult};
use crate::record::{ExternalRecord, ExternalStatus};

/// Lazy, finite stream of records for one kind.
pub type RecordStream<'a> = BoxStream<'a, FeedResult<ExternalRecord>>;

/// Client for the authoritative address registry.
///
/// Implementations page and authenticate on their own. A stream cannot be
/// resumed part way, but calling [`AddressFeed::stream`] again with the same
/// range after a failure must be safe.
#[async_trait]
pub trait AddressFeed: Send + Sync {
    /// Newest checkpoint the registry can serve.
    async fn latest_checkpoint(&self) -> FeedResult<Checkpoint>;

    /// Records of `kind` within `range`, optionally restricted to one status.
    ///
    /// With `range.from == None` this is the full state as of `range.to`;
    /// otherwise it is the set of changes after `from` up to and including
    /// `to`.
    fn stream(
        &self,
        kind: EntityKind,
        status: Option<ExternalStatus>,
        range: &CheckpointRange,
    ) -> RecordStream<'_>;

    /// Checkpoint that a full import taken at `at` corresponds to, when the
    /// registry versions its snapshots separately from its change feed.
    async fn snapshot_marker(&self, _at: &Checkpoint) -> FeedResult<Option<Checkpoint>> {
        Ok(None)
    }
}

/// Pull the next record, giving up as soon as `cancel` fires.
pub(crate) async fn next_record(
    stream: &mut RecordStream<'_>,
    cancel: &CancellationToken,
) -> ImportResult<Option<ExternalRecord>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ImportError::Cancelled),
        item = stream.next() => item.transpose().map_err(ImportError::from),
    }
}
