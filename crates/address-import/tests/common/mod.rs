//! Shared fixtures for the import integration tests.

#![allow(dead_code)]

use address_import::{
    AccessAddressRecord, AddressFeed, Checkpoint, CheckpointRange, ExternalRecord, ExternalStatus,
    FeedError, FeedResult, PostCodeRecord, RecordStream, RoadRecord, UnitAddressRecord,
};
use address_register::{
    AccessAddress, AccessAddressId, AddressEntity, AddressStore, EntityIndex, EntityKind,
    InMemoryAddressStore, PostCode, PostCodeId, Road, RoadId, StoreError, StoreResult,
    UnitAddress, UnitAddressId,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use address_import::logging::init_test_logging;

/// Feed serving a fixed set of records, each tagged with the checkpoint that
/// published it.
///
/// Full-state requests return every record published at or before `to`.
/// Change requests return the records published within `(from, to]`.
pub struct MockFeed {
    latest: Mutex<Checkpoint>,
    records: Mutex<Vec<(Checkpoint, ExternalRecord)>>,
    marker: Option<Checkpoint>,
    fail_at: Mutex<Option<Checkpoint>>,
    stream_calls: AtomicUsize,
    requested: Mutex<Vec<(EntityKind, Option<ExternalStatus>, CheckpointRange)>>,
}

impl MockFeed {
    pub fn new(latest: Checkpoint) -> Self {
        Self {
            latest: Mutex::new(latest),
            records: Mutex::new(Vec::new()),
            marker: None,
            fail_at: Mutex::new(None),
            stream_calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_marker(mut self, marker: Checkpoint) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn with_record(self, at: Checkpoint, record: impl Into<ExternalRecord>) -> Self {
        self.publish(at, record);
        self
    }

    pub fn publish(&self, at: Checkpoint, record: impl Into<ExternalRecord>) {
        self.records.lock().unwrap().push((at, record.into()));
    }

    pub fn set_latest(&self, latest: Checkpoint) {
        *self.latest.lock().unwrap() = latest;
    }

    /// Make every stream whose range covers `at` fail.
    pub fn fail_at(&self, at: Option<Checkpoint>) {
        *self.fail_at.lock().unwrap() = at;
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<(EntityKind, Option<ExternalStatus>, CheckpointRange)> {
        self.requested.lock().unwrap().clone()
    }

    fn covers(range: &CheckpointRange, at: &Checkpoint) -> bool {
        if range.is_full() {
            *at <= range.to
        } else {
            range.contains(at)
        }
    }
}

#[async_trait]
impl AddressFeed for MockFeed {
    async fn latest_checkpoint(&self) -> FeedResult<Checkpoint> {
        Ok(*self.latest.lock().unwrap())
    }

    fn stream(
        &self,
        kind: EntityKind,
        status: Option<ExternalStatus>,
        range: &CheckpointRange,
    ) -> RecordStream<'_> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push((kind, status, *range));

        if let Some(at) = *self.fail_at.lock().unwrap() {
            if Self::covers(range, &at) {
                return stream::iter(vec![Err(FeedError::request(format!(
                    "registry unavailable at {at}"
                )))])
                .boxed();
            }
        }

        let items: Vec<FeedResult<ExternalRecord>> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(at, record)| {
                record.kind() == kind
                    && status.map_or(true, |s| record.status() == s)
                    && Self::covers(range, at)
            })
            .map(|(_, record)| Ok(record.clone()))
            .collect();

        stream::iter(items).boxed()
    }

    async fn snapshot_marker(&self, _at: &Checkpoint) -> FeedResult<Option<Checkpoint>> {
        Ok(self.marker)
    }
}

/// Store wrapper that can lose aggregates or refuse writes.
pub struct FailingStore {
    inner: Arc<InMemoryAddressStore>,
    lose_loads: AtomicBool,
    refuse_writes: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: Arc<InMemoryAddressStore>) -> Self {
        Self {
            inner,
            lose_loads: AtomicBool::new(false),
            refuse_writes: AtomicBool::new(false),
        }
    }

    /// Every load reports the aggregate as missing while the index keeps it.
    pub fn lose_loads(&self) {
        self.lose_loads.store(true, Ordering::SeqCst);
    }

    pub fn refuse_writes(&self) {
        self.refuse_writes.store(true, Ordering::SeqCst);
    }

    fn lost(&self) -> bool {
        self.lose_loads.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("writes refused"));
        }
        Ok(())
    }
}

impl EntityIndex for FailingStore {
    fn post_code_id(&self, number: &str) -> Option<PostCodeId> {
        self.inner.post_code_id(number)
    }

    fn road_id(&self, external_id: &str) -> Option<RoadId> {
        self.inner.road_id(external_id)
    }

    fn access_address_id(&self, external_id: &str) -> Option<AccessAddressId> {
        self.inner.access_address_id(external_id)
    }

    fn unit_address_id(&self, external_id: &str) -> Option<UnitAddressId> {
        self.inner.unit_address_id(external_id)
    }

    fn post_code_ids(&self) -> HashSet<PostCodeId> {
        self.inner.post_code_ids()
    }

    fn road_ids(&self) -> HashSet<RoadId> {
        self.inner.road_ids()
    }

    fn access_address_ids(&self) -> HashSet<AccessAddressId> {
        self.inner.access_address_ids()
    }
}

#[async_trait]
impl AddressStore for FailingStore {
    async fn load_post_code(&self, id: PostCodeId) -> StoreResult<Option<PostCode>> {
        if self.lost() {
            return Ok(None);
        }
        self.inner.load_post_code(id).await
    }

    async fn load_road(&self, id: RoadId) -> StoreResult<Option<Road>> {
        if self.lost() {
            return Ok(None);
        }
        self.inner.load_road(id).await
    }

    async fn load_access_address(
        &self,
        id: AccessAddressId,
    ) -> StoreResult<Option<AccessAddress>> {
        if self.lost() {
            return Ok(None);
        }
        self.inner.load_access_address(id).await
    }

    async fn load_unit_address(&self, id: UnitAddressId) -> StoreResult<Option<UnitAddress>> {
        if self.lost() {
            return Ok(None);
        }
        self.inner.load_unit_address(id).await
    }

    async fn store(&self, entity: AddressEntity) -> StoreResult<()> {
        self.check_writable()?;
        self.inner.store(entity).await
    }

    async fn store_many(&self, entities: Vec<AddressEntity>) -> StoreResult<usize> {
        self.check_writable()?;
        self.inner.store_many(entities).await
    }

    async fn rehydrate_index(&self) -> StoreResult<()> {
        self.inner.rehydrate_index().await
    }
}

pub fn tx(n: u64) -> Checkpoint {
    Checkpoint::Transaction(n)
}

/// Fixed base time plus `seconds`.
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
}

pub fn post_code(number: &str, name: &str, status: ExternalStatus) -> PostCodeRecord {
    PostCodeRecord {
        number: number.to_string(),
        name: name.to_string(),
        status,
        created: Some(at(0)),
        updated: Some(at(0)),
    }
}

pub fn road(id: &str, name: &str, status: ExternalStatus, updated: i64) -> RoadRecord {
    RoadRecord {
        id: id.to_string(),
        name: name.to_string(),
        status,
        created: at(0),
        updated: at(updated),
        sequence: None,
    }
}

pub fn access_address(
    id: &str,
    road_id: &str,
    post_code: &str,
    status: ExternalStatus,
    updated: i64,
) -> AccessAddressRecord {
    AccessAddressRecord {
        id: id.to_string(),
        municipal_code: "0751".to_string(),
        status,
        road_code: "1234".to_string(),
        house_number: "12".to_string(),
        post_code_number: post_code.to_string(),
        road_id: road_id.to_string(),
        east_coordinate: 575_000.0,
        north_coordinate: 6_224_000.0,
        supplementary_town_name: None,
        plot_id: None,
        created: at(0),
        updated: at(updated),
        sequence: None,
    }
}

pub fn unit_address(
    id: &str,
    access_address_id: &str,
    status: ExternalStatus,
    updated: i64,
) -> UnitAddressRecord {
    UnitAddressRecord {
        id: id.to_string(),
        access_address_id: access_address_id.to_string(),
        status,
        floor_name: Some("1".to_string()),
        suite_name: Some("tv".to_string()),
        created: at(0),
        updated: at(updated),
        sequence: None,
    }
}
