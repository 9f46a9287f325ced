//! Store traits and the in-memory event-sourced store.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::access_address::AccessAddress;
use crate::error::{StoreError, StoreResult};
use crate::event::AddressEvent;
use crate::ids::{AccessAddressId, EntityKind, PostCodeId, RoadId, UnitAddressId};
use crate::index::AddressIndex;
use crate::post_code::PostCode;
use crate::road::Road;
use crate::unit_address::UnitAddress;

/// Any aggregate of the register.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressEntity {
    PostCode(PostCode),
    Road(Road),
    AccessAddress(AccessAddress),
    UnitAddress(UnitAddress),
}

impl AddressEntity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            AddressEntity::PostCode(_) => EntityKind::PostCode,
            AddressEntity::Road(_) => EntityKind::Road,
            AddressEntity::AccessAddress(_) => EntityKind::AccessAddress,
            AddressEntity::UnitAddress(_) => EntityKind::UnitAddress,
        }
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        match self {
            AddressEntity::PostCode(e) => e.number(),
            AddressEntity::Road(e) => e.external_id(),
            AddressEntity::AccessAddress(e) => e.external_id(),
            AddressEntity::UnitAddress(e) => e.external_id(),
        }
    }

    /// Drain events recorded since the last store.
    pub fn take_events(&mut self) -> Vec<AddressEvent> {
        match self {
            AddressEntity::PostCode(e) => e.take_events(),
            AddressEntity::Road(e) => e.take_events(),
            AddressEntity::AccessAddress(e) => e.take_events(),
            AddressEntity::UnitAddress(e) => e.take_events(),
        }
    }
}

impl From<PostCode> for AddressEntity {
    fn from(value: PostCode) -> Self {
        AddressEntity::PostCode(value)
    }
}

impl From<Road> for AddressEntity {
    fn from(value: Road) -> Self {
        AddressEntity::Road(value)
    }
}

impl From<AccessAddress> for AddressEntity {
    fn from(value: AccessAddress) -> Self {
        AddressEntity::AccessAddress(value)
    }
}

impl From<UnitAddress> for AddressEntity {
    fn from(value: UnitAddress) -> Self {
        AddressEntity::UnitAddress(value)
    }
}

/// Read-only view of the external-id index.
///
/// Point lookups are cheap and always reflect the last successful write. The
/// `*_ids` methods scan the whole index and should be called once per batch.
pub trait EntityIndex: Send + Sync {
    fn post_code_id(&self, number: &str) -> Option<PostCodeId>;

    fn road_id(&self, external_id: &str) -> Option<RoadId>;

    fn access_address_id(&self, external_id: &str) -> Option<AccessAddressId>;

    fn unit_address_id(&self, external_id: &str) -> Option<UnitAddressId>;

    fn post_code_ids(&self) -> HashSet<PostCodeId>;

    fn road_ids(&self) -> HashSet<RoadId>;

    fn access_address_ids(&self) -> HashSet<AccessAddressId>;

    /// Whether an entity of `kind` is mapped to `external_id`.
    fn contains(&self, kind: EntityKind, external_id: &str) -> bool {
        match kind {
            EntityKind::PostCode => self.post_code_id(external_id).is_some(),
            EntityKind::Road => self.road_id(external_id).is_some(),
            EntityKind::AccessAddress => self.access_address_id(external_id).is_some(),
            EntityKind::UnitAddress => self.unit_address_id(external_id).is_some(),
        }
    }
}

/// Persistence for the register's aggregates.
///
/// The store is the only writer of the index: every successful `store` call
/// is visible through [`EntityIndex`] before it returns.
#[async_trait]
pub trait AddressStore: EntityIndex {
    async fn load_post_code(&self, id: PostCodeId) -> StoreResult<Option<PostCode>>;

    async fn load_road(&self, id: RoadId) -> StoreResult<Option<Road>>;

    async fn load_access_address(&self, id: AccessAddressId)
        -> StoreResult<Option<AccessAddress>>;

    async fn load_unit_address(&self, id: UnitAddressId) -> StoreResult<Option<UnitAddress>>;

    /// Persist the pending events of one aggregate.
    ///
    /// Creating an entity whose external id is already mapped fails with
    /// [`StoreError::Duplicate`] and writes nothing.
    async fn store(&self, entity: AddressEntity) -> StoreResult<()>;

    /// Persist many aggregates. Duplicate creations are skipped, and the
    /// number of aggregates actually written is returned.
    async fn store_many(&self, entities: Vec<AddressEntity>) -> StoreResult<usize>;

    /// Rebuild the index from the persisted event log.
    async fn rehydrate_index(&self) -> StoreResult<()>;
}

#[derive(Debug, Default)]
struct State {
    log: Vec<AddressEvent>,
    index: AddressIndex,
    post_codes: HashMap<PostCodeId, PostCode>,
    roads: HashMap<RoadId, Road>,
    access_addresses: HashMap<AccessAddressId, AccessAddress>,
    unit_addresses: HashMap<UnitAddressId, UnitAddress>,
}

impl State {
    fn replay_aggregates(&mut self) -> StoreResult<()> {
        let log = std::mem::take(&mut self.log);
        let result = log.iter().try_for_each(|event| self.fold(event));
        self.log = log;
        result
    }

    fn fold(&mut self, event: &AddressEvent) -> StoreResult<()> {
        match event {
            AddressEvent::PostCodeCreated { id, .. } => {
                self.post_codes.insert(*id, PostCode::from_created(event)?);
            }
            AddressEvent::PostCodeUpdated { id, .. } | AddressEvent::PostCodeDeleted { id, .. } => {
                self.post_codes
                    .get_mut(id)
                    .ok_or_else(|| orphan(event))?
                    .apply(event);
            }
            AddressEvent::RoadCreated { id, .. } => {
                self.roads.insert(*id, Road::from_created(event)?);
            }
            AddressEvent::RoadUpdated { id, .. } | AddressEvent::RoadDeleted { id, .. } => {
                self.roads
                    .get_mut(id)
                    .ok_or_else(|| orphan(event))?
                    .apply(event);
            }
            AddressEvent::AccessAddressCreated { id, .. } => {
                self.access_addresses
                    .insert(*id, AccessAddress::from_created(event)?);
            }
            AddressEvent::AccessAddressUpdated { id, .. }
            | AddressEvent::AccessAddressDeleted { id, .. } => {
                self.access_addresses
                    .get_mut(id)
                    .ok_or_else(|| orphan(event))?
                    .apply(event);
            }
            AddressEvent::UnitAddressCreated { id, .. } => {
                self.unit_addresses
                    .insert(*id, UnitAddress::from_created(event)?);
            }
            AddressEvent::UnitAddressUpdated { id, .. }
            | AddressEvent::UnitAddressDeleted { id, .. } => {
                self.unit_addresses
                    .get_mut(id)
                    .ok_or_else(|| orphan(event))?
                    .apply(event);
            }
        }
        Ok(())
    }

    fn is_duplicate(&self, events: &[AddressEvent]) -> bool {
        events.first().is_some_and(|event| {
            event
                .created_external_id()
                .is_some_and(|external_id| self.index.contains(event.kind(), external_id))
        })
    }

    fn commit(&mut self, entity: AddressEntity, events: Vec<AddressEvent>) {
        for event in &events {
            self.index.apply(event);
        }
        self.log.extend(events);
        match entity {
            AddressEntity::PostCode(e) => {
                self.post_codes.insert(e.id(), e);
            }
            AddressEntity::Road(e) => {
                self.roads.insert(e.id(), e);
            }
            AddressEntity::AccessAddress(e) => {
                self.access_addresses.insert(e.id(), e);
            }
            AddressEntity::UnitAddress(e) => {
                self.unit_addresses.insert(e.id(), e);
            }
        }
    }
}

fn orphan(event: &AddressEvent) -> StoreError {
    StoreError::inconsistent(format!(
        "{} event for {} precedes its creation",
        event.kind(),
        event.entity_id()
    ))
}

/// Event-sourced store kept entirely in memory.
///
/// The event log is the source of truth. Aggregates are folded from it on
/// construction, the index only after [`AddressStore::rehydrate_index`], the
/// same way a process restart behaves against a persistent event store.
#[derive(Debug, Default)]
pub struct InMemoryAddressStore {
    state: RwLock<State>,
}

impl InMemoryAddressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store over a previously persisted event log.
    pub fn from_events(events: Vec<AddressEvent>) -> StoreResult<Self> {
        let mut state = State {
            log: events,
            ..State::default()
        };
        state.replay_aggregates()?;
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Copy of the full event log.
    #[must_use]
    pub fn events(&self) -> Vec<AddressEvent> {
        self.read().log.clone()
    }

    /// Number of persisted events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.read().log.len()
    }

    /// Copy of the current index projection.
    #[must_use]
    pub fn index_snapshot(&self) -> AddressIndex {
        self.read().index.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityIndex for InMemoryAddressStore {
    fn post_code_id(&self, number: &str) -> Option<PostCodeId> {
        self.read().index.post_code_id(number)
    }

    fn road_id(&self, external_id: &str) -> Option<RoadId> {
        self.read().index.road_id(external_id)
    }

    fn access_address_id(&self, external_id: &str) -> Option<AccessAddressId> {
        self.read().index.access_address_id(external_id)
    }

    fn unit_address_id(&self, external_id: &str) -> Option<UnitAddressId> {
        self.read().index.unit_address_id(external_id)
    }

    fn post_code_ids(&self) -> HashSet<PostCodeId> {
        self.read().index.post_code_ids()
    }

    fn road_ids(&self) -> HashSet<RoadId> {
        self.read().index.road_ids()
    }

    fn access_address_ids(&self) -> HashSet<AccessAddressId> {
        self.read().index.access_address_ids()
    }

    fn contains(&self, kind: EntityKind, external_id: &str) -> bool {
        self.read().index.contains(kind, external_id)
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn load_post_code(&self, id: PostCodeId) -> StoreResult<Option<PostCode>> {
        Ok(self.read().post_codes.get(&id).cloned())
    }

    async fn load_road(&self, id: RoadId) -> StoreResult<Option<Road>> {
        Ok(self.read().roads.get(&id).cloned())
    }

    async fn load_access_address(
        &self,
        id: AccessAddressId,
    ) -> StoreResult<Option<AccessAddress>> {
        Ok(self.read().access_addresses.get(&id).cloned())
    }

    async fn load_unit_address(&self, id: UnitAddressId) -> StoreResult<Option<UnitAddress>> {
        Ok(self.read().unit_addresses.get(&id).cloned())
    }

    async fn store(&self, mut entity: AddressEntity) -> StoreResult<()> {
        let events = entity.take_events();
        if events.is_empty() {
            return Ok(());
        }

        let mut state = self.write();
        if state.is_duplicate(&events) {
            return Err(StoreError::duplicate(entity.kind(), entity.external_id()));
        }
        debug!(
            kind = %entity.kind(),
            external_id = %entity.external_id(),
            events = events.len(),
            "Storing aggregate"
        );
        state.commit(entity, events);
        Ok(())
    }

    async fn store_many(&self, entities: Vec<AddressEntity>) -> StoreResult<usize> {
        let mut state = self.write();
        let mut written = 0;

        for mut entity in entities {
            let events = entity.take_events();
            if events.is_empty() {
                continue;
            }
            if state.is_duplicate(&events) {
                warn!(
                    kind = %entity.kind(),
                    external_id = %entity.external_id(),
                    "Skipping duplicate creation in batch"
                );
                continue;
            }
            state.commit(entity, events);
            written += 1;
        }

        debug!(written, "Stored batch");
        Ok(written)
    }

    async fn rehydrate_index(&self) -> StoreResult<()> {
        let mut state = self.write();
        let State { log, index, .. } = &mut *state;
        index.clear();
        for event in log.iter() {
            index.apply(event);
        }
        info!(events = log.len(), "Rehydrated address index");
        Ok(())
    }
}
