//! External-id index projection.
//!
//! Maps each registry-issued external id to the internal id of the entity it
//! created. Soft-deleted entities stay mapped, since deletion never removes an
//! entity from the register.

use std::collections::{HashMap, HashSet};

use crate::event::AddressEvent;
use crate::ids::{AccessAddressId, EntityKind, PostCodeId, RoadId, UnitAddressId};

/// In-memory projection of external ids to internal ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressIndex {
    post_codes: HashMap<String, PostCodeId>,
    roads: HashMap<String, RoadId>,
    access_addresses: HashMap<String, AccessAddressId>,
    unit_addresses: HashMap<String, UnitAddressId>,
}

impl AddressIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Project one event. Only creation events change the index.
    pub fn apply(&mut self, event: &AddressEvent) {
        match event {
            AddressEvent::PostCodeCreated { id, number, .. } => {
                self.post_codes.insert(number.clone(), *id);
            }
            AddressEvent::RoadCreated {
                id, external_id, ..
            } => {
                self.roads.insert(external_id.clone(), *id);
            }
            AddressEvent::AccessAddressCreated {
                id, external_id, ..
            } => {
                self.access_addresses.insert(external_id.clone(), *id);
            }
            AddressEvent::UnitAddressCreated {
                id, external_id, ..
            } => {
                self.unit_addresses.insert(external_id.clone(), *id);
            }
            _ => {}
        }
    }

    /// Drop every mapping.
    pub fn clear(&mut self) {
        self.post_codes.clear();
        self.roads.clear();
        self.access_addresses.clear();
        self.unit_addresses.clear();
    }

    #[must_use]
    pub fn contains(&self, kind: EntityKind, external_id: &str) -> bool {
        match kind {
            EntityKind::PostCode => self.post_codes.contains_key(external_id),
            EntityKind::Road => self.roads.contains_key(external_id),
            EntityKind::AccessAddress => self.access_addresses.contains_key(external_id),
            EntityKind::UnitAddress => self.unit_addresses.contains_key(external_id),
        }
    }

    #[must_use]
    pub fn post_code_id(&self, number: &str) -> Option<PostCodeId> {
        self.post_codes.get(number).copied()
    }

    #[must_use]
    pub fn road_id(&self, external_id: &str) -> Option<RoadId> {
        self.roads.get(external_id).copied()
    }

    #[must_use]
    pub fn access_address_id(&self, external_id: &str) -> Option<AccessAddressId> {
        self.access_addresses.get(external_id).copied()
    }

    #[must_use]
    pub fn unit_address_id(&self, external_id: &str) -> Option<UnitAddressId> {
        self.unit_addresses.get(external_id).copied()
    }

    /// Full set of post code ids. Linear in the number of post codes.
    #[must_use]
    pub fn post_code_ids(&self) -> HashSet<PostCodeId> {
        self.post_codes.values().copied().collect()
    }

    /// Full set of road ids. Linear in the number of roads.
    #[must_use]
    pub fn road_ids(&self) -> HashSet<RoadId> {
        self.roads.values().copied().collect()
    }

    /// Full set of access address ids. Linear in the number of access addresses.
    #[must_use]
    pub fn access_address_ids(&self) -> HashSet<AccessAddressId> {
        self.access_addresses.values().copied().collect()
    }

    /// Number of mapped entities of one kind.
    #[must_use]
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::PostCode => self.post_codes.len(),
            EntityKind::Road => self.roads.len(),
            EntityKind::AccessAddress => self.access_addresses.len(),
            EntityKind::UnitAddress => self.unit_addresses.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }
}
