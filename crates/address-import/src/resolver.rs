//! Reference resolution against the entity index.
//!
//! Lookups by external id are live and cheap. The full id sets used by the
//! aggregates' own reference validation come from a [`ReferenceSnapshot`]
//! captured once per batch.

use address_register::{
    AccessAddressId, AddressEntity, AddressStore, EntityIndex, EntityKind, PostCodeId, RoadId,
};
use std::collections::HashSet;
use tracing::{error, warn};

use crate::error::{ImportError, ImportResult};
use crate::record::{AccessAddressRecord, UnitAddressRecord};

/// Existence sets of every referenceable kind, taken at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSnapshot {
    post_code_ids: HashSet<PostCodeId>,
    road_ids: HashSet<RoadId>,
    access_address_ids: HashSet<AccessAddressId>,
}

impl ReferenceSnapshot {
    /// Scan the index. Linear in the size of the register.
    #[must_use]
    pub fn capture<I: EntityIndex + ?Sized>(index: &I) -> Self {
        Self {
            post_code_ids: index.post_code_ids(),
            road_ids: index.road_ids(),
            access_address_ids: index.access_address_ids(),
        }
    }

    /// Make an entity written after the capture visible to later records.
    pub fn add_entity(&mut self, entity: &AddressEntity) {
        match entity {
            AddressEntity::PostCode(e) => self.add_post_code(e.id()),
            AddressEntity::Road(e) => self.add_road(e.id()),
            AddressEntity::AccessAddress(e) => self.add_access_address(e.id()),
            AddressEntity::UnitAddress(_) => {}
        }
    }

    pub fn add_post_code(&mut self, id: PostCodeId) {
        self.post_code_ids.insert(id);
    }

    pub fn add_road(&mut self, id: RoadId) {
        self.road_ids.insert(id);
    }

    pub fn add_access_address(&mut self, id: AccessAddressId) {
        self.access_address_ids.insert(id);
    }

    #[must_use]
    pub fn post_code_ids(&self) -> &HashSet<PostCodeId> {
        &self.post_code_ids
    }

    #[must_use]
    pub fn road_ids(&self) -> &HashSet<RoadId> {
        &self.road_ids
    }

    #[must_use]
    pub fn access_address_ids(&self) -> &HashSet<AccessAddressId> {
        &self.access_address_ids
    }
}

/// Outcome of resolving a record's references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    /// A referenced external id is not in the index.
    Unresolved {
        reference: EntityKind,
        external_id: String,
    },
    /// The parent exists but is soft-deleted.
    ParentDeleted { parent: AccessAddressId },
}

impl<T> Resolution<T> {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Internal ids an access address points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessAddressRefs {
    pub post_code_id: PostCodeId,
    pub road_id: RoadId,
}

/// Resolve the post code and road of an access address.
pub fn resolve_access_address<I: EntityIndex + ?Sized>(
    index: &I,
    record: &AccessAddressRecord,
) -> Resolution<AccessAddressRefs> {
    let Some(post_code_id) = index.post_code_id(&record.post_code_number) else {
        warn!(
            external_id = %record.id,
            post_code = %record.post_code_number,
            "Could not find post code for access address"
        );
        return Resolution::Unresolved {
            reference: EntityKind::PostCode,
            external_id: record.post_code_number.clone(),
        };
    };

    let Some(road_id) = index.road_id(&record.road_id) else {
        warn!(
            external_id = %record.id,
            road_id = %record.road_id,
            "Could not find road for access address"
        );
        return Resolution::Unresolved {
            reference: EntityKind::Road,
            external_id: record.road_id.clone(),
        };
    };

    Resolution::Resolved(AccessAddressRefs {
        post_code_id,
        road_id,
    })
}

/// Resolve the access address a unit address belongs to.
pub fn resolve_unit_address<I: EntityIndex + ?Sized>(
    index: &I,
    record: &UnitAddressRecord,
) -> Resolution<AccessAddressId> {
    match index.access_address_id(&record.access_address_id) {
        Some(id) => Resolution::Resolved(id),
        None => {
            warn!(
                external_id = %record.id,
                access_address_id = %record.access_address_id,
                "Could not find access address for unit address"
            );
            Resolution::Unresolved {
                reference: EntityKind::AccessAddress,
                external_id: record.access_address_id.clone(),
            }
        }
    }
}

/// Resolve the parent of a new unit address and confirm it is not deleted.
pub async fn resolve_unit_address_insert(
    store: &dyn AddressStore,
    record: &UnitAddressRecord,
) -> ImportResult<Resolution<AccessAddressId>> {
    let parent = match resolve_unit_address(store, record) {
        Resolution::Resolved(id) => id,
        other => return Ok(other),
    };

    let access_address = store.load_access_address(parent).await?.ok_or_else(|| {
        ImportError::unresolved_target(
            EntityKind::AccessAddress,
            &record.access_address_id,
            "unit address insert",
        )
    })?;

    if access_address.is_deleted() {
        error!(
            external_id = %record.id,
            access_address_id = %parent,
            "Cannot insert unit address because the access address has been deleted"
        );
        return Ok(Resolution::ParentDeleted { parent });
    }

    Ok(Resolution::Resolved(parent))
}
