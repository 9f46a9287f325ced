//! Per-kind application of classified records.
//!
//! Each routine turns one record into an aggregate ready to be stored, or
//! explains why nothing should be written. Nothing here touches the store
//! except to load existing aggregates.

use address_register::{
    AccessAddress, AccessAddressId, AddressEntity, AddressStore, DomainResult, EntityKind,
    PostCode, PostCodeId, Road, RoadId, UnitAddress, UnitAddressId,
};
use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::mapping;
use crate::record::ExternalRecord;
use crate::resolver::{self, ReferenceSnapshot, Resolution};
use crate::statistics::Outcome;

/// Result of preparing one record.
#[derive(Debug)]
pub(crate) enum Prepared {
    /// Store this aggregate.
    Write(AddressEntity),
    /// Nothing to write; `Outcome` says why.
    Settled(Outcome),
}

impl<T> From<Resolution<T>> for Prepared {
    fn from(value: Resolution<T>) -> Self {
        match value {
            Resolution::ParentDeleted { .. } => Prepared::Settled(Outcome::Rejected),
            _ => Prepared::Settled(Outcome::Skipped),
        }
    }
}

/// Build a new aggregate for a record with no mapping yet.
pub(crate) async fn insert(
    store: &dyn AddressStore,
    snapshot: &ReferenceSnapshot,
    record: &ExternalRecord,
) -> ImportResult<Prepared> {
    let entity: AddressEntity = match record {
        ExternalRecord::PostCode(r) => {
            PostCode::create(PostCodeId::new(), &r.number, &r.name, r.created, r.updated)?.into()
        }
        ExternalRecord::Road(r) => Road::create(
            RoadId::new(),
            &r.id,
            &r.name,
            mapping::road_status(r.status)?,
            r.created,
            r.updated,
        )?
        .into(),
        ExternalRecord::AccessAddress(r) => {
            let refs = match resolver::resolve_access_address(store, r) {
                Resolution::Resolved(refs) => refs,
                other => return Ok(other.into()),
            };
            AccessAddress::create(
                AccessAddressId::new(),
                &r.id,
                mapping::access_address_fields(r, refs.post_code_id, refs.road_id)?,
                r.created,
                r.updated,
                snapshot.post_code_ids(),
                snapshot.road_ids(),
            )?
            .into()
        }
        ExternalRecord::UnitAddress(r) => {
            let parent = match resolver::resolve_unit_address_insert(store, r).await? {
                Resolution::Resolved(parent) => parent,
                other => return Ok(other.into()),
            };
            UnitAddress::create(
                UnitAddressId::new(),
                &r.id,
                mapping::unit_address_fields(r, parent)?,
                r.created,
                r.updated,
                snapshot.access_address_ids(),
            )?
            .into()
        }
    };

    Ok(Prepared::Write(entity))
}

/// Apply a live record to the aggregate it is mapped to.
pub(crate) async fn update(
    store: &dyn AddressStore,
    snapshot: &ReferenceSnapshot,
    record: &ExternalRecord,
) -> ImportResult<Prepared> {
    const OPERATION: &str = "update";

    match record {
        ExternalRecord::PostCode(r) => {
            let mut post_code = load_post_code(store, &r.number, OPERATION).await?;
            let result = post_code.update(&r.name, r.updated);
            settle(result, post_code)
        }
        ExternalRecord::Road(r) => {
            let mut road = load_road(store, &r.id, OPERATION).await?;
            let result = road.update(&r.name, mapping::road_status(r.status)?, r.updated);
            settle(result, road)
        }
        ExternalRecord::AccessAddress(r) => {
            let refs = match resolver::resolve_access_address(store, r) {
                Resolution::Resolved(refs) => refs,
                other => return Ok(other.into()),
            };
            let mut access_address = load_access_address(store, &r.id, OPERATION).await?;
            let result = access_address.update(
                mapping::access_address_fields(r, refs.post_code_id, refs.road_id)?,
                r.updated,
                snapshot.post_code_ids(),
                snapshot.road_ids(),
            );
            settle(result, access_address)
        }
        ExternalRecord::UnitAddress(r) => {
            let parent = match resolver::resolve_unit_address(store, r) {
                Resolution::Resolved(parent) => parent,
                other => return Ok(other.into()),
            };
            let mut unit_address = load_unit_address(store, &r.id, OPERATION).await?;
            let result = unit_address.update(
                mapping::unit_address_fields(r, parent)?,
                r.updated,
                snapshot.access_address_ids(),
            );
            settle(result, unit_address)
        }
    }
}

/// Soft-delete the aggregate a terminal record is mapped to.
///
/// A mapped id whose aggregate cannot be loaded is fatal.
pub(crate) async fn delete(
    store: &dyn AddressStore,
    record: &ExternalRecord,
) -> ImportResult<Prepared> {
    const OPERATION: &str = "delete";

    match record {
        ExternalRecord::PostCode(r) => {
            let mut post_code = load_post_code(store, &r.number, OPERATION).await?;
            let result = post_code.delete(r.updated);
            settle(result, post_code)
        }
        ExternalRecord::Road(r) => {
            let mut road = load_road(store, &r.id, OPERATION).await?;
            let result = road.delete(r.updated);
            settle(result, road)
        }
        ExternalRecord::AccessAddress(r) => {
            let mut access_address = load_access_address(store, &r.id, OPERATION).await?;
            let result = access_address.delete(r.updated);
            settle(result, access_address)
        }
        ExternalRecord::UnitAddress(r) => {
            let mut unit_address = load_unit_address(store, &r.id, OPERATION).await?;
            let result = unit_address.delete(r.updated);
            settle(result, unit_address)
        }
    }
}

fn settle(result: DomainResult<()>, entity: impl Into<AddressEntity>) -> ImportResult<Prepared> {
    match result {
        Ok(()) => Ok(Prepared::Write(entity.into())),
        Err(err) if err.is_benign() => {
            debug!(kind = %err.kind(), error = %err, "Change already reflected");
            Ok(Prepared::Settled(Outcome::NoOp))
        }
        Err(err) => Err(err.into()),
    }
}

async fn load_post_code(
    store: &dyn AddressStore,
    number: &str,
    operation: &str,
) -> ImportResult<PostCode> {
    let unresolved = || ImportError::unresolved_target(EntityKind::PostCode, number, operation);
    let id = store.post_code_id(number).ok_or_else(unresolved)?;
    store.load_post_code(id).await?.ok_or_else(unresolved)
}

async fn load_road(
    store: &dyn AddressStore,
    external_id: &str,
    operation: &str,
) -> ImportResult<Road> {
    let unresolved = || ImportError::unresolved_target(EntityKind::Road, external_id, operation);
    let id = store.road_id(external_id).ok_or_else(unresolved)?;
    store.load_road(id).await?.ok_or_else(unresolved)
}

async fn load_access_address(
    store: &dyn AddressStore,
    external_id: &str,
    operation: &str,
) -> ImportResult<AccessAddress> {
    let unresolved =
        || ImportError::unresolved_target(EntityKind::AccessAddress, external_id, operation);
    let id = store.access_address_id(external_id).ok_or_else(unresolved)?;
    store.load_access_address(id).await?.ok_or_else(unresolved)
}

async fn load_unit_address(
    store: &dyn AddressStore,
    external_id: &str,
    operation: &str,
) -> ImportResult<UnitAddress> {
    let unresolved =
        || ImportError::unresolved_target(EntityKind::UnitAddress, external_id, operation);
    let id = store.unit_address_id(external_id).ok_or_else(unresolved)?;
    store.load_unit_address(id).await?.ok_or_else(unresolved)
}
