//! Field and status mapping from feed records to register aggregates.

use address_register::{
    AccessAddressFields, AccessAddressId, AddressStatus, EntityKind, PostCodeId, RoadId,
    RoadStatus, UnitAddressFields,
};

use crate::error::{ImportError, ImportResult};
use crate::record::{AccessAddressRecord, ExternalStatus, UnitAddressRecord};

/// Map a registry road status to the register's road status.
pub fn road_status(status: ExternalStatus) -> ImportResult<RoadStatus> {
    match status {
        ExternalStatus::Effective => Ok(RoadStatus::Effective),
        ExternalStatus::Temporary => Ok(RoadStatus::Temporary),
        other => Err(ImportError::mapping(
            EntityKind::Road,
            other,
            "no matching road status",
        )),
    }
}

/// Map a registry address status to the register's address status.
pub fn address_status(kind: EntityKind, status: ExternalStatus) -> ImportResult<AddressStatus> {
    match status {
        ExternalStatus::Active => Ok(AddressStatus::Active),
        ExternalStatus::Pending => Ok(AddressStatus::Pending),
        ExternalStatus::Discontinued => Ok(AddressStatus::Discontinued),
        ExternalStatus::Canceled => Ok(AddressStatus::Canceled),
        other => Err(ImportError::mapping(kind, other, "no matching address status")),
    }
}

pub(crate) fn access_address_fields(
    record: &AccessAddressRecord,
    post_code_id: PostCodeId,
    road_id: RoadId,
) -> ImportResult<AccessAddressFields> {
    Ok(AccessAddressFields {
        municipal_code: record.municipal_code.clone(),
        status: address_status(EntityKind::AccessAddress, record.status)?,
        road_code: record.road_code.clone(),
        house_number: record.house_number.clone(),
        post_code_id,
        road_id,
        east_coordinate: record.east_coordinate,
        north_coordinate: record.north_coordinate,
        supplementary_town_name: record.supplementary_town_name.clone(),
        plot_id: record.plot_id.clone(),
        pending_official: false,
    })
}

pub(crate) fn unit_address_fields(
    record: &UnitAddressRecord,
    access_address_id: AccessAddressId,
) -> ImportResult<UnitAddressFields> {
    Ok(UnitAddressFields {
        access_address_id,
        status: address_status(EntityKind::UnitAddress, record.status)?,
        floor_name: record.floor_name.clone(),
        suite_name: record.suite_name.clone(),
        pending_official: false,
    })
}
