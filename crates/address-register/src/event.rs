//! Events recorded by the aggregates and appended to the store's log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access_address::AccessAddressFields;
use crate::ids::{AccessAddressId, EntityKind, PostCodeId, RoadId, UnitAddressId};
use crate::status::RoadStatus;
use crate::unit_address::UnitAddressFields;

/// A fact about the register. Replaying the log in order rebuilds every
/// aggregate and the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressEvent {
    PostCodeCreated {
        id: PostCodeId,
        number: String,
        name: String,
        external_created: Option<DateTime<Utc>>,
        external_updated: Option<DateTime<Utc>>,
    },
    PostCodeUpdated {
        id: PostCodeId,
        name: String,
        external_updated: Option<DateTime<Utc>>,
    },
    PostCodeDeleted {
        id: PostCodeId,
        external_updated: Option<DateTime<Utc>>,
    },
    RoadCreated {
        id: RoadId,
        external_id: String,
        name: String,
        status: RoadStatus,
        external_created: DateTime<Utc>,
        external_updated: DateTime<Utc>,
    },
    RoadUpdated {
        id: RoadId,
        name: String,
        status: RoadStatus,
        external_updated: DateTime<Utc>,
    },
    RoadDeleted {
        id: RoadId,
        external_updated: DateTime<Utc>,
    },
    AccessAddressCreated {
        id: AccessAddressId,
        external_id: String,
        fields: AccessAddressFields,
        external_created: DateTime<Utc>,
        external_updated: DateTime<Utc>,
    },
    AccessAddressUpdated {
        id: AccessAddressId,
        fields: AccessAddressFields,
        external_updated: DateTime<Utc>,
    },
    AccessAddressDeleted {
        id: AccessAddressId,
        external_updated: DateTime<Utc>,
    },
    UnitAddressCreated {
        id: UnitAddressId,
        external_id: String,
        fields: UnitAddressFields,
        external_created: DateTime<Utc>,
        external_updated: DateTime<Utc>,
    },
    UnitAddressUpdated {
        id: UnitAddressId,
        fields: UnitAddressFields,
        external_updated: DateTime<Utc>,
    },
    UnitAddressDeleted {
        id: UnitAddressId,
        external_updated: DateTime<Utc>,
    },
}

impl AddressEvent {
    /// Kind of the entity this event belongs to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            AddressEvent::PostCodeCreated { .. }
            | AddressEvent::PostCodeUpdated { .. }
            | AddressEvent::PostCodeDeleted { .. } => EntityKind::PostCode,
            AddressEvent::RoadCreated { .. }
            | AddressEvent::RoadUpdated { .. }
            | AddressEvent::RoadDeleted { .. } => EntityKind::Road,
            AddressEvent::AccessAddressCreated { .. }
            | AddressEvent::AccessAddressUpdated { .. }
            | AddressEvent::AccessAddressDeleted { .. } => EntityKind::AccessAddress,
            AddressEvent::UnitAddressCreated { .. }
            | AddressEvent::UnitAddressUpdated { .. }
            | AddressEvent::UnitAddressDeleted { .. } => EntityKind::UnitAddress,
        }
    }

    /// Internal id of the entity this event belongs to.
    #[must_use]
    pub fn entity_id(&self) -> Uuid {
        match self {
            AddressEvent::PostCodeCreated { id, .. }
            | AddressEvent::PostCodeUpdated { id, .. }
            | AddressEvent::PostCodeDeleted { id, .. } => *id.as_uuid(),
            AddressEvent::RoadCreated { id, .. }
            | AddressEvent::RoadUpdated { id, .. }
            | AddressEvent::RoadDeleted { id, .. } => *id.as_uuid(),
            AddressEvent::AccessAddressCreated { id, .. }
            | AddressEvent::AccessAddressUpdated { id, .. }
            | AddressEvent::AccessAddressDeleted { id, .. } => *id.as_uuid(),
            AddressEvent::UnitAddressCreated { id, .. }
            | AddressEvent::UnitAddressUpdated { id, .. }
            | AddressEvent::UnitAddressDeleted { id, .. } => *id.as_uuid(),
        }
    }

    /// External id carried by creation events.
    #[must_use]
    pub fn created_external_id(&self) -> Option<&str> {
        match self {
            AddressEvent::PostCodeCreated { number, .. } => Some(number),
            AddressEvent::RoadCreated { external_id, .. }
            | AddressEvent::AccessAddressCreated { external_id, .. }
            | AddressEvent::UnitAddressCreated { external_id, .. } => Some(external_id),
            _ => None,
        }
    }
}
