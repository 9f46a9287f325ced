//! Unit address aggregate: a floor/suite below an access address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{DomainError, DomainResult, StoreError, StoreResult};
use crate::event::AddressEvent;
use crate::ids::{AccessAddressId, EntityKind, UnitAddressId};
use crate::status::AddressStatus;

/// Mutable attributes of a unit address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAddressFields {
    pub access_address_id: AccessAddressId,
    pub status: AddressStatus,
    pub floor_name: Option<String>,
    pub suite_name: Option<String>,
    pub pending_official: bool,
}

/// A unit address.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitAddress {
    id: UnitAddressId,
    external_id: String,
    fields: UnitAddressFields,
    deleted: bool,
    external_created: DateTime<Utc>,
    external_updated: DateTime<Utc>,
    pending: Vec<AddressEvent>,
}

impl UnitAddress {
    /// Create a new unit address under an existing access address.
    pub fn create(
        id: UnitAddressId,
        external_id: impl Into<String>,
        fields: UnitAddressFields,
        external_created: DateTime<Utc>,
        external_updated: DateTime<Utc>,
        existing_access_address_ids: &HashSet<AccessAddressId>,
    ) -> DomainResult<Self> {
        let external_id = external_id.into();

        if external_id.trim().is_empty() {
            return Err(DomainError::invalid(
                EntityKind::UnitAddress,
                "external_id",
                "must not be blank",
            ));
        }
        validate(&external_id, &fields, existing_access_address_ids)?;

        let event = AddressEvent::UnitAddressCreated {
            id,
            external_id: external_id.clone(),
            fields: fields.clone(),
            external_created,
            external_updated,
        };

        Ok(Self {
            id,
            external_id,
            fields,
            deleted: false,
            external_created,
            external_updated,
            pending: vec![event],
        })
    }

    /// Replace the mutable attributes.
    pub fn update(
        &mut self,
        fields: UnitAddressFields,
        external_updated: DateTime<Utc>,
        existing_access_address_ids: &HashSet<AccessAddressId>,
    ) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::cannot_update_deleted(
                EntityKind::UnitAddress,
                &self.external_id,
            ));
        }
        validate(&self.external_id, &fields, existing_access_address_ids)?;
        if fields == self.fields {
            return Err(DomainError::no_changes(
                EntityKind::UnitAddress,
                &self.external_id,
            ));
        }

        self.fields = fields.clone();
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::UnitAddressUpdated {
            id: self.id,
            fields,
            external_updated,
        });
        Ok(())
    }

    /// Soft-delete the unit address.
    pub fn delete(&mut self, external_updated: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::already_deleted(
                EntityKind::UnitAddress,
                &self.external_id,
            ));
        }

        self.deleted = true;
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::UnitAddressDeleted {
            id: self.id,
            external_updated,
        });
        Ok(())
    }

    pub(crate) fn from_created(event: &AddressEvent) -> StoreResult<Self> {
        match event {
            AddressEvent::UnitAddressCreated {
                id,
                external_id,
                fields,
                external_created,
                external_updated,
            } => Ok(Self {
                id: *id,
                external_id: external_id.clone(),
                fields: fields.clone(),
                deleted: false,
                external_created: *external_created,
                external_updated: *external_updated,
                pending: Vec::new(),
            }),
            other => Err(StoreError::inconsistent(format!(
                "expected unit_address_created, got {:?} for {}",
                other.kind(),
                other.entity_id()
            ))),
        }
    }

    pub(crate) fn apply(&mut self, event: &AddressEvent) {
        match event {
            AddressEvent::UnitAddressUpdated {
                fields,
                external_updated,
                ..
            } => {
                self.fields = fields.clone();
                self.external_updated = *external_updated;
            }
            AddressEvent::UnitAddressDeleted {
                external_updated, ..
            } => {
                self.deleted = true;
                self.external_updated = *external_updated;
            }
            _ => {}
        }
    }

    /// Drain events recorded since the last store.
    pub fn take_events(&mut self) -> Vec<AddressEvent> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn id(&self) -> UnitAddressId {
        self.id
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[must_use]
    pub fn fields(&self) -> &UnitAddressFields {
        &self.fields
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    #[must_use]
    pub fn external_created(&self) -> DateTime<Utc> {
        self.external_created
    }

    #[must_use]
    pub fn external_updated(&self) -> DateTime<Utc> {
        self.external_updated
    }
}

fn validate(
    external_id: &str,
    fields: &UnitAddressFields,
    existing_access_address_ids: &HashSet<AccessAddressId>,
) -> DomainResult<()> {
    if existing_access_address_ids.contains(&fields.access_address_id) {
        Ok(())
    } else {
        Err(DomainError::unknown_reference(
            EntityKind::UnitAddress,
            external_id,
            EntityKind::AccessAddress,
            *fields.access_address_id.as_uuid(),
        ))
    }
}
