//! Road aggregate.

use chrono::{DateTime, Utc};

use crate::error::{DomainError, DomainResult, StoreError, StoreResult};
use crate::event::AddressEvent;
use crate::ids::{EntityKind, RoadId};
use crate::status::RoadStatus;

/// A named road.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    id: RoadId,
    external_id: String,
    name: String,
    status: RoadStatus,
    deleted: bool,
    external_created: DateTime<Utc>,
    external_updated: DateTime<Utc>,
    pending: Vec<AddressEvent>,
}

impl Road {
    /// Create a new road.
    pub fn create(
        id: RoadId,
        external_id: impl Into<String>,
        name: impl Into<String>,
        status: RoadStatus,
        external_created: DateTime<Utc>,
        external_updated: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let external_id = external_id.into();
        let name = name.into();

        if external_id.trim().is_empty() {
            return Err(DomainError::invalid(
                EntityKind::Road,
                "external_id",
                "must not be blank",
            ));
        }

        let event = AddressEvent::RoadCreated {
            id,
            external_id: external_id.clone(),
            name: name.clone(),
            status,
            external_created,
            external_updated,
        };

        Ok(Self {
            id,
            external_id,
            name,
            status,
            deleted: false,
            external_created,
            external_updated,
            pending: vec![event],
        })
    }

    /// Update name and status.
    pub fn update(
        &mut self,
        name: impl Into<String>,
        status: RoadStatus,
        external_updated: DateTime<Utc>,
    ) -> DomainResult<()> {
        let name = name.into();

        if self.deleted {
            return Err(DomainError::cannot_update_deleted(
                EntityKind::Road,
                &self.external_id,
            ));
        }
        if name == self.name && status == self.status {
            return Err(DomainError::no_changes(EntityKind::Road, &self.external_id));
        }

        self.name.clone_from(&name);
        self.status = status;
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::RoadUpdated {
            id: self.id,
            name,
            status,
            external_updated,
        });
        Ok(())
    }

    /// Soft-delete the road.
    pub fn delete(&mut self, external_updated: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::already_deleted(
                EntityKind::Road,
                &self.external_id,
            ));
        }

        self.deleted = true;
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::RoadDeleted {
            id: self.id,
            external_updated,
        });
        Ok(())
    }

    pub(crate) fn from_created(event: &AddressEvent) -> StoreResult<Self> {
        match event {
            AddressEvent::RoadCreated {
                id,
                external_id,
                name,
                status,
                external_created,
                external_updated,
            } => Ok(Self {
                id: *id,
                external_id: external_id.clone(),
                name: name.clone(),
                status: *status,
                deleted: false,
                external_created: *external_created,
                external_updated: *external_updated,
                pending: Vec::new(),
            }),
            other => Err(StoreError::inconsistent(format!(
                "expected road_created, got {:?} for {}",
                other.kind(),
                other.entity_id()
            ))),
        }
    }

    pub(crate) fn apply(&mut self, event: &AddressEvent) {
        match event {
            AddressEvent::RoadUpdated {
                name,
                status,
                external_updated,
                ..
            } => {
                self.name.clone_from(name);
                self.status = *status;
                self.external_updated = *external_updated;
            }
            AddressEvent::RoadDeleted {
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
    pub fn id(&self) -> RoadId {
        self.id
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> RoadStatus {
        self.status
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
