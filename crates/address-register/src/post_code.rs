//! Post code aggregate.
//!
//! The post code number is both the natural key and the external id.

use chrono::{DateTime, Utc};

use crate::error::{DomainError, DomainResult, StoreError, StoreResult};
use crate::event::AddressEvent;
use crate::ids::{EntityKind, PostCodeId};

/// A post code district.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCode {
    id: PostCodeId,
    number: String,
    name: String,
    deleted: bool,
    external_created: Option<DateTime<Utc>>,
    external_updated: Option<DateTime<Utc>>,
    pending: Vec<AddressEvent>,
}

impl PostCode {
    /// Create a new post code.
    pub fn create(
        id: PostCodeId,
        number: impl Into<String>,
        name: impl Into<String>,
        external_created: Option<DateTime<Utc>>,
        external_updated: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        let number = number.into();
        let name = name.into();

        if number.trim().is_empty() {
            return Err(DomainError::invalid(
                EntityKind::PostCode,
                "number",
                "must not be blank",
            ));
        }
        if name.trim().is_empty() {
            return Err(DomainError::invalid(
                EntityKind::PostCode,
                "name",
                format!("post code '{number}' has a blank name"),
            ));
        }

        let event = AddressEvent::PostCodeCreated {
            id,
            number: number.clone(),
            name: name.clone(),
            external_created,
            external_updated,
        };

        Ok(Self {
            id,
            number,
            name,
            deleted: false,
            external_created,
            external_updated,
            pending: vec![event],
        })
    }

    /// Rename the post code.
    pub fn update(
        &mut self,
        name: impl Into<String>,
        external_updated: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        let name = name.into();

        if self.deleted {
            return Err(DomainError::cannot_update_deleted(
                EntityKind::PostCode,
                &self.number,
            ));
        }
        if name.trim().is_empty() {
            return Err(DomainError::invalid(
                EntityKind::PostCode,
                "name",
                format!("post code '{}' has a blank name", self.number),
            ));
        }
        if name == self.name {
            return Err(DomainError::no_changes(EntityKind::PostCode, &self.number));
        }

        self.name.clone_from(&name);
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::PostCodeUpdated {
            id: self.id,
            name,
            external_updated,
        });
        Ok(())
    }

    /// Soft-delete the post code.
    pub fn delete(&mut self, external_updated: Option<DateTime<Utc>>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::already_deleted(
                EntityKind::PostCode,
                &self.number,
            ));
        }

        self.deleted = true;
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::PostCodeDeleted {
            id: self.id,
            external_updated,
        });
        Ok(())
    }

    /// Rebuild from a creation event.
    pub(crate) fn from_created(event: &AddressEvent) -> StoreResult<Self> {
        match event {
            AddressEvent::PostCodeCreated {
                id,
                number,
                name,
                external_created,
                external_updated,
            } => Ok(Self {
                id: *id,
                number: number.clone(),
                name: name.clone(),
                deleted: false,
                external_created: *external_created,
                external_updated: *external_updated,
                pending: Vec::new(),
            }),
            other => Err(StoreError::inconsistent(format!(
                "expected post_code_created, got {:?} for {}",
                other.kind(),
                other.entity_id()
            ))),
        }
    }

    /// Apply a later event during replay.
    pub(crate) fn apply(&mut self, event: &AddressEvent) {
        match event {
            AddressEvent::PostCodeUpdated {
                name,
                external_updated,
                ..
            } => {
                self.name.clone_from(name);
                self.external_updated = *external_updated;
            }
            AddressEvent::PostCodeDeleted {
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
    pub fn id(&self) -> PostCodeId {
        self.id
    }

    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    #[must_use]
    pub fn external_created(&self) -> Option<DateTime<Utc>> {
        self.external_created
    }

    #[must_use]
    pub fn external_updated(&self) -> Option<DateTime<Utc>> {
        self.external_updated
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        EntityKind::PostCode
    }
}
