//! Access address aggregate.
//!
//! An access address is the entrance of a building plot. It references
//! exactly one post code and one road, both of which must be known to the
//! register when the address is created or updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{DomainError, DomainResult, StoreError, StoreResult};
use crate::event::AddressEvent;
use crate::ids::{AccessAddressId, EntityKind, PostCodeId, RoadId};
use crate::status::AddressStatus;

/// Mutable attributes of an access address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressFields {
    pub municipal_code: String,
    pub status: AddressStatus,
    pub road_code: String,
    pub house_number: String,
    pub post_code_id: PostCodeId,
    pub road_id: RoadId,
    pub east_coordinate: f64,
    pub north_coordinate: f64,
    pub supplementary_town_name: Option<String>,
    pub plot_id: Option<String>,
    pub pending_official: bool,
}

/// An access address.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessAddress {
    id: AccessAddressId,
    external_id: String,
    fields: AccessAddressFields,
    deleted: bool,
    external_created: DateTime<Utc>,
    external_updated: DateTime<Utc>,
    pending: Vec<AddressEvent>,
}

impl AccessAddress {
    /// Create a new access address.
    ///
    /// `existing_post_code_ids` and `existing_road_ids` are the snapshot the
    /// references are validated against.
    pub fn create(
        id: AccessAddressId,
        external_id: impl Into<String>,
        fields: AccessAddressFields,
        external_created: DateTime<Utc>,
        external_updated: DateTime<Utc>,
        existing_post_code_ids: &HashSet<PostCodeId>,
        existing_road_ids: &HashSet<RoadId>,
    ) -> DomainResult<Self> {
        let external_id = external_id.into();

        if external_id.trim().is_empty() {
            return Err(DomainError::invalid(
                EntityKind::AccessAddress,
                "external_id",
                "must not be blank",
            ));
        }
        validate(
            &external_id,
            &fields,
            existing_post_code_ids,
            existing_road_ids,
        )?;

        let event = AddressEvent::AccessAddressCreated {
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
        fields: AccessAddressFields,
        external_updated: DateTime<Utc>,
        existing_post_code_ids: &HashSet<PostCodeId>,
        existing_road_ids: &HashSet<RoadId>,
    ) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::cannot_update_deleted(
                EntityKind::AccessAddress,
                &self.external_id,
            ));
        }
        validate(
            &self.external_id,
            &fields,
            existing_post_code_ids,
            existing_road_ids,
        )?;
        if fields == self.fields {
            return Err(DomainError::no_changes(
                EntityKind::AccessAddress,
                &self.external_id,
            ));
        }

        self.fields = fields.clone();
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::AccessAddressUpdated {
            id: self.id,
            fields,
            external_updated,
        });
        Ok(())
    }

    /// Soft-delete the access address.
    pub fn delete(&mut self, external_updated: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::already_deleted(
                EntityKind::AccessAddress,
                &self.external_id,
            ));
        }

        self.deleted = true;
        self.external_updated = external_updated;
        self.pending.push(AddressEvent::AccessAddressDeleted {
            id: self.id,
            external_updated,
        });
        Ok(())
    }

    pub(crate) fn from_created(event: &AddressEvent) -> StoreResult<Self> {
        match event {
            AddressEvent::AccessAddressCreated {
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
                "expected access_address_created, got {:?} for {}",
                other.kind(),
                other.entity_id()
            ))),
        }
    }

    pub(crate) fn apply(&mut self, event: &AddressEvent) {
        match event {
            AddressEvent::AccessAddressUpdated {
                fields,
                external_updated,
                ..
            } => {
                self.fields = fields.clone();
                self.external_updated = *external_updated;
            }
            AddressEvent::AccessAddressDeleted {
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
    pub fn id(&self) -> AccessAddressId {
        self.id
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[must_use]
    pub fn fields(&self) -> &AccessAddressFields {
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
    fields: &AccessAddressFields,
    existing_post_code_ids: &HashSet<PostCodeId>,
    existing_road_ids: &HashSet<RoadId>,
) -> DomainResult<()> {
    if !existing_post_code_ids.contains(&fields.post_code_id) {
        return Err(DomainError::unknown_reference(
            EntityKind::AccessAddress,
            external_id,
            EntityKind::PostCode,
            *fields.post_code_id.as_uuid(),
        ));
    }
    if !existing_road_ids.contains(&fields.road_id) {
        return Err(DomainError::unknown_reference(
            EntityKind::AccessAddress,
            external_id,
            EntityKind::Road,
            *fields.road_id.as_uuid(),
        ));
    }
    if !fields.east_coordinate.is_finite() || !fields.north_coordinate.is_finite() {
        return Err(DomainError::invalid(
            EntityKind::AccessAddress,
            "coordinates",
            format!("access address '{external_id}' has non-finite coordinates"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        post_code_ids: HashSet<PostCodeId>,
        road_ids: HashSet<RoadId>,
        fields: AccessAddressFields,
    }

    fn fixture() -> Fixture {
        let post_code_id = PostCodeId::new();
        let road_id = RoadId::new();
        Fixture {
            post_code_ids: HashSet::from([post_code_id]),
            road_ids: HashSet::from([road_id]),
            fields: AccessAddressFields {
                municipal_code: "0751".to_string(),
                status: AddressStatus::Active,
                road_code: "1234".to_string(),
                house_number: "12A".to_string(),
                post_code_id,
                road_id,
                east_coordinate: 575_000.0,
                north_coordinate: 6_224_000.0,
                supplementary_town_name: None,
                plot_id: Some("0101".to_string()),
                pending_official: false,
            },
        }
    }

    fn create(fx: &Fixture) -> DomainResult<AccessAddress> {
        let now = Utc::now();
        AccessAddress::create(
            AccessAddressId::new(),
            "A1",
            fx.fields.clone(),
            now,
            now,
            &fx.post_code_ids,
            &fx.road_ids,
        )
    }

    #[test]
    fn test_create_with_known_references() {
        let fx = fixture();
        let address = create(&fx).unwrap();
        assert_eq!(address.external_id(), "A1");
        assert!(!address.is_deleted());
    }

    #[test]
    fn test_create_rejects_unknown_road() {
        let mut fx = fixture();
        fx.road_ids.clear();
        let err = create(&fx).unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnknownReference {
                reference: EntityKind::Road,
                ..
            }
        ));
    }

    #[test]
    fn test_update_with_identical_fields_is_no_changes() {
        let fx = fixture();
        let mut address = create(&fx).unwrap();
        let err = address
            .update(fx.fields.clone(), Utc::now(), &fx.post_code_ids, &fx.road_ids)
            .unwrap_err();
        assert!(matches!(err, DomainError::NoChanges { .. }));
    }

    #[test]
    fn test_update_changes_house_number() {
        let fx = fixture();
        let mut address = create(&fx).unwrap();
        let mut fields = fx.fields.clone();
        fields.house_number = "14".to_string();
        address
            .update(fields, Utc::now(), &fx.post_code_ids, &fx.road_ids)
            .unwrap();
        assert_eq!(address.fields().house_number, "14");
    }

    #[test]
    fn test_update_after_delete_is_rejected() {
        let fx = fixture();
        let mut address = create(&fx).unwrap();
        address.delete(Utc::now()).unwrap();
        let mut fields = fx.fields.clone();
        fields.house_number = "14".to_string();
        let err = address
            .update(fields, Utc::now(), &fx.post_code_ids, &fx.road_ids)
            .unwrap_err();
        assert!(matches!(err, DomainError::CannotUpdateDeleted { .. }));
    }
}
