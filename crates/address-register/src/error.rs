//! Domain and store error types.

use thiserror::Error;
use uuid::Uuid;

use crate::ids::EntityKind;

/// A rejected state transition on an aggregate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// The update would not change any observable field.
    #[error("{kind} '{external_id}' has no changes")]
    NoChanges {
        kind: EntityKind,
        external_id: String,
    },

    /// Delete was requested for an entity that is already deleted.
    #[error("{kind} '{external_id}' is already deleted")]
    AlreadyDeleted {
        kind: EntityKind,
        external_id: String,
    },

    /// Update was requested for a deleted entity.
    #[error("{kind} '{external_id}' is deleted and cannot be updated")]
    CannotUpdateDeleted {
        kind: EntityKind,
        external_id: String,
    },

    /// A field failed validation.
    #[error("Invalid {kind} field '{field}': {message}")]
    Invalid {
        kind: EntityKind,
        field: &'static str,
        message: String,
    },

    /// A referenced entity is not known to the register.
    #[error("{kind} '{external_id}' references unknown {reference} {id}")]
    UnknownReference {
        kind: EntityKind,
        external_id: String,
        reference: EntityKind,
        id: Uuid,
    },
}

impl DomainError {
    /// Create a no-changes error.
    pub fn no_changes(kind: EntityKind, external_id: impl Into<String>) -> Self {
        Self::NoChanges {
            kind,
            external_id: external_id.into(),
        }
    }

    /// Create an already-deleted error.
    pub fn already_deleted(kind: EntityKind, external_id: impl Into<String>) -> Self {
        Self::AlreadyDeleted {
            kind,
            external_id: external_id.into(),
        }
    }

    /// Create a cannot-update-deleted error.
    pub fn cannot_update_deleted(kind: EntityKind, external_id: impl Into<String>) -> Self {
        Self::CannotUpdateDeleted {
            kind,
            external_id: external_id.into(),
        }
    }

    /// Create a validation error.
    pub fn invalid(kind: EntityKind, field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            field,
            message: message.into(),
        }
    }

    /// Create an unknown-reference error.
    pub fn unknown_reference(
        kind: EntityKind,
        external_id: impl Into<String>,
        reference: EntityKind,
        id: Uuid,
    ) -> Self {
        Self::UnknownReference {
            kind,
            external_id: external_id.into(),
            reference,
            id,
        }
    }

    /// Benign outcomes leave the register unchanged and are safe to skip
    /// during replay.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            DomainError::NoChanges { .. }
                | DomainError::AlreadyDeleted { .. }
                | DomainError::CannotUpdateDeleted { .. }
        )
    }

    /// Kind of the entity that rejected the transition.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            DomainError::NoChanges { kind, .. }
            | DomainError::AlreadyDeleted { kind, .. }
            | DomainError::CannotUpdateDeleted { kind, .. }
            | DomainError::Invalid { kind, .. }
            | DomainError::UnknownReference { kind, .. } => *kind,
        }
    }
}

/// Result type for aggregate operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors raised by an [`AddressStore`](crate::store::AddressStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entity with the same external id is already registered.
    #[error("{kind} with external id '{external_id}' already exists")]
    Duplicate {
        kind: EntityKind,
        external_id: String,
    },

    /// An event refers to an entity the log never created.
    #[error("Event log is inconsistent: {message}")]
    Inconsistent { message: String },

    /// The backing storage could not be reached.
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Create a duplicate error.
    pub fn duplicate(kind: EntityKind, external_id: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            external_id: external_id.into(),
        }
    }

    /// Create an inconsistency error.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Check if this error is a duplicate insert.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
