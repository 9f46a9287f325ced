//! Import error types.

use address_register::{DomainError, EntityKind, StoreError};
use thiserror::Error;

use crate::checkpoint::Checkpoint;
use crate::record::ExternalStatus;

/// Errors raised by an [`AddressFeed`](crate::feed::AddressFeed).
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request to the registry failed.
    #[error("Feed request failed: {message}")]
    Request { message: String },

    /// The registry returned a record that could not be decoded.
    #[error("Malformed {kind} record: {message}")]
    Malformed { kind: EntityKind, message: String },
}

impl FeedError {
    /// Create a request error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Create a malformed-record error.
    pub fn malformed(kind: EntityKind, message: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            message: message.into(),
        }
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors raised by a [`CheckpointStore`](crate::checkpoint::CheckpointStore).
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for checkpoint store operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors that abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Feed error.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Domain store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Checkpoint store error.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// The checkpoint store refused to persist a checkpoint.
    #[error("Checkpoint {checkpoint} was not stored")]
    CheckpointNotStored { checkpoint: Checkpoint },

    /// An aggregate rejected a transition the import cannot skip.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A status that neither the kind nor the register accepts.
    #[error("Mapping error: {kind} status '{status}' - {message}")]
    Mapping {
        kind: EntityKind,
        status: ExternalStatus,
        message: String,
    },

    /// Existence and status do not determine an operation.
    #[error("Ambiguous transition for {kind} '{external_id}': exists={exists}, status={status}")]
    AmbiguousTransition {
        kind: EntityKind,
        external_id: String,
        exists: bool,
        status: ExternalStatus,
    },

    /// The index maps an external id to an entity the store cannot load.
    #[error("{kind} '{external_id}' is indexed but could not be loaded for {operation}")]
    UnresolvedTarget {
        kind: EntityKind,
        external_id: String,
        operation: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The run was cancelled.
    #[error("Import cancelled")]
    Cancelled,
}

impl ImportError {
    /// Create a mapping error.
    pub fn mapping(kind: EntityKind, status: ExternalStatus, message: impl Into<String>) -> Self {
        Self::Mapping {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Create an ambiguous transition error.
    pub fn ambiguous_transition(
        kind: EntityKind,
        external_id: impl Into<String>,
        exists: bool,
        status: ExternalStatus,
    ) -> Self {
        Self::AmbiguousTransition {
            kind,
            external_id: external_id.into(),
            exists,
            status,
        }
    }

    /// Create an unresolved target error.
    pub fn unresolved_target(
        kind: EntityKind,
        external_id: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::UnresolvedTarget {
            kind,
            external_id: external_id.into(),
            operation: operation.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if rerunning the same range may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ImportError::Feed(FeedError::Request { .. })
                | ImportError::Store(StoreError::Unavailable { .. })
                | ImportError::Checkpoint(CheckpointError::Database(_))
        )
    }

    /// Check if this error is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportError::Cancelled)
    }
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::ambiguous_transition(
            EntityKind::PostCode,
            "8000",
            false,
            ExternalStatus::Pending,
        );
        let message = err.to_string();
        assert!(message.contains("post_code"));
        assert!(message.contains("8000"));
        assert!(message.contains("pending"));

        let err = ImportError::unresolved_target(EntityKind::Road, "R1", "delete");
        assert!(err.to_string().contains("delete"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(ImportError::from(FeedError::request("timeout")).is_retryable());
        assert!(ImportError::from(StoreError::unavailable("closed")).is_retryable());
        assert!(!ImportError::Cancelled.is_retryable());
        assert!(!ImportError::configuration("bad").is_retryable());
        assert!(
            !ImportError::from(FeedError::malformed(EntityKind::Road, "no id")).is_retryable()
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(ImportError::Cancelled.is_cancelled());
        assert!(!ImportError::configuration("x").is_cancelled());
    }
}
