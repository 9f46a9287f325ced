//! Change classification.
//!
//! Decides what an incoming record means for the register from two facts
//! only: whether its external id is already mapped, and the status the
//! registry reports. No storage is consulted.

use address_register::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::record::ExternalStatus;

/// Whether a status keeps an entity alive or ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Live,
    Terminal,
}

impl StatusClass {
    /// Partition `status` for `kind`. `None` when the status is not valid for
    /// the kind at all.
    #[must_use]
    pub fn of(kind: EntityKind, status: ExternalStatus) -> Option<StatusClass> {
        use ExternalStatus::{Active, Canceled, Discontinued, Effective, Pending, Temporary};

        match (kind, status) {
            (EntityKind::PostCode, Active) => Some(StatusClass::Live),
            (EntityKind::PostCode, Discontinued) => Some(StatusClass::Terminal),
            (EntityKind::Road, Effective | Temporary) => Some(StatusClass::Live),
            (EntityKind::Road, Discontinued | Canceled) => Some(StatusClass::Terminal),
            (EntityKind::AccessAddress | EntityKind::UnitAddress, Active | Pending) => {
                Some(StatusClass::Live)
            }
            (EntityKind::AccessAddress | EntityKind::UnitAddress, Discontinued | Canceled) => {
                Some(StatusClass::Terminal)
            }
            _ => None,
        }
    }
}

/// What to do with an incoming record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
    /// A tombstone for something never imported.
    Skip,
    Error(String),
}

impl ChangeOperation {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOperation::Insert => "insert",
            ChangeOperation::Update => "update",
            ChangeOperation::Delete => "delete",
            ChangeOperation::Skip => "skip",
            ChangeOperation::Error(_) => "error",
        }
    }
}

impl Display for ChangeOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeOperation::Error(reason) => write!(f, "error: {reason}"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Classify a record. Total over every input.
#[must_use]
pub fn classify(kind: EntityKind, exists: bool, status: ExternalStatus) -> ChangeOperation {
    match (StatusClass::of(kind, status), exists) {
        (Some(StatusClass::Live), false) => ChangeOperation::Insert,
        (Some(StatusClass::Live), true) => ChangeOperation::Update,
        (Some(StatusClass::Terminal), true) => ChangeOperation::Delete,
        (Some(StatusClass::Terminal), false) => ChangeOperation::Skip,
        (None, _) => ChangeOperation::Error(format!(
            "ambiguous transition: status '{status}' is not valid for {kind}"
        )),
    }
}
