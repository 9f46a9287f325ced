//! Strongly typed identifiers.
//!
//! Internal ids are generated UUID v4 values, one newtype per entity kind, so
//! an access address can never be wired to a road id by accident. External ids
//! stay plain strings: they are whatever the registry issued.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Internal identifier of a post code.
    PostCodeId
);

define_id!(
    /// Internal identifier of a road.
    RoadId
);

define_id!(
    /// Internal identifier of an access address.
    AccessAddressId
);

define_id!(
    /// Internal identifier of a unit address.
    UnitAddressId
);

/// The four entity kinds held by the register.
///
/// Declaration order is dependency order: a kind may only reference kinds
/// declared before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    PostCode,
    Road,
    AccessAddress,
    UnitAddress,
}

impl EntityKind {
    /// All kinds in dependency order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::PostCode,
        EntityKind::Road,
        EntityKind::AccessAddress,
        EntityKind::UnitAddress,
    ];

    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::PostCode => "post_code",
            EntityKind::Road => "road",
            EntityKind::AccessAddress => "access_address",
            EntityKind::UnitAddress => "unit_address",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post_code" => Ok(EntityKind::PostCode),
            "road" => Ok(EntityKind::Road),
            "access_address" => Ok(EntityKind::AccessAddress),
            "unit_address" => Ok(EntityKind::UnitAddress),
            _ => Err(format!("Unknown entity kind: {s}")),
        }
    }
}
