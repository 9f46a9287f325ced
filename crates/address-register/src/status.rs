//! Domain statuses stored on road and address aggregates.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Status of a road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadStatus {
    Effective,
    Temporary,
}

impl RoadStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadStatus::Effective => "effective",
            RoadStatus::Temporary => "temporary",
        }
    }
}

impl Display for RoadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of an access address or a unit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    Active,
    Pending,
    Discontinued,
    Canceled,
}

impl AddressStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressStatus::Active => "active",
            AddressStatus::Pending => "pending",
            AddressStatus::Discontinued => "discontinued",
            AddressStatus::Canceled => "canceled",
        }
    }
}

impl Display for AddressStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
