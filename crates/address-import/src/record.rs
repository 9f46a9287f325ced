//! Records as delivered by the external registry feed.

use address_register::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Status reported by the registry for any entity kind.
///
/// Which values are valid depends on the kind; see
/// [`StatusClass::of`](crate::classifier::StatusClass::of).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalStatus {
    Active,
    Pending,
    Effective,
    Temporary,
    Discontinued,
    Canceled,
}

impl ExternalStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalStatus::Active => "active",
            ExternalStatus::Pending => "pending",
            ExternalStatus::Effective => "effective",
            ExternalStatus::Temporary => "temporary",
            ExternalStatus::Discontinued => "discontinued",
            ExternalStatus::Canceled => "canceled",
        }
    }
}

impl Display for ExternalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExternalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ExternalStatus::Active),
            "pending" => Ok(ExternalStatus::Pending),
            "effective" => Ok(ExternalStatus::Effective),
            "temporary" => Ok(ExternalStatus::Temporary),
            "discontinued" => Ok(ExternalStatus::Discontinued),
            "canceled" | "cancelled" => Ok(ExternalStatus::Canceled),
            _ => Err(format!("Unknown external status: {s}")),
        }
    }
}

/// Position of a change in the merged replay order.
///
/// Post code changes always sort first. A feed supplies either update
/// timestamps or sequence numbers for the other kinds, not a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingKey {
    Minimum,
    Timestamp(DateTime<Utc>),
    Sequence(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCodeRecord {
    pub number: String,
    pub name: String,
    pub status: ExternalStatus,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadRecord {
    pub id: String,
    pub name: String,
    pub status: ExternalStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub sequence: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressRecord {
    pub id: String,
    pub municipal_code: String,
    pub status: ExternalStatus,
    pub road_code: String,
    pub house_number: String,
    pub post_code_number: String,
    pub road_id: String,
    pub east_coordinate: f64,
    pub north_coordinate: f64,
    #[serde(default)]
    pub supplementary_town_name: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub sequence: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressRecord {
    pub id: String,
    pub access_address_id: String,
    pub status: ExternalStatus,
    #[serde(default)]
    pub floor_name: Option<String>,
    #[serde(default)]
    pub suite_name: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub sequence: Option<u64>,
}

/// One record from the feed, of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalRecord {
    PostCode(PostCodeRecord),
    Road(RoadRecord),
    AccessAddress(AccessAddressRecord),
    UnitAddress(UnitAddressRecord),
}

impl ExternalRecord {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            ExternalRecord::PostCode(_) => EntityKind::PostCode,
            ExternalRecord::Road(_) => EntityKind::Road,
            ExternalRecord::AccessAddress(_) => EntityKind::AccessAddress,
            ExternalRecord::UnitAddress(_) => EntityKind::UnitAddress,
        }
    }

    /// Registry-issued id. For post codes this is the number.
    #[must_use]
    pub fn external_id(&self) -> &str {
        match self {
            ExternalRecord::PostCode(r) => &r.number,
            ExternalRecord::Road(r) => &r.id,
            ExternalRecord::AccessAddress(r) => &r.id,
            ExternalRecord::UnitAddress(r) => &r.id,
        }
    }

    #[must_use]
    pub fn status(&self) -> ExternalStatus {
        match self {
            ExternalRecord::PostCode(r) => r.status,
            ExternalRecord::Road(r) => r.status,
            ExternalRecord::AccessAddress(r) => r.status,
            ExternalRecord::UnitAddress(r) => r.status,
        }
    }

    #[must_use]
    pub fn ordering_key(&self) -> OrderingKey {
        let (sequence, updated) = match self {
            ExternalRecord::PostCode(_) => return OrderingKey::Minimum,
            ExternalRecord::Road(r) => (r.sequence, r.updated),
            ExternalRecord::AccessAddress(r) => (r.sequence, r.updated),
            ExternalRecord::UnitAddress(r) => (r.sequence, r.updated),
        };
        sequence.map_or(OrderingKey::Timestamp(updated), OrderingKey::Sequence)
    }
}

impl From<PostCodeRecord> for ExternalRecord {
    fn from(value: PostCodeRecord) -> Self {
        ExternalRecord::PostCode(value)
    }
}

impl From<RoadRecord> for ExternalRecord {
    fn from(value: RoadRecord) -> Self {
        ExternalRecord::Road(value)
    }
}

impl From<AccessAddressRecord> for ExternalRecord {
    fn from(value: AccessAddressRecord) -> Self {
        ExternalRecord::AccessAddress(value)
    }
}

impl From<UnitAddressRecord> for ExternalRecord {
    fn from(value: UnitAddressRecord) -> Self {
        ExternalRecord::UnitAddress(value)
    }
}
