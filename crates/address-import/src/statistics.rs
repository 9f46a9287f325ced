//! Per-run import statistics.

use address_register::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Inserted,
    Updated,
    Deleted,
    /// The register already reflected the record.
    NoOp,
    /// Dropped for data-quality reasons: unresolved reference or orphaned
    /// tombstone.
    Skipped,
    /// Refused by a register rule the import does not treat as fatal.
    Rejected,
}

impl Outcome {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Inserted => "inserted",
            Outcome::Updated => "updated",
            Outcome::Deleted => "deleted",
            Outcome::NoOp => "no_op",
            Outcome::Skipped => "skipped",
            Outcome::Rejected => "rejected",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome counters for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    #[serde(default)]
    pub inserted: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub no_op: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub rejected: u64,
}

impl KindCounts {
    pub fn record(&mut self, outcome: Outcome) {
        self.add(outcome, 1);
    }

    pub fn add(&mut self, outcome: Outcome, count: u64) {
        let slot = match outcome {
            Outcome::Inserted => &mut self.inserted,
            Outcome::Updated => &mut self.updated,
            Outcome::Deleted => &mut self.deleted,
            Outcome::NoOp => &mut self.no_op,
            Outcome::Skipped => &mut self.skipped,
            Outcome::Rejected => &mut self.rejected,
        };
        *slot += count;
    }

    #[must_use]
    pub fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Inserted => self.inserted,
            Outcome::Updated => self.updated,
            Outcome::Deleted => self.deleted,
            Outcome::NoOp => self.no_op,
            Outcome::Skipped => self.skipped,
            Outcome::Rejected => self.rejected,
        }
    }

    /// Records seen, whatever their outcome.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted + self.no_op + self.skipped + self.rejected
    }

    pub fn merge(&mut self, other: &KindCounts) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.no_op += other.no_op;
        self.skipped += other.skipped;
        self.rejected += other.rejected;
    }
}

/// Statistics for an import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStatistics {
    /// Counters broken down by entity kind.
    #[serde(default)]
    pub by_kind: BTreeMap<EntityKind, KindCounts>,
    /// Wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl ImportStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EntityKind, outcome: Outcome) {
        self.by_kind.entry(kind).or_default().record(outcome);
    }

    pub fn add(&mut self, kind: EntityKind, outcome: Outcome, count: u64) {
        self.by_kind.entry(kind).or_default().add(outcome, count);
    }

    /// Counters for one kind; zero when nothing was recorded.
    #[must_use]
    pub fn counts(&self, kind: EntityKind) -> KindCounts {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }

    /// Sum of one outcome across every kind.
    #[must_use]
    pub fn total(&self, outcome: Outcome) -> u64 {
        self.by_kind.values().map(|counts| counts.get(outcome)).sum()
    }

    /// Records seen across every kind.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.by_kind.values().map(KindCounts::total).sum()
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }

    /// Merge with another statistics instance.
    pub fn merge(&mut self, other: &ImportStatistics) {
        for (kind, counts) in &other.by_kind {
            self.by_kind.entry(*kind).or_default().merge(counts);
        }
        self.duration_ms += other.duration_ms;
    }
}
