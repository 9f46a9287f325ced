//! # Address Import
//!
//! Keeps the local [`address_register`] synchronized with the external
//! address registry.
//!
//! - [`full_import::FullImportEngine`] bootstraps an empty register from a
//!   snapshot, kind by kind in dependency order.
//! - [`change_import::ChangeImportEngine`] replays the changes between two
//!   checkpoints.
//! - [`orchestrator::ImportOrchestrator`] decides which one to run and owns
//!   the checkpoint lifecycle.
//!
//! The feed client is supplied by the embedding application through
//! [`feed::AddressFeed`].

mod apply;
pub mod change_import;
pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod error;
pub mod feed;
pub mod full_import;
pub mod logging;
pub mod mapping;
pub mod orchestrator;
pub mod record;
pub mod resolver;
pub mod statistics;

pub use change_import::ChangeImportEngine;
pub use checkpoint::{
    Checkpoint, CheckpointRange, CheckpointStore, InMemoryCheckpointStore,
    PostgresCheckpointStore,
};
pub use classifier::{classify, ChangeOperation, StatusClass};
pub use config::{CheckpointMode, ConfigError, FeedCredentials, ImportConfig};
pub use error::{
    CheckpointError, CheckpointResult, FeedError, FeedResult, ImportError, ImportResult,
};
pub use feed::{AddressFeed, RecordStream};
pub use full_import::{FullImportEngine, FullImportSummary};
pub use orchestrator::{ImportOrchestrator, RunOutcome};
pub use record::{
    AccessAddressRecord, ExternalRecord, ExternalStatus, OrderingKey, PostCodeRecord, RoadRecord,
    UnitAddressRecord,
};
pub use resolver::{ReferenceSnapshot, Resolution};
pub use statistics::{ImportStatistics, KindCounts, Outcome};
