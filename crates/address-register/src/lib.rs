//! # Address Register
//!
//! Event-sourced register of post codes, roads, access addresses and unit
//! addresses.
//!
//! Each aggregate validates its own state transitions and records
//! [`AddressEvent`]s for every accepted change. An [`AddressStore`] persists
//! those events and keeps the [`AddressIndex`] projection in step, so the
//! external-id lookups it serves always reflect the last successful write.
//!
//! ```
//! use address_register::{EntityKind, PostCode, PostCodeId};
//!
//! let post_code = PostCode::create(PostCodeId::new(), "8000", "Aarhus C", None, None).unwrap();
//! assert_eq!(post_code.number(), "8000");
//! assert_eq!(post_code.kind(), EntityKind::PostCode);
//! ```

pub mod access_address;
pub mod error;
pub mod event;
pub mod ids;
pub mod index;
pub mod post_code;
pub mod road;
pub mod status;
pub mod store;
pub mod unit_address;

pub use access_address::{AccessAddress, AccessAddressFields};
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use event::AddressEvent;
pub use ids::{AccessAddressId, EntityKind, ParseIdError, PostCodeId, RoadId, UnitAddressId};
pub use index::AddressIndex;
pub use post_code::PostCode;
pub use road::Road;
pub use status::{AddressStatus, RoadStatus};
pub use store::{AddressEntity, AddressStore, EntityIndex, InMemoryAddressStore};
pub use unit_address::{UnitAddress, UnitAddressFields};
