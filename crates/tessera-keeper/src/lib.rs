//! # Tessera Keeper
//!
//! Host-side state for relaying remote oracle data: the validator set, the
//! ledger of anchored oracle store roots, and the entry points a host calls.
//!
//! - `relay_oracle_state` anchors an oracle store root once its block header
//!   is signed by a quorum of the validator set.
//! - `verify_oracle_data` checks an oracle record against an anchored root.
//! - `report_price` does both for a full relayer report, then decodes the price.
//!
//! Storage is abstracted behind [`KvStore`]. [`RelayService`] wraps a store in
//! a lock for concurrent callers.

pub mod config;
pub mod keeper;
pub mod keys;
pub mod ledger;
pub mod price;
pub mod service;
pub mod store;
pub mod validators;

pub use config::{ConfigError, RelayConfig};
pub use keeper::{AnchorOutcome, CheckedAnchor, OracleRelayKeeper, RelayError};
pub use price::{decode_price, PriceError, PriceReport, ScaledPrice};
pub use service::RelayService;
pub use store::{KvStore, MemoryStore, StoreError, StoreOverlay};
