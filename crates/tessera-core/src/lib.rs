//! # Tessera Core
//!
//! Pure Rust verification of oracle state relayed from a remote chain.
//!
//! This crate contains **no storage** and **no I/O**. Every function is
//! deterministic: identical proofs always produce identical results.
//!
//! ## Trust Model
//!
//! - **Anchoring** (`anchor` module): rebuilds the remote block header from six
//!   header-part hashes, the height and the app hash derived from the oracle
//!   store root, then checks that more than a configured fraction of the known
//!   validator set signed it (secp256k1 ECDSA over SHA256).
//!
//! - **Inclusion** (`inclusion` module): replays an IAVL Merkle path from an
//!   oracle record's leaf. The result is only meaningful when compared against
//!   a root that was anchored first.
//!
//! ## Usage
//!
//! ```ignore
//! use tessera_core::anchor::{evaluate_anchor, QuorumThreshold};
//! use tessera_core::inclusion::verify_data_proof;
//! ```

pub mod anchor;
pub mod hash;
pub mod inclusion;
pub mod types;

pub use anchor::{
    evaluate_anchor, header::build_app_hash, header::reconstruct_header,
    quorum::{tally_signatures, verify_quorum, QuorumTally, QuorumThreshold},
    AnchorEvaluation,
};
pub use inclusion::{
    data::{verify_data_proof, InclusionError},
    merkle::replay,
};
pub use types::*;
