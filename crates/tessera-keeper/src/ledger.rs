//! State-root ledger: anchored oracle store roots, one per remote height.
//!
//! Entries are append-only. The first root anchored at a height wins; a later,
//! different root for the same height is rejected rather than overwritten.

use crate::keys::oracle_state_root_key;
use crate::store::{KvStore, StoreError};
use tessera_core::Bytes32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No oracle state root anchored at height {height}")]
    NotFound { height: u64 },

    #[error("Height {height} is already anchored to {existing}, refusing {proposed}")]
    Conflict {
        height: u64,
        existing: Bytes32,
        proposed: Bytes32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What `put` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// The same root was already anchored; nothing was written.
    Unchanged,
}

pub fn has(store: &dyn KvStore, height: u64) -> Result<bool, StoreError> {
    store.has(&oracle_state_root_key(height))
}

pub fn get(store: &dyn KvStore, height: u64) -> Result<Bytes32, LedgerError> {
    let key = oracle_state_root_key(height);
    let bytes = store
        .get(&key)?
        .ok_or(LedgerError::NotFound { height })?;
    Bytes32::from_bytes(&bytes).map_err(|reason| {
        LedgerError::Store(StoreError::Corrupt {
            key: hex::encode(&key),
            reason: format!("{} (got {} bytes)", reason, bytes.len()),
        })
    })
}

/// Anchor `root` at `height`. Idempotent for an identical root.
///
/// Callers must hold exclusive access to `store` across this call so the
/// read-check-write is not interleaved with another anchor for the same height.
pub fn put(
    store: &mut dyn KvStore,
    height: u64,
    root: &Bytes32,
) -> Result<PutOutcome, LedgerError> {
    match get(store, height) {
        Ok(existing) if existing == *root => Ok(PutOutcome::Unchanged),
        Ok(existing) => Err(LedgerError::Conflict {
            height,
            existing,
            proposed: *root,
        }),
        Err(LedgerError::NotFound { .. }) => {
            store.set(&oracle_state_root_key(height), root.as_bytes())?;
            Ok(PutOutcome::Inserted)
        }
        Err(e) => Err(e),
    }
}
