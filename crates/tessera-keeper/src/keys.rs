//! Store key layout.

use tessera_core::hash::encode_uvarint;

/// Key holding the serialized validator set.
pub const VALIDATORS_KEY: &[u8] = &[0x01];

/// Prefix for anchored oracle state roots, followed by `uvarint(height)`.
pub const ORACLE_STATE_ROOT_PREFIX: &[u8] = &[0x02];

pub fn oracle_state_root_key(height: u64) -> Vec<u8> {
    let mut key = ORACLE_STATE_ROOT_PREFIX.to_vec();
    encode_uvarint(height, &mut key);
    key
}
