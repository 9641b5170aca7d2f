use crate::hash::{encode_uvarint, encode_varint, fixed_be64, sha256};
use crate::inclusion::merkle::replay;
use crate::types::proof::{DataInclusionProof, DataRecord};
use thiserror::Error;

/// Marker byte that opens every oracle result key in the remote oracle store.
pub const RESULT_KEY_PREFIX: u8 = 0xff;

/// Leaf height and size as zig-zag varints: height 0, size 1.
const LEAF_HEIGHT_AND_SIZE: [u8; 2] = [0x00, 0x02];

/// Length tag preceding the value hash inside an IAVL leaf.
const VALUE_HASH_TAG: u8 = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InclusionError {
    #[error("Inclusion proof failed at height {height}: computed root {computed} does not match anchored root {expected}")]
    RootMismatch {
        height: u64,
        computed: String,
        expected: String,
    },
}

impl DataRecord {
    /// Key under which the record is stored: `0xff ++ be64(requestID) ++ codeHash ++ params`.
    pub fn store_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + 8 + 32 + self.params.len());
        key.push(RESULT_KEY_PREFIX);
        key.extend_from_slice(&fixed_be64(self.request_id));
        key.extend_from_slice(self.code_hash.as_bytes());
        key.extend_from_slice(&self.params);
        key
    }

    /// IAVL leaf hash of this record.
    ///
    /// Preimage: `varint(0) ++ varint(1) ++ varint(version) ++ uvarint(len(key))
    /// ++ key ++ 0x20 ++ sha256(payload)`.
    pub fn leaf_hash(&self) -> [u8; 32] {
        let key = self.store_key();
        let mut data = Vec::with_capacity(key.len() + 64);
        data.extend_from_slice(&LEAF_HEIGHT_AND_SIZE);
        encode_varint(self.schema_version as i64, &mut data);
        encode_uvarint(key.len() as u64, &mut data);
        data.extend_from_slice(&key);
        data.push(VALUE_HASH_TAG);
        data.extend_from_slice(&sha256(&self.payload));
        sha256(&data)
    }
}

impl DataInclusionProof {
    /// The oracle store root this proof replays to.
    pub fn oracle_state_root(&self) -> [u8; 32] {
        replay(self.record.leaf_hash(), &self.path)
    }
}

/// Verify that `proof` replays to `anchored_root`. All or nothing.
pub fn verify_data_proof(
    proof: &DataInclusionProof,
    anchored_root: &[u8; 32],
) -> Result<(), InclusionError> {
    let computed = proof.oracle_state_root();
    if computed != *anchored_root {
        return Err(InclusionError::RootMismatch {
            height: proof.block_height,
            computed: hex::encode_upper(computed),
            expected: hex::encode_upper(anchored_root),
        });
    }
    Ok(())
}
