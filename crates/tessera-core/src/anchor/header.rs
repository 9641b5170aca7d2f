use crate::hash::{double_sha256, inner_hash, leaf_hash, uvarint};
use crate::types::proof::{AnchorProof, HeaderParts};

/// The oracle store's entry in the remote multistore tree starts with these bytes:
/// the length-prefixed store name `zoracle` and the 32-byte length tag of its value.
pub const ORACLE_STORE_PREFIX: [u8; 9] = [0x07, b'z', b'o', b'r', b'a', b'c', b'l', b'e', 0x20];

/// Length tag of the app hash inside its header leaf.
const APP_HASH_TAG: u8 = 32;

/// Derive the remote chain's app hash from the three store roots.
///
/// ```text
/// inner(other, inner(supply, leaf(ORACLE_STORE_PREFIX ++ sha256(sha256(oracle)))))
/// ```
pub fn build_app_hash(
    oracle_root: &[u8; 32],
    other_root: &[u8; 32],
    supply_root: &[u8; 32],
) -> [u8; 32] {
    let mut oracle_leaf = Vec::with_capacity(ORACLE_STORE_PREFIX.len() + 32);
    oracle_leaf.extend_from_slice(&ORACLE_STORE_PREFIX);
    oracle_leaf.extend_from_slice(&double_sha256(oracle_root));

    inner_hash(other_root, &inner_hash(supply_root, &leaf_hash(&oracle_leaf)))
}

/// Rebuild the header hash that validators sign at `height`.
///
/// The header tree has a fixed shape; the relayer supplies the subtrees that do
/// not depend on the height or the app hash.
pub fn reconstruct_header(height: u64, app_hash: &[u8; 32], parts: &HeaderParts) -> [u8; 32] {
    let height_leaf = leaf_hash(&uvarint(height));

    let mut app_leaf = Vec::with_capacity(33);
    app_leaf.push(APP_HASH_TAG);
    app_leaf.extend_from_slice(app_hash);
    let app_leaf = leaf_hash(&app_leaf);

    // Left half: version/chain id, height, time, tx counts and last block info.
    let left = inner_hash(
        &inner_hash(
            parts.version_and_chain_id_hash.as_bytes(),
            &inner_hash(&height_leaf, parts.time_hash.as_bytes()),
        ),
        parts.tx_count_and_last_block_info_hash.as_bytes(),
    );

    // Right half: consensus data, app hash, last results, evidence and proposer.
    let right = inner_hash(
        parts.consensus_data_hash.as_bytes(),
        &inner_hash(
            &inner_hash(&app_leaf, parts.last_results_hash.as_bytes()),
            parts.evidence_and_proposer_hash.as_bytes(),
        ),
    );

    inner_hash(&left, &right)
}

impl AnchorProof {
    pub fn app_hash(&self) -> [u8; 32] {
        build_app_hash(
            self.oracle_state_root.as_bytes(),
            self.other_modules_root.as_bytes(),
            self.supply_module_root.as_bytes(),
        )
    }

    /// Header hash implied by this proof at `height`.
    pub fn header_hash(&self, height: u64) -> [u8; 32] {
        reconstruct_header(height, &self.app_hash(), &self.header)
    }
}
