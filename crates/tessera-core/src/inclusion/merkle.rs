use crate::hash::{encode_varint, sha256, MAX_VARINT_LEN};
use crate::types::proof::MerkleStep;

/// Length tag preceding each child hash inside an IAVL inner node.
const CHILD_HASH_TAG: u8 = 32;

impl MerkleStep {
    /// Hash of the IAVL inner node formed by `current` and this step's sibling.
    ///
    /// The node preimage is `varint(height) ++ varint(size) ++ varint(version)
    /// ++ 0x20 ++ left ++ 0x20 ++ right`. For every height below 64 the height
    /// varint is the single byte `height * 2`.
    pub fn parent_hash(&self, current: &[u8; 32]) -> [u8; 32] {
        let sibling = self.sibling_hash.as_bytes();
        let (left, right) = if self.sibling_is_right {
            (current, sibling)
        } else {
            (sibling, current)
        };

        let mut data = Vec::with_capacity(3 * MAX_VARINT_LEN + 2 + 64);
        encode_varint(i64::from(self.subtree_height), &mut data);
        encode_varint(self.subtree_size as i64, &mut data);
        encode_varint(self.subtree_version as i64, &mut data);
        data.push(CHILD_HASH_TAG);
        data.extend_from_slice(left);
        data.push(CHILD_HASH_TAG);
        data.extend_from_slice(right);
        sha256(&data)
    }
}

/// Fold an inclusion path into the candidate root, starting from `leaf`.
pub fn replay(leaf: [u8; 32], path: &[MerkleStep]) -> [u8; 32] {
    path.iter().fold(leaf, |current, step| step.parent_hash(&current))
}
