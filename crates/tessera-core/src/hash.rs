//! Hash primitives and canonical byte encodings.
//!
//! Every commitment on the remote chain is built from SHA256 over byte strings
//! produced by the helpers here. The encodings must be byte-identical to the
//! remote chain's own, otherwise every downstream hash is meaningless.

use sha2::{Digest, Sha256};

/// Length of every digest handled by this crate.
pub const HASH_LEN: usize = 32;

/// Upper bound on the size of a LEB128-encoded 64-bit integer.
pub const MAX_VARINT_LEN: usize = 10;

/// RFC-6962 domain separation prefixes used by the remote chain's simple Merkle tree.
const LEAF_PREFIX: u8 = 0x00;
const INNER_PREFIX: u8 = 0x01;

/// SHA256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA256 over the concatenation of several byte strings, without allocating.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA256 applied twice. Store roots enter the multistore tree this way.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Hash of a terminal node: `sha256(0x00 ++ data)`.
pub fn leaf_hash(data: &[u8]) -> [u8; 32] {
    sha256_concat(&[&[LEAF_PREFIX], data])
}

/// Hash of an inner node: `sha256(0x01 ++ left ++ right)`.
pub fn inner_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    sha256_concat(&[&[INNER_PREFIX], left, right])
}

/// Fixed 8-byte big-endian encoding, used for request ids inside record keys.
pub fn fixed_be64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Append the unsigned LEB128 encoding of `value` to `out`.
pub fn encode_uvarint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Append the signed (zig-zag) LEB128 encoding of `value` to `out`.
pub fn encode_varint(value: i64, out: &mut Vec<u8>) {
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    encode_uvarint(zigzag, out);
}

/// Unsigned LEB128 encoding of `value`.
pub fn uvarint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    encode_uvarint(value, &mut out);
    out
}

/// Signed zig-zag LEB128 encoding of `value`.
pub fn varint(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    encode_varint(value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_uvarint_vectors() {
        assert_eq!(uvarint(0), vec![0x00]);
        assert_eq!(uvarint(1), vec![0x01]);
        assert_eq!(uvarint(127), vec![0x7f]);
        assert_eq!(uvarint(128), vec![0x80, 0x01]);
        assert_eq!(uvarint(300), vec![0xac, 0x02]);
        assert_eq!(uvarint(1160), vec![0x88, 0x09]);
        assert_eq!(uvarint(4065), vec![0xe1, 0x1f]);
        assert_eq!(uvarint(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_varint_zigzag_vectors() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(-1), vec![0x01]);
        assert_eq!(varint(1), vec![0x02]);
        assert_eq!(varint(51), vec![0x66]);
        assert_eq!(varint(127), vec![0xfe, 0x01]);
        assert_eq!(varint(1455), vec![0xde, 0x16]);
        assert_eq!(varint(4065), vec![0xc2, 0x3f]);
    }

    #[test]
    fn test_fixed_be64() {
        assert_eq!(fixed_be64(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(fixed_be64(0x0102_0304_0506_0708), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256(b""),
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(sha256_concat(&[b"ab", b"c"]), sha256(b"abc"));
    }

    #[test]
    fn test_leaf_and_inner_hash_vectors() {
        // The empty leaf hash shows up verbatim as lastResultsHash in real headers.
        assert_eq!(
            leaf_hash(b""),
            hex!("6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d")
        );
        assert_eq!(
            inner_hash(&[0u8; 32], &[0u8; 32]),
            hex!("ae0798d0ecaed2b778eddebf18f071a561c53658c05e76cedecc27cafbdbc577")
        );
    }

    #[test]
    fn test_inner_hash_order_matters() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(inner_hash(&a, &b), inner_hash(&b, &a));
        assert_ne!(inner_hash(&a, &b), leaf_hash(&[a, b].concat()));
    }
}
