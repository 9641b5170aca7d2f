use crate::types::bytes::{Bytes32, HexBytes};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upper bound on the number of steps in an inclusion path.
/// IAVL trees are balanced, so 64 levels covers any realistic store.
pub const DEFAULT_MAX_PATH_LEN: usize = 64;

/// Default upper bound on the number of signatures in an anchor proof.
/// Each signature is checked against every validator key.
pub const DEFAULT_MAX_SIGNATURES: usize = 128;

/// Structural problems found in a proof before any hashing happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("Anchor proof carries no validator signatures")]
    NoSignatures,

    #[error("Anchor proof carries {count} signatures, maximum is {max}")]
    TooManySignatures { count: usize, max: usize },

    #[error("Merkle path has {len} steps, maximum is {max}")]
    PathTooLong { len: usize, max: usize },

    #[error("Merkle step {index} has subtree height {height}, not above previous height {previous}")]
    NonIncreasingHeight {
        index: usize,
        height: u8,
        previous: u8,
    },

    #[error("Field {field} value {value} does not fit a signed 64-bit integer")]
    ValueOutOfRange { field: &'static str, value: u64 },

    #[error("Signature {index} has invalid recovery id {v} (expected 0, 1, 27 or 28)")]
    InvalidRecoveryId { index: usize, v: u8 },

    #[error("Block height {height} is not a valid remote chain height")]
    InvalidHeight { height: u64 },
}

/// One level of a leaf-to-root IAVL inclusion path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleStep {
    /// Whether the sibling subtree sits to the right of the node being proven.
    /// The relayer encodes the opposite flag (`isDataOnRight`).
    #[serde(rename = "isDataOnRight", with = "inverted_flag")]
    pub sibling_is_right: bool,
    /// Height of the parent node in the IAVL tree.
    pub subtree_height: u8,
    /// Number of leaves under the parent node.
    pub subtree_size: u64,
    /// Version at which the parent node was last written.
    pub subtree_version: u64,
    /// Hash of the sibling subtree.
    pub sibling_hash: Bytes32,
}

/// A single oracle result as committed in the remote chain's oracle store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// IAVL version at which the record was written.
    #[serde(rename = "version")]
    pub schema_version: u64,
    #[serde(rename = "requestID")]
    pub request_id: u64,
    #[serde(rename = "codeHash")]
    pub code_hash: Bytes32,
    pub params: HexBytes,
    /// Raw result bytes produced by the oracle script.
    #[serde(rename = "data")]
    pub payload: HexBytes,
}

/// A data record together with its inclusion path, without a height.
/// This is the shape the relayer embeds inside a full report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleDataProof {
    #[serde(flatten)]
    pub record: DataRecord,
    #[serde(rename = "merklePaths")]
    pub path: Vec<MerkleStep>,
}

impl OracleDataProof {
    /// Bind this proof to the height whose oracle root it should replay to.
    pub fn at_height(&self, block_height: u64) -> DataInclusionProof {
        DataInclusionProof {
            block_height,
            record: self.record.clone(),
            path: self.path.clone(),
        }
    }
}

/// Proof that a data record is included in the oracle store at `block_height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInclusionProof {
    #[serde(rename = "blockHeight")]
    pub block_height: u64,
    #[serde(flatten)]
    pub record: DataRecord,
    #[serde(rename = "merklePaths")]
    pub path: Vec<MerkleStep>,
}

impl DataInclusionProof {
    /// Reject structurally invalid proofs before any hashing.
    pub fn validate(&self, max_path_len: usize) -> Result<(), ProofError> {
        validate_height(self.block_height)?;
        check_i64("version", self.record.schema_version)?;

        if self.path.len() > max_path_len {
            return Err(ProofError::PathTooLong {
                len: self.path.len(),
                max: max_path_len,
            });
        }

        // Leaves sit at height 0, so the first step must be at least 1.
        let mut previous = 0u8;
        for (index, step) in self.path.iter().enumerate() {
            if step.subtree_height <= previous {
                return Err(ProofError::NonIncreasingHeight {
                    index,
                    height: step.subtree_height,
                    previous,
                });
            }
            previous = step.subtree_height;
            check_i64("subtreeSize", step.subtree_size)?;
            check_i64("subtreeVersion", step.subtree_version)?;
        }
        Ok(())
    }
}

/// The six header field groups the remote chain commits in its header tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderParts {
    pub version_and_chain_id_hash: Bytes32,
    pub time_hash: Bytes32,
    pub tx_count_and_last_block_info_hash: Bytes32,
    pub consensus_data_hash: Bytes32,
    pub last_results_hash: Bytes32,
    pub evidence_and_proposer_hash: Bytes32,
}

/// One validator's ECDSA signature over the canonical vote bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub r: Bytes32,
    pub s: Bytes32,
    /// Recovery id as produced by the relayer (27/28, or 0/1).
    #[serde(rename = "v")]
    pub recovery_id: u8,
    /// Vote bytes that follow the header hash in the signed message.
    #[serde(rename = "signedDataSuffix")]
    pub message_suffix: HexBytes,
}

/// Everything needed to anchor the oracle store root at one height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorProof {
    #[serde(rename = "oracleIAVLStateHash")]
    pub oracle_state_root: Bytes32,
    #[serde(rename = "otherStoresMerkleHash")]
    pub other_modules_root: Bytes32,
    #[serde(rename = "supplyStoresMerkleHash")]
    pub supply_module_root: Bytes32,
    #[serde(rename = "blockHeaderMerkleParts")]
    pub header: HeaderParts,
    /// Vote bytes that precede the header hash in every signed message.
    #[serde(rename = "signedDataPrefix")]
    pub signature_prefix: HexBytes,
    pub signatures: Vec<ValidatorSignature>,
}

impl AnchorProof {
    /// Reject structurally invalid anchor proofs before any hashing.
    pub fn validate(&self, block_height: u64, max_signatures: usize) -> Result<(), ProofError> {
        validate_height(block_height)?;
        if self.signatures.is_empty() {
            return Err(ProofError::NoSignatures);
        }
        if self.signatures.len() > max_signatures {
            return Err(ProofError::TooManySignatures {
                count: self.signatures.len(),
                max: max_signatures,
            });
        }
        for (index, sig) in self.signatures.iter().enumerate() {
            if !matches!(sig.recovery_id, 0 | 1 | 27 | 28) {
                return Err(ProofError::InvalidRecoveryId {
                    index,
                    v: sig.recovery_id,
                });
            }
        }
        Ok(())
    }
}

/// A complete relayer submission: anchor the height, then prove one record under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReport {
    pub block_height: u64,
    pub oracle_data_proof: OracleDataProof,
    pub block_relay_proof: AnchorProof,
}

impl RelayReport {
    pub fn data_inclusion_proof(&self) -> DataInclusionProof {
        self.oracle_data_proof.at_height(self.block_height)
    }
}

/// Heights are int64 on the remote chain and start at 1.
fn validate_height(height: u64) -> Result<(), ProofError> {
    if height == 0 || height > i64::MAX as u64 {
        return Err(ProofError::InvalidHeight { height });
    }
    Ok(())
}

fn check_i64(field: &'static str, value: u64) -> Result<(), ProofError> {
    if value > i64::MAX as u64 {
        return Err(ProofError::ValueOutOfRange { field, value });
    }
    Ok(())
}

mod inverted_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(!*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        bool::deserialize(deserializer).map(|flag| !flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(height: u8) -> MerkleStep {
        MerkleStep {
            sibling_is_right: false,
            subtree_height: height,
            subtree_size: 2,
            subtree_version: 1,
            sibling_hash: Bytes32([0x11; 32]),
        }
    }

    fn proof(path: Vec<MerkleStep>) -> DataInclusionProof {
        DataInclusionProof {
            block_height: 10,
            record: DataRecord {
                schema_version: 1,
                request_id: 1,
                code_hash: Bytes32([0x22; 32]),
                params: HexBytes::default(),
                payload: HexBytes::default(),
            },
            path,
        }
    }

    #[test]
    fn test_merkle_step_json_inverts_data_flag() {
        let json = r#"{
            "isDataOnRight": true,
            "subtreeHeight": 1,
            "subtreeSize": 2,
            "subtreeVersion": 51,
            "siblingHash": "81C8ADD6C13611F5416CA722C98815846504D7D2A77777B15D4D4212902F7785"
        }"#;
        let step: MerkleStep = serde_json::from_str(json).unwrap();
        assert!(!step.sibling_is_right);
        assert_eq!(step.subtree_version, 51);

        let back = serde_json::to_value(&step).unwrap();
        assert_eq!(back["isDataOnRight"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_data_inclusion_proof_json_shape() {
        let json = r#"{
            "blockHeight": 1456,
            "version": 51,
            "requestID": 1,
            "codeHash": "0874EE3E5ABA7AE0EB8CB43BFEBED358826D111CECE0EF0F804E99EEA9264060",
            "params": "706172616D73",
            "data": "00000000000AEAD8",
            "merklePaths": []
        }"#;
        let proof: DataInclusionProof = serde_json::from_str(json).unwrap();
        assert_eq!(proof.block_height, 1456);
        assert_eq!(proof.record.schema_version, 51);
        assert_eq!(&*proof.record.params, b"params");
        assert!(proof.path.is_empty());
    }

    #[test]
    fn test_validate_accepts_increasing_heights() {
        assert!(proof(vec![step(1), step(2), step(4)]).validate(DEFAULT_MAX_PATH_LEN).is_ok());
        assert!(proof(vec![]).validate(DEFAULT_MAX_PATH_LEN).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_increasing_heights() {
        let err = proof(vec![step(1), step(1)])
            .validate(DEFAULT_MAX_PATH_LEN)
            .unwrap_err();
        assert_eq!(
            err,
            ProofError::NonIncreasingHeight {
                index: 1,
                height: 1,
                previous: 1
            }
        );
        assert!(proof(vec![step(0)]).validate(DEFAULT_MAX_PATH_LEN).is_err());
    }

    #[test]
    fn test_validate_rejects_long_path() {
        let path = (1..=5).map(step).collect();
        assert_eq!(
            proof(path).validate(4),
            Err(ProofError::PathTooLong { len: 5, max: 4 })
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut big = step(1);
        big.subtree_version = u64::MAX;
        assert!(matches!(
            proof(vec![big]).validate(DEFAULT_MAX_PATH_LEN),
            Err(ProofError::ValueOutOfRange {
                field: "subtreeVersion",
                ..
            })
        ));

        let mut p = proof(vec![]);
        p.block_height = 0;
        assert_eq!(
            p.validate(DEFAULT_MAX_PATH_LEN),
            Err(ProofError::InvalidHeight { height: 0 })
        );
    }

    fn signature(recovery_id: u8) -> ValidatorSignature {
        ValidatorSignature {
            r: Bytes32([0x01; 32]),
            s: Bytes32([0x02; 32]),
            recovery_id,
            message_suffix: HexBytes::default(),
        }
    }

    fn anchor(signatures: Vec<ValidatorSignature>) -> AnchorProof {
        let zero = Bytes32([0; 32]);
        AnchorProof {
            oracle_state_root: zero,
            other_modules_root: zero,
            supply_module_root: zero,
            header: HeaderParts {
                version_and_chain_id_hash: zero,
                time_hash: zero,
                tx_count_and_last_block_info_hash: zero,
                consensus_data_hash: zero,
                last_results_hash: zero,
                evidence_and_proposer_hash: zero,
            },
            signature_prefix: HexBytes::default(),
            signatures,
        }
    }

    #[test]
    fn test_anchor_validate_accepts_known_recovery_ids() {
        let sigs = [0, 1, 27, 28].into_iter().map(signature).collect();
        assert_eq!(anchor(sigs).validate(10, DEFAULT_MAX_SIGNATURES), Ok(()));
    }

    #[test]
    fn test_anchor_validate_rejects_unknown_recovery_id() {
        let sigs = vec![signature(27), signature(5)];
        assert_eq!(
            anchor(sigs).validate(10, DEFAULT_MAX_SIGNATURES),
            Err(ProofError::InvalidRecoveryId { index: 1, v: 5 })
        );
    }

    #[test]
    fn test_anchor_validate_rejects_too_many_signatures() {
        let sigs = vec![signature(27); 5];
        assert_eq!(
            anchor(sigs.clone()).validate(10, 4),
            Err(ProofError::TooManySignatures { count: 5, max: 4 })
        );
        assert_eq!(anchor(sigs).validate(10, 5), Ok(()));
    }

    #[test]
    fn test_anchor_validate_rejects_empty_and_bad_height() {
        assert_eq!(
            anchor(vec![]).validate(10, DEFAULT_MAX_SIGNATURES),
            Err(ProofError::NoSignatures)
        );
        assert_eq!(
            anchor(vec![signature(27)]).validate(0, DEFAULT_MAX_SIGNATURES),
            Err(ProofError::InvalidHeight { height: 0 })
        );
    }
}
