use crate::types::proof::{AnchorProof, ValidatorSignature};
use crate::types::validators::ValidatorSet;
use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fraction of the validator set whose signatures must verify.
/// Quorum is reached when `signed / total` is strictly greater than
/// `numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumThreshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl QuorumThreshold {
    /// More than two thirds, the remote chain's own commit rule.
    pub const TWO_THIRDS: Self = Self {
        numerator: 2,
        denominator: 3,
    };

    pub fn is_met(&self, signed: usize, total: usize) -> bool {
        if total == 0 || self.denominator == 0 {
            return false;
        }
        (signed as u128) * u128::from(self.denominator)
            > (total as u128) * u128::from(self.numerator)
    }

    /// Smallest number of distinct signers that meets the threshold for `total` validators.
    pub fn required(&self, total: usize) -> usize {
        if self.denominator == 0 {
            return total + 1;
        }
        let floor = (total as u128) * u128::from(self.numerator) / u128::from(self.denominator);
        floor as usize + 1
    }
}

impl Default for QuorumThreshold {
    fn default() -> Self {
        Self::TWO_THIRDS
    }
}

/// Outcome of checking an anchor proof's signatures against a validator set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuorumTally {
    /// Indices (into the validator set) of validators with a verifying signature.
    pub signers: Vec<usize>,
    pub required: usize,
    pub total: usize,
    reached: bool,
}

impl QuorumTally {
    pub fn signed(&self) -> usize {
        self.signers.len()
    }

    pub fn is_reached(&self) -> bool {
        self.reached
    }
}

/// The exact bytes a validator signs: `prefix ++ header ++ suffix`.
pub fn signed_message(prefix: &[u8], header: &[u8; 32], suffix: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(prefix.len() + 32 + suffix.len());
    message.extend_from_slice(prefix);
    message.extend_from_slice(header);
    message.extend_from_slice(suffix);
    message
}

/// Count the distinct validators whose signatures over `header` verify.
///
/// Signatures that match no key, cannot be decoded, or are not low-S
/// normalized are discarded. A validator that signs more than once counts once.
pub fn tally_signatures(
    header: &[u8; 32],
    proof: &AnchorProof,
    validators: &ValidatorSet,
    threshold: QuorumThreshold,
) -> QuorumTally {
    let keys: Vec<Option<VerifyingKey>> = validators
        .pubkeys
        .iter()
        .map(|pk| pk.verifying_key().ok())
        .collect();
    let mut has_signed = vec![false; keys.len()];

    for (index, sig) in proof.signatures.iter().enumerate() {
        let Some(signature) = decode_signature(sig) else {
            debug!(index, "Discarding undecodable or high-S signature");
            continue;
        };
        let message = signed_message(&proof.signature_prefix, header, &sig.message_suffix);

        let matched = keys.iter().position(|key| {
            key.as_ref()
                .is_some_and(|key| key.verify(&message, &signature).is_ok())
        });
        match matched {
            Some(validator) if has_signed[validator] => {
                debug!(index, validator, "Duplicate signature from validator");
            }
            Some(validator) => has_signed[validator] = true,
            None => debug!(index, "Signature matches no known validator"),
        }
    }

    let signers: Vec<usize> = has_signed
        .iter()
        .enumerate()
        .filter_map(|(i, signed)| signed.then_some(i))
        .collect();
    let total = validators.len();

    QuorumTally {
        reached: threshold.is_met(signers.len(), total),
        required: threshold.required(total),
        total,
        signers,
    }
}

/// Whether the distinct verifying signers over `header` reach `threshold`.
pub fn verify_quorum(
    header: &[u8; 32],
    proof: &AnchorProof,
    validators: &ValidatorSet,
    threshold: QuorumThreshold,
) -> bool {
    tally_signatures(header, proof, validators, threshold).is_reached()
}

fn decode_signature(sig: &ValidatorSignature) -> Option<Signature> {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(sig.r.as_bytes());
    bytes[32..].copy_from_slice(sig.s.as_bytes());
    let signature = Signature::from_slice(&bytes).ok()?;
    // Only low-S signatures are canonical on the remote chain.
    if signature.normalize_s().is_some() {
        return None;
    }
    Some(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bytes32, HeaderParts, HexBytes, ValidatorPubKey};
    use hex_literal::hex;

    const PUBKEYS: [&str; 4] = [
        "03f57f3997a4e81d8f321e9710927e22c2e6d30fb6d8f749a9e4a07afb3b3b7909",
        "02724ae29cfeb7497051d09edfd8e822352c4c8361b757647645b78c8cc74ce885",
        "03a54ffaa84c8f2f798782de8b962a84784e288487a747813a0857243a60e2ba33",
        "03d03708f161d1583f49e4260a42b2b08d3ba186d7803a23cc3acd12f074d9d76f",
    ];

    const HEADER_1160: [u8; 32] =
        hex!("5FFB90E0A8F43830864E312B0D39EBC9C6D19F6A27DC1E3D8558367E66D1E229");

    const SUFFIX_1160: [u8; 63] = hex!("12240A20B0E9D07640EE2E758D01EA69E0733276D90946B0E7D11FE86067F97BAB1CC11B10012A0C08CBBAB8F00510B8C48F8902320962616E64636861696E");

    fn validators() -> ValidatorSet {
        ValidatorSet::new(
            1,
            PUBKEYS
                .iter()
                .map(|pk| ValidatorPubKey::from_hex(pk).unwrap())
                .collect(),
        )
    }

    fn sig(r: [u8; 32], s: [u8; 32], v: u8) -> ValidatorSignature {
        ValidatorSignature {
            r: Bytes32(r),
            s: Bytes32(s),
            recovery_id: v,
            message_suffix: HexBytes::from(SUFFIX_1160),
        }
    }

    /// Signatures are listed in relayer order; they were produced by validators 2, 1, 0, 3.
    fn signatures_1160() -> Vec<ValidatorSignature> {
        vec![
            sig(
                hex!("B88E0A2054A96A6775A9F5D1FA23B6FFA41274DD35C6431DAB0977F8CE4FB480"),
                hex!("3D759EFF85E17601624D560A8ACD70E782EA23B58C2E718FAC98EBF488750A86"),
                28,
            ),
            sig(
                hex!("17A66FF70C81C6A9C3040C1037CCC4EE9319E184D40956DC0DC30C1318901D36"),
                hex!("4A4C0C9BF150967CE25C724E613DF6BE0C401B84AA29DE8599963F52A7DFA940"),
                27,
            ),
            sig(
                hex!("453498042685AB34C627B5652E2F1FAD839C21DB3CEE4E01822F00885F1E0321"),
                hex!("679781C8F2E3597ED3DF15E8E44B9CAF17D74894F0D4E22CD0F8C7CC1CB43963"),
                27,
            ),
            sig(
                hex!("174505557E61260C06C7FD8962FF485BEBAD68E91B00C225452962B1FCBF1114"),
                hex!("39B37ACD1759D47B09D18C6C3144EAB5B2D2CA34347DC60A4D58B369730C0DB9"),
                27,
            ),
        ]
    }

    fn proof(signatures: Vec<ValidatorSignature>) -> AnchorProof {
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
            signature_prefix: HexBytes::from(hex!("6E080211880400000000000022480A20")),
            signatures,
        }
    }

    #[test]
    fn test_threshold_arithmetic() {
        let t = QuorumThreshold::TWO_THIRDS;
        assert!(!t.is_met(2, 4));
        assert!(t.is_met(3, 4));
        assert!(!t.is_met(2, 3));
        assert!(t.is_met(1, 1));
        assert!(!t.is_met(0, 0));
        assert_eq!(t.required(4), 3);
        assert_eq!(t.required(3), 3);
        assert_eq!(t.required(1), 1);
        assert_eq!(t.required(100), 67);
    }

    #[test]
    fn test_real_signatures_reach_quorum() {
        let tally = tally_signatures(
            &HEADER_1160,
            &proof(signatures_1160()),
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        );
        assert_eq!(tally.signers, vec![0, 1, 2, 3]);
        assert_eq!(tally.total, 4);
        assert!(tally.is_reached());
    }

    #[test]
    fn test_two_of_four_is_below_quorum() {
        let two = signatures_1160().into_iter().take(2).collect();
        let tally = tally_signatures(
            &HEADER_1160,
            &proof(two),
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        );
        assert_eq!(tally.signed(), 2);
        assert_eq!(tally.required, 3);
        assert!(!tally.is_reached());
    }

    #[test]
    fn test_duplicate_signatures_count_once() {
        let first = signatures_1160().remove(0);
        let dupes = vec![first.clone(), first.clone(), first];
        let tally = tally_signatures(
            &HEADER_1160,
            &proof(dupes),
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        );
        assert_eq!(tally.signers, vec![2]);
        assert!(!tally.is_reached());
    }

    #[test]
    fn test_wrong_header_fails() {
        let mut header = HEADER_1160;
        header[31] ^= 0x01;
        assert!(!verify_quorum(
            &header,
            &proof(signatures_1160()),
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        ));
    }

    #[test]
    fn test_wrong_prefix_fails() {
        let mut p = proof(signatures_1160());
        p.signature_prefix = HexBytes::default();
        assert!(!verify_quorum(
            &HEADER_1160,
            &p,
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        ));
    }

    #[test]
    fn test_empty_validator_set_never_reaches_quorum() {
        assert!(!verify_quorum(
            &HEADER_1160,
            &proof(signatures_1160()),
            &ValidatorSet::default(),
            QuorumThreshold::TWO_THIRDS,
        ));
    }

    #[test]
    fn test_garbage_signatures_are_discarded() {
        let mut sigs = signatures_1160();
        sigs[0].r = Bytes32([0; 32]); // zero scalar cannot decode
        sigs[1].s = Bytes32([0xff; 32]); // above the curve order
        let tally = tally_signatures(
            &HEADER_1160,
            &proof(sigs),
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        );
        assert_eq!(tally.signers, vec![0, 3]);
    }

    #[test]
    fn test_high_s_signature_is_rejected() {
        // n - s for a valid low-S signature verifies mathematically but is malleable.
        const ORDER: [u8; 32] =
            hex!("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141");
        let mut sigs = signatures_1160();
        let s = sigs[0].s.0;
        let mut high = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let diff = ORDER[i] as i16 - s[i] as i16 - borrow;
            borrow = i16::from(diff < 0);
            high[i] = diff.rem_euclid(256) as u8;
        }
        sigs[0].s = Bytes32(high);
        let tally = tally_signatures(
            &HEADER_1160,
            &proof(sigs),
            &validators(),
            QuorumThreshold::TWO_THIRDS,
        );
        assert_eq!(tally.signers, vec![0, 1, 3]);
    }
}
