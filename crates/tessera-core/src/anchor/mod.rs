pub mod header;
pub mod quorum;

pub use header::*;
pub use quorum::*;

use crate::types::proof::AnchorProof;
use crate::types::validators::ValidatorSet;

/// Result of evaluating an anchor proof, before anything is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorEvaluation {
    pub height: u64,
    pub app_hash: [u8; 32],
    pub header_hash: [u8; 32],
    pub tally: QuorumTally,
}

/// Reconstruct the header for `height` and tally the proof's signatures over it.
/// Pure: the caller decides whether a reached quorum is persisted.
pub fn evaluate_anchor(
    height: u64,
    proof: &AnchorProof,
    validators: &ValidatorSet,
    threshold: QuorumThreshold,
) -> AnchorEvaluation {
    let app_hash = proof.app_hash();
    let header_hash = reconstruct_header(height, &app_hash, &proof.header);
    let tally = tally_signatures(&header_hash, proof, validators, threshold);
    AnchorEvaluation {
        height,
        app_hash,
        header_hash,
        tally,
    }
}
