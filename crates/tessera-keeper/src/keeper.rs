//! Relay keeper: the host-facing entry points.
//!
//! The keeper itself is stateless apart from its configuration. Every
//! operation takes the store it reads from or writes to, so the host decides
//! how requests are isolated and committed (see `RelayService` for a shared,
//! locked store).
//!
//! An anchor is written only after its signatures reach quorum, and data is
//! only accepted against a root that was anchored first.

use crate::config::{ConfigError, RelayConfig};
use crate::ledger::{self, LedgerError, PutOutcome};
use crate::price::{decode_price, PriceError, PriceReport};
use crate::store::{KvStore, StoreError, StoreOverlay};
use crate::validators::{load_validator_set, save_validator_set};
use tessera_core::{
    evaluate_anchor, verify_data_proof, AnchorEvaluation, AnchorProof, Bytes32,
    DataInclusionProof, InclusionError, ProofError, RelayReport, ValidatorPubKey, ValidatorSet,
    ValidatorSetError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Malformed proof: {0}")]
    MalformedProof(#[from] ProofError),

    #[error("Quorum not reached at height {height}: {signed} of {total} validators signed, {required} required")]
    QuorumFailed {
        height: u64,
        signed: usize,
        required: usize,
        total: usize,
    },

    #[error("Height {height} is already anchored to {existing}, refusing {proposed}")]
    ConflictingAnchor {
        height: u64,
        existing: Bytes32,
        proposed: Bytes32,
    },

    #[error("No oracle state root anchored at height {height}")]
    NotAnchored { height: u64 },

    #[error("Data proof at height {height} replays to {computed}, anchored root is {expected}")]
    ProofMismatch {
        height: u64,
        computed: String,
        expected: String,
    },

    #[error("Signer {signer} may not update the validator set")]
    Unauthorized { signer: String },

    #[error("Validator set is already initialized")]
    ValidatorSetAlreadyInitialized,

    #[error("Invalid validator set: {0}")]
    InvalidValidatorSet(#[from] ValidatorSetError),

    #[error("Invalid price record: {0}")]
    InvalidPriceRecord(#[from] PriceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LedgerError> for RelayError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { height } => RelayError::NotAnchored { height },
            LedgerError::Conflict {
                height,
                existing,
                proposed,
            } => RelayError::ConflictingAnchor {
                height,
                existing,
                proposed,
            },
            LedgerError::Store(e) => RelayError::Store(e),
        }
    }
}

impl From<InclusionError> for RelayError {
    fn from(err: InclusionError) -> Self {
        match err {
            InclusionError::RootMismatch {
                height,
                computed,
                expected,
            } => RelayError::ProofMismatch {
                height,
                computed,
                expected,
            },
        }
    }
}

/// Result of a successful `relay_oracle_state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// The root was written to the ledger.
    Anchored,
    /// The identical root was already anchored; the ledger is unchanged.
    AlreadyAnchored,
}

impl From<PutOutcome> for AnchorOutcome {
    fn from(outcome: PutOutcome) -> Self {
        match outcome {
            PutOutcome::Inserted => AnchorOutcome::Anchored,
            PutOutcome::Unchanged => AnchorOutcome::AlreadyAnchored,
        }
    }
}

/// An anchor proof whose signatures reached quorum, not yet committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckedAnchor {
    pub oracle_state_root: Bytes32,
    pub evaluation: AnchorEvaluation,
    /// Version of the validator set the quorum was counted against.
    pub validator_set_version: u64,
}

impl CheckedAnchor {
    pub fn height(&self) -> u64 {
        self.evaluation.height
    }
}

pub struct OracleRelayKeeper {
    config: RelayConfig,
}

impl OracleRelayKeeper {
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The current validator set (empty, version 0, before genesis).
    pub fn validators(&self, store: &dyn KvStore) -> Result<ValidatorSet, RelayError> {
        Ok(load_validator_set(store)?)
    }

    /// Install the genesis validator set. Only allowed while no set exists.
    pub fn init_validators(
        &self,
        store: &mut dyn KvStore,
        pubkeys: Vec<ValidatorPubKey>,
    ) -> Result<ValidatorSet, RelayError> {
        let current = load_validator_set(store)?;
        if current.version != 0 {
            return Err(RelayError::ValidatorSetAlreadyInitialized);
        }
        self.replace_validators(store, &current, pubkeys)
    }

    /// Replace the validator set. Only the configured authority may do this.
    pub fn update_validators(
        &self,
        store: &mut dyn KvStore,
        signer: &str,
        pubkeys: Vec<ValidatorPubKey>,
    ) -> Result<ValidatorSet, RelayError> {
        if self.config.authority.as_deref() != Some(signer) {
            warn!(signer, "Rejected validator set update from unauthorized signer");
            return Err(RelayError::Unauthorized {
                signer: signer.to_string(),
            });
        }
        let current = load_validator_set(store)?;
        self.replace_validators(store, &current, pubkeys)
    }

    fn replace_validators(
        &self,
        store: &mut dyn KvStore,
        current: &ValidatorSet,
        pubkeys: Vec<ValidatorPubKey>,
    ) -> Result<ValidatorSet, RelayError> {
        let next = current.successor(pubkeys);
        next.validate()?;
        save_validator_set(store, &next)?;
        info!(
            version = next.version,
            validators = next.len(),
            "Validator set updated"
        );
        Ok(next)
    }

    /// Validate `proof` and count its signatures over the rebuilt header.
    /// Reads the validator set, writes nothing.
    pub fn check_anchor(
        &self,
        store: &dyn KvStore,
        height: u64,
        proof: &AnchorProof,
    ) -> Result<CheckedAnchor, RelayError> {
        proof.validate(height, self.config.max_signatures)?;
        let validators = load_validator_set(store)?;
        let evaluation = evaluate_anchor(height, proof, &validators, self.config.quorum);

        debug!(
            height,
            header = %hex::encode_upper(evaluation.header_hash),
            signed = evaluation.tally.signed(),
            "Evaluated anchor proof"
        );

        if !evaluation.tally.is_reached() {
            let tally = &evaluation.tally;
            warn!(
                height,
                signed = tally.signed(),
                required = tally.required,
                total = tally.total,
                "Anchor proof did not reach quorum"
            );
            return Err(RelayError::QuorumFailed {
                height,
                signed: tally.signed(),
                required: tally.required,
                total: tally.total,
            });
        }

        Ok(CheckedAnchor {
            oracle_state_root: proof.oracle_state_root,
            evaluation,
            validator_set_version: validators.version,
        })
    }

    /// Write a checked anchor to the ledger. First anchor wins.
    pub fn commit_anchor(
        &self,
        store: &mut dyn KvStore,
        checked: &CheckedAnchor,
    ) -> Result<AnchorOutcome, RelayError> {
        let height = checked.height();
        match ledger::put(store, height, &checked.oracle_state_root) {
            Ok(outcome) => {
                let outcome = AnchorOutcome::from(outcome);
                info!(
                    height,
                    root = %checked.oracle_state_root,
                    ?outcome,
                    "Anchored oracle state root"
                );
                Ok(outcome)
            }
            Err(err) => {
                if let LedgerError::Conflict { existing, .. } = &err {
                    warn!(
                        height,
                        %existing,
                        proposed = %checked.oracle_state_root,
                        "Refusing conflicting anchor"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Anchor the oracle store root in `proof` at `height`.
    pub fn relay_oracle_state(
        &self,
        store: &mut dyn KvStore,
        height: u64,
        proof: &AnchorProof,
    ) -> Result<AnchorOutcome, RelayError> {
        let checked = self.check_anchor(store, height, proof)?;
        self.commit_anchor(store, &checked)
    }

    /// The root anchored at `height`.
    pub fn oracle_state_root(
        &self,
        store: &dyn KvStore,
        height: u64,
    ) -> Result<Bytes32, RelayError> {
        Ok(ledger::get(store, height)?)
    }

    /// Check that `proof` includes its record under the root anchored at its height.
    pub fn verify_oracle_data(
        &self,
        store: &dyn KvStore,
        proof: &DataInclusionProof,
    ) -> Result<(), RelayError> {
        proof.validate(self.config.max_path_len)?;
        let anchored = ledger::get(store, proof.block_height)?;
        match verify_data_proof(proof, anchored.as_bytes()) {
            Ok(()) => {
                debug!(
                    height = proof.block_height,
                    request_id = proof.record.request_id,
                    "Verified oracle data"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    height = proof.block_height,
                    request_id = proof.record.request_id,
                    error = %err,
                    "Oracle data proof rejected"
                );
                Err(err.into())
            }
        }
    }

    /// Anchor, verify and decode a full relayer report in one pass.
    ///
    /// Runs against an overlay of `store`; nothing is written unless every
    /// step succeeds.
    pub fn report_price(
        &self,
        store: &mut dyn KvStore,
        report: &RelayReport,
    ) -> Result<PriceReport, RelayError> {
        let data_proof = report.data_inclusion_proof();
        // Both halves are checked structurally before any signature or hash work.
        report
            .block_relay_proof
            .validate(report.block_height, self.config.max_signatures)?;
        data_proof.validate(self.config.max_path_len)?;

        let mut overlay = StoreOverlay::new(&*store);
        self.relay_oracle_state(&mut overlay, report.block_height, &report.block_relay_proof)?;
        self.verify_oracle_data(&overlay, &data_proof)?;
        let price = decode_price(&data_proof.record)?;
        let writes = overlay.into_writes();

        store.apply(writes)?;
        info!(
            height = report.block_height,
            request_id = price.request_id,
            market = price.market_id.unwrap_or("unknown"),
            price = %price.price,
            "Reported price"
        );
        Ok(price)
    }
}

impl Default for OracleRelayKeeper {
    fn default() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }
}
