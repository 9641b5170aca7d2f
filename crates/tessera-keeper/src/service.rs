//! Shared relay service over a locked store.
//!
//! Signature checks and proof replay run under the read lock. Only the final
//! ledger read-check-write takes the write lock, so concurrent submissions for
//! the same height serialize there and the first one wins.

use crate::config::ConfigError;
use crate::keeper::{AnchorOutcome, OracleRelayKeeper, RelayError};
use crate::price::PriceReport;
use crate::store::KvStore;
use crate::validators::load_validator_set;
use crate::RelayConfig;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tessera_core::{
    AnchorProof, Bytes32, DataInclusionProof, RelayReport, ValidatorPubKey, ValidatorSet,
};
use tracing::debug;

/// Clones share the same keeper and store.
pub struct RelayService<S> {
    keeper: Arc<OracleRelayKeeper>,
    store: Arc<RwLock<S>>,
}

impl<S> Clone for RelayService<S> {
    fn clone(&self) -> Self {
        Self {
            keeper: Arc::clone(&self.keeper),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> RelayService<S> {
    pub fn new(config: RelayConfig, store: S) -> Result<Self, ConfigError> {
        Ok(Self {
            keeper: Arc::new(OracleRelayKeeper::new(config)?),
            store: Arc::new(RwLock::new(store)),
        })
    }

    pub fn keeper(&self) -> &OracleRelayKeeper {
        &self.keeper
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> RwLockReadGuard<'_, S> {
        self.store.read()
    }

    pub fn validators(&self) -> Result<ValidatorSet, RelayError> {
        self.keeper.validators(&*self.store.read())
    }

    pub fn init_validators(
        &self,
        pubkeys: Vec<ValidatorPubKey>,
    ) -> Result<ValidatorSet, RelayError> {
        self.keeper.init_validators(&mut *self.store.write(), pubkeys)
    }

    pub fn update_validators(
        &self,
        signer: &str,
        pubkeys: Vec<ValidatorPubKey>,
    ) -> Result<ValidatorSet, RelayError> {
        self.keeper
            .update_validators(&mut *self.store.write(), signer, pubkeys)
    }

    pub fn relay_oracle_state(
        &self,
        height: u64,
        proof: &AnchorProof,
    ) -> Result<AnchorOutcome, RelayError> {
        let checked = self.keeper.check_anchor(&*self.store.read(), height, proof)?;

        let mut store = self.store.write();
        // The set may have been replaced between the two locks.
        let current = load_validator_set(&*store)?;
        let checked = if current.version == checked.validator_set_version {
            checked
        } else {
            debug!(
                height,
                checked = checked.validator_set_version,
                current = current.version,
                "Validator set changed during anchoring, re-checking"
            );
            self.keeper.check_anchor(&*store, height, proof)?
        };
        self.keeper.commit_anchor(&mut *store, &checked)
    }

    pub fn oracle_state_root(&self, height: u64) -> Result<Bytes32, RelayError> {
        self.keeper.oracle_state_root(&*self.store.read(), height)
    }

    pub fn verify_oracle_data(&self, proof: &DataInclusionProof) -> Result<(), RelayError> {
        self.keeper.verify_oracle_data(&*self.store.read(), proof)
    }

    /// Holds the write lock for the whole report so its anchor and
    /// verification see one consistent ledger.
    pub fn report_price(&self, report: &RelayReport) -> Result<PriceReport, RelayError> {
        self.keeper.report_price(&mut *self.store.write(), report)
    }
}
