//! Persistence of the remote chain's validator set.

use crate::keys::VALIDATORS_KEY;
use crate::store::{KvStore, StoreError};
use tessera_core::ValidatorSet;

/// The stored validator set, or the empty version-0 set if none was ever saved.
pub fn load_validator_set(store: &dyn KvStore) -> Result<ValidatorSet, StoreError> {
    match store.get(VALIDATORS_KEY)? {
        None => Ok(ValidatorSet::default()),
        Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            key: hex::encode(VALIDATORS_KEY),
            reason: e.to_string(),
        }),
    }
}

pub fn save_validator_set(store: &mut dyn KvStore, set: &ValidatorSet) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(set).map_err(|e| StoreError::Backend {
        reason: format!("failed to encode validator set: {}", e),
    })?;
    store.set(VALIDATORS_KEY, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tessera_core::ValidatorPubKey;

    #[test]
    fn test_missing_set_is_empty_genesis() {
        let store = MemoryStore::new();
        let set = load_validator_set(&store).unwrap();
        assert_eq!(set.version, 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let set = ValidatorSet::new(
            3,
            vec![ValidatorPubKey::from_hex(
                "03f57f3997a4e81d8f321e9710927e22c2e6d30fb6d8f749a9e4a07afb3b3b7909",
            )
            .unwrap()],
        );
        save_validator_set(&mut store, &set).unwrap();
        assert_eq!(load_validator_set(&store).unwrap(), set);
    }

    #[test]
    fn test_corrupt_set_is_reported() {
        let mut store = MemoryStore::new();
        store.set(VALIDATORS_KEY, b"{\"version\":").unwrap();
        assert!(matches!(
            load_validator_set(&store),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
