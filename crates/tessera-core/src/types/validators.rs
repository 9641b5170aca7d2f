use k256::ecdsa::VerifyingKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes in a compressed secp256k1 public key.
pub const SECP256K1_PUBKEY_LEN: usize = 33;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidatorSetError {
    #[error("Invalid validator public key at index {index}: {reason}")]
    InvalidPublicKey { index: usize, reason: String },

    #[error("Validator public key at index {index} duplicates index {first}")]
    DuplicateKey { index: usize, first: usize },
}

/// A remote chain validator's secp256k1 public key (33 bytes, SEC1 compressed).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValidatorPubKey(pub [u8; SECP256K1_PUBKEY_LEN]);

impl Serialize for ValidatorPubKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for ValidatorPubKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl ValidatorPubKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != SECP256K1_PUBKEY_LEN {
            return Err("Invalid secp256k1 public key length");
        }
        let mut arr = [0u8; SECP256K1_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, String> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str).map_err(|e| format!("Invalid hex: {}", e))?;
        Self::from_bytes(&bytes).map_err(str::to_string)
    }

    /// Decode the key as a curve point.
    pub fn verifying_key(&self) -> Result<VerifyingKey, k256::ecdsa::Error> {
        VerifyingKey::from_sec1_bytes(&self.0)
    }
}

/// The remote chain's known validator keys.
///
/// The set is an owned, versioned value: verification code only ever reads it,
/// and every administrative replacement produces a new version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    /// Incremented on every administrative update; 0 means never configured.
    pub version: u64,
    pub pubkeys: Vec<ValidatorPubKey>,
}

impl ValidatorSet {
    pub fn new(version: u64, pubkeys: Vec<ValidatorPubKey>) -> Self {
        Self { version, pubkeys }
    }

    /// The set that replaces this one with `pubkeys`.
    pub fn successor(&self, pubkeys: Vec<ValidatorPubKey>) -> Self {
        Self {
            version: self.version + 1,
            pubkeys,
        }
    }

    pub fn len(&self) -> usize {
        self.pubkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }

    /// Every key must be a valid curve point and appear only once.
    pub fn validate(&self) -> Result<(), ValidatorSetError> {
        for (index, pk) in self.pubkeys.iter().enumerate() {
            pk.verifying_key()
                .map_err(|e| ValidatorSetError::InvalidPublicKey {
                    index,
                    reason: e.to_string(),
                })?;
            if let Some(first) = self.pubkeys[..index].iter().position(|other| other == pk) {
                return Err(ValidatorSetError::DuplicateKey { index, first });
            }
        }
        Ok(())
    }
}
