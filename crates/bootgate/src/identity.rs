//! Durable client identity.
//!
//! An identity is minted once per network and persisted; it is regenerated
//! only when the stored record is missing or structurally invalid.

use std::fmt;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hash bytes kept in a derived identifier.
const DERIVED_ID_BYTES: usize = 20;

/// Long-lived credential record bound to one network.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Hex-encoded public key.
    pub public_key: String,
    /// Hex-encoded private key. Never logged.
    pub private_key: String,
    /// Stable identifier derived from the public key.
    pub derived_id: String,
}

impl Identity {
    /// Returns `true` when the record can be used to authenticate.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.private_key.trim().is_empty()
    }

    /// Decodes a persisted record, returning `None` unless it is valid.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(bytes)
            .ok()
            .filter(Self::is_valid)
    }

    /// Encodes the record for persistence.
    pub fn encode(&self) -> Result<Vec<u8>, IdentityError> {
        serde_json::to_vec(self).map_err(|source| IdentityError::Encode { source })
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Identity")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("derived_id", &self.derived_id)
            .finish()
    }
}

/// Errors raised while producing or encoding an identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The generator could not produce key material.
    #[error("failed to generate identity: {message}")]
    Generate {
        /// Description supplied by the generator.
        message: String,
    },
    /// Serialising the identity failed.
    #[error("failed to encode identity: {source}")]
    Encode {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

/// Source of fresh identities.
pub trait IdentityGenerator: Send + Sync {
    /// Mints a new identity.
    fn generate(&self) -> Result<Identity, IdentityError>;
}

/// Generates Ed25519 key pairs with BLAKE3-derived identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519IdentityGenerator;

impl IdentityGenerator for Ed25519IdentityGenerator {
    fn generate(&self) -> Result<Identity, IdentityError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key().to_bytes();
        let digest = blake3::hash(&public_key);
        let derived: Vec<u8> = digest
            .as_bytes()
            .iter()
            .copied()
            .take(DERIVED_ID_BYTES)
            .collect();

        Ok(Identity {
            public_key: hex::encode(public_key),
            private_key: hex::encode(signing_key.to_bytes()),
            derived_id: hex::encode(derived),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn generated_identities_are_valid_and_distinct() {
        let generator = Ed25519IdentityGenerator;
        let first = generator.generate().expect("generate identity");
        let second = generator.generate().expect("generate identity");

        assert!(first.is_valid());
        assert_eq!(first.public_key.len(), 64);
        assert_eq!(first.derived_id.len(), DERIVED_ID_BYTES * 2);
        assert_ne!(first.private_key, second.private_key);
    }

    #[rstest]
    fn round_trips_through_persistence() {
        let identity = Ed25519IdentityGenerator.generate().expect("generate identity");
        let bytes = identity.encode().expect("encode identity");
        assert_eq!(Identity::decode(&bytes), Some(identity));
    }

    #[rstest]
    #[case(br#"{"public_key":"aa","private_key":"","derived_id":"bb"}"#.as_slice())]
    #[case(br#"{"public_key":"aa","private_key":"  ","derived_id":"bb"}"#.as_slice())]
    #[case(b"{}".as_slice())]
    #[case(b"not json".as_slice())]
    fn rejects_structurally_invalid_records(#[case] bytes: &[u8]) {
        assert_eq!(Identity::decode(bytes), None);
    }

    #[rstest]
    fn debug_output_redacts_private_key() {
        let identity = Identity {
            public_key: "aa".to_owned(),
            private_key: "secret".to_owned(),
            derived_id: "bb".to_owned(),
        };
        let rendered = format!("{identity:?}");
        assert!(!rendered.contains("secret"));
    }
}
