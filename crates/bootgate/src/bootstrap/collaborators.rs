//! Contracts for the external services the bootstrap sequence drives.

use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bootgate_config::Network;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{Identity, IdentityGenerator};

/// Persistence key holding the identity for `network`.
#[must_use]
pub fn identity_key(network: Network) -> String {
    format!("identity/{network}")
}

/// Persistence key holding the pairing token for `network`.
#[must_use]
pub fn pairing_token_key(network: Network) -> String {
    format!("pairing-token/{network}")
}

/// Errors reported by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium failed.
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        /// Key being read or written.
        key: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The key cannot be mapped onto the backing medium.
    #[error("invalid storage key '{key}'")]
    InvalidKey {
        /// Offending key.
        key: String,
    },
}

/// Persisted key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the value stored under `key`.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Error raised when an API client refuses its binding.
#[derive(Debug, Error)]
#[error("failed to bind {api} client: {message}")]
pub struct BindError {
    /// Name of the API client.
    pub api: &'static str,
    /// Description of the failure.
    pub message: String,
}

/// Network-dependent API client configured with the client identity.
#[cfg_attr(test, mockall::automock)]
pub trait ApiBinder: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Configures the client for `identity` on `network`. Performs no I/O.
    fn bind(&self, identity: &Identity, network: Network) -> Result<(), BindError>;
}

/// Error raised while rehydrating or seeding a store.
#[derive(Debug, Error)]
#[error("failed to initialise {store} store: {message}")]
pub struct HydrationError {
    /// Name of the store.
    pub store: &'static str,
    /// Description of the failure.
    pub message: String,
}

/// Domain store restored from persistence before the UI may trust it.
#[async_trait]
pub trait StoreHydrator: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Restores the store's state for `network`.
    async fn hydrate(&self, network: Network) -> Result<(), HydrationError>;
}

/// Credential proving the local identity is linked to a remote account.
#[derive(Clone, PartialEq, Eq)]
pub struct PairingToken(String);

impl PairingToken {
    /// Wraps `token`, rejecting blank values.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PairingToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PairingToken(<redacted>)")
    }
}

/// Basic profile of the paired account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Remote account identifier.
    pub id: String,
    /// Contact email, when shared.
    pub email: Option<String>,
    /// Display name, when shared.
    pub name: Option<String>,
}

/// Payment card attached to the paired account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Remote card identifier.
    pub id: String,
    /// Card provider label.
    pub provider: String,
    /// Last four digits of the card number.
    pub last_four_digits: String,
}

/// Everything the remote account service returns for a paired client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account holder profile.
    pub profile: UserProfile,
    /// Cards attached to the account.
    pub cards: Vec<Card>,
}

/// Errors reported by the remote account service.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The service could not be reached or answered with an error.
    #[error("account service unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
    /// The pairing token was rejected.
    #[error("pairing token rejected")]
    Unauthorized,
}

/// Remote account service.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Fetches the profile and cards for the paired account.
    async fn fetch_all(&self, token: &PairingToken) -> Result<AccountSnapshot, AccountError>;
}

/// Stores seeded from paired-account data.
#[async_trait]
pub trait PairedStores: Send + Sync {
    /// Seeds the account store with the holder profile.
    async fn init_profile(
        &self,
        network: Network,
        profile: &UserProfile,
    ) -> Result<(), HydrationError>;

    /// Seeds the card store.
    async fn init_cards(&self, network: Network, cards: &[Card]) -> Result<(), HydrationError>;
}

/// Error raised by a third-party SDK.
#[derive(Debug, Error)]
#[error("{sdk} SDK failed: {message}")]
pub struct SdkError {
    /// Name of the SDK.
    pub sdk: &'static str,
    /// Description of the failure.
    pub message: String,
}

/// Third-party rewards SDK initialised once at startup.
#[cfg_attr(test, mockall::automock)]
pub trait RewardsSdk: Send + Sync {
    /// Starts the SDK. Fire-and-forget: nothing waits on the SDK afterwards.
    fn initialise(&self) -> Result<(), SdkError>;
}

/// Presentation-layer loading state shown while bootstrap runs.
pub trait LoadingIndicator: Send + Sync {
    /// Hides the loading state.
    fn dismiss(&self);
}

/// Bundle of collaborators consumed by the bootstrap stages.
#[derive(Clone)]
pub struct Collaborators {
    /// Persisted key-value storage.
    pub store: Arc<dyn KeyValueStore>,
    /// Source of fresh identities.
    pub identity_generator: Arc<dyn IdentityGenerator>,
    /// API clients bound to the identity, in binding order.
    pub api_binders: Vec<Arc<dyn ApiBinder>>,
    /// Stores hydrated before the UI may trust its state, in order.
    pub hydrators: Vec<Arc<dyn StoreHydrator>>,
    /// Remote account service used when paired.
    pub accounts: Arc<dyn AccountService>,
    /// Stores seeded from paired-account data.
    pub paired_stores: Arc<dyn PairedStores>,
    /// Third-party rewards SDK.
    pub rewards: Arc<dyn RewardsSdk>,
    /// Loading state dismissed when bootstrap ends.
    pub loading: Arc<dyn LoadingIndicator>,
}
