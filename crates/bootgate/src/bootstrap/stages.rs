//! The concrete application startup stages, in execution order.

use std::sync::Arc;

use async_trait::async_trait;
use bootgate_config::Network;

use crate::health::HealthReporter;
use crate::identity::{Identity, IdentityGenerator};
use crate::stages::{Requirement, Stage, StageError, StageOutcome};

use super::collaborators::{
    AccountService, AccountSnapshot, ApiBinder, KeyValueStore, PairedStores, PairingToken,
    RewardsSdk, StoreHydrator, identity_key, pairing_token_key,
};

/// Name of the identity stage.
pub const IDENTITY_ENSURE: &str = "identity-ensure";
/// Name of the API binding stage.
pub const API_BINDING: &str = "api-binding";
/// Name of the store hydration stage.
pub const STORE_HYDRATION: &str = "store-hydration";
/// Name of the paired account stage.
pub const PAIRED_ACCOUNT_FETCH: &str = "paired-account-fetch";
/// Name of the rewards SDK stage.
pub const REWARDS_SDK_INIT: &str = "rewards-sdk-init";

/// State accumulated by the bootstrap stages.
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    network: Network,
    identity: Option<Identity>,
    pairing_token: Option<PairingToken>,
    account: Option<AccountSnapshot>,
}

impl BootstrapContext {
    /// Builds an empty context for `network`.
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            identity: None,
            pairing_token: None,
            account: None,
        }
    }

    /// Network being bootstrapped.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Identity ensured by the first stage.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Pairing token restored during hydration.
    #[must_use]
    pub fn pairing_token(&self) -> Option<&PairingToken> {
        self.pairing_token.as_ref()
    }

    /// Paired account data, when fetched.
    #[must_use]
    pub fn account(&self) -> Option<&AccountSnapshot> {
        self.account.as_ref()
    }

    /// Returns `true` when a pairing token is present.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.pairing_token.is_some()
    }
}

/// Reads the persisted identity, generating and persisting one when absent or
/// invalid.
pub(crate) struct IdentityEnsureStage {
    store: Arc<dyn KeyValueStore>,
    generator: Arc<dyn IdentityGenerator>,
    reporter: Arc<dyn HealthReporter>,
}

impl IdentityEnsureStage {
    pub(crate) fn new(
        store: Arc<dyn KeyValueStore>,
        generator: Arc<dyn IdentityGenerator>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            store,
            generator,
            reporter,
        }
    }
}

#[async_trait]
impl Stage<BootstrapContext> for IdentityEnsureStage {
    fn name(&self) -> &'static str {
        IDENTITY_ENSURE
    }

    fn requirement(&self) -> Requirement {
        Requirement::Required
    }

    async fn run(&self, context: &mut BootstrapContext) -> StageOutcome {
        let key = identity_key(context.network);
        let stored = self.store.read(&key).await.map_err(|source| {
            StageError::with_source("failed to read persisted identity", source)
        })?;

        if let Some(identity) = stored.as_deref().and_then(Identity::decode) {
            context.identity = Some(identity);
            return Ok(());
        }

        let identity = self
            .generator
            .generate()
            .map_err(|source| StageError::with_source("failed to generate identity", source))?;
        let bytes = identity
            .encode()
            .map_err(|source| StageError::with_source("failed to encode identity", source))?;
        self.store
            .write(&key, &bytes)
            .await
            .map_err(|source| StageError::with_source("failed to persist identity", source))?;

        self.reporter.identity_generated(context.network);
        context.identity = Some(identity);
        Ok(())
    }
}

/// Binds every network-dependent API client to the ensured identity.
pub(crate) struct ApiBindingStage {
    binders: Vec<Arc<dyn ApiBinder>>,
}

impl ApiBindingStage {
    pub(crate) fn new(binders: Vec<Arc<dyn ApiBinder>>) -> Self {
        Self { binders }
    }
}

#[async_trait]
impl Stage<BootstrapContext> for ApiBindingStage {
    fn name(&self) -> &'static str {
        API_BINDING
    }

    fn requirement(&self) -> Requirement {
        Requirement::Required
    }

    async fn run(&self, context: &mut BootstrapContext) -> StageOutcome {
        let identity = context
            .identity
            .as_ref()
            .ok_or_else(|| StageError::new("no identity available to bind"))?;

        for binder in &self.binders {
            binder
                .bind(identity, context.network)
                .map_err(|source| StageError::with_source("API binding rejected", source))?;
        }
        Ok(())
    }
}

/// Restores persisted domain stores and the pairing token.
pub(crate) struct StoreHydrationStage {
    store: Arc<dyn KeyValueStore>,
    hydrators: Vec<Arc<dyn StoreHydrator>>,
}

impl StoreHydrationStage {
    pub(crate) fn new(
        store: Arc<dyn KeyValueStore>,
        hydrators: Vec<Arc<dyn StoreHydrator>>,
    ) -> Self {
        Self { store, hydrators }
    }
}

#[async_trait]
impl Stage<BootstrapContext> for StoreHydrationStage {
    fn name(&self) -> &'static str {
        STORE_HYDRATION
    }

    fn requirement(&self) -> Requirement {
        Requirement::Required
    }

    async fn run(&self, context: &mut BootstrapContext) -> StageOutcome {
        for hydrator in &self.hydrators {
            hydrator
                .hydrate(context.network)
                .await
                .map_err(|source| StageError::with_source("store hydration failed", source))?;
        }

        let stored = self
            .store
            .read(&pairing_token_key(context.network))
            .await
            .map_err(|source| StageError::with_source("failed to read pairing token", source))?;
        context.pairing_token = stored
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(PairingToken::new);
        Ok(())
    }
}

/// Fetches paired account data and seeds the profile and card stores.
///
/// Only runs when a pairing token was restored.
pub(crate) struct PairedAccountFetchStage {
    accounts: Arc<dyn AccountService>,
    paired_stores: Arc<dyn PairedStores>,
}

impl PairedAccountFetchStage {
    pub(crate) fn new(
        accounts: Arc<dyn AccountService>,
        paired_stores: Arc<dyn PairedStores>,
    ) -> Self {
        Self {
            accounts,
            paired_stores,
        }
    }
}

#[async_trait]
impl Stage<BootstrapContext> for PairedAccountFetchStage {
    fn name(&self) -> &'static str {
        PAIRED_ACCOUNT_FETCH
    }

    fn requirement(&self) -> Requirement {
        Requirement::Optional
    }

    fn is_applicable(&self, context: &BootstrapContext) -> bool {
        context.is_paired()
    }

    async fn run(&self, context: &mut BootstrapContext) -> StageOutcome {
        let token = context
            .pairing_token
            .as_ref()
            .ok_or_else(|| StageError::new("no pairing token available"))?;

        let snapshot = self
            .accounts
            .fetch_all(token)
            .await
            .map_err(|source| StageError::with_source("failed to fetch account data", source))?;
        self.paired_stores
            .init_profile(context.network, &snapshot.profile)
            .await
            .map_err(|source| StageError::with_source("failed to seed profile", source))?;
        self.paired_stores
            .init_cards(context.network, &snapshot.cards)
            .await
            .map_err(|source| StageError::with_source("failed to seed cards", source))?;

        context.account = Some(snapshot);
        Ok(())
    }
}

/// Starts the rewards SDK. Never blocks readiness.
pub(crate) struct RewardsSdkStage {
    rewards: Arc<dyn RewardsSdk>,
}

impl RewardsSdkStage {
    pub(crate) fn new(rewards: Arc<dyn RewardsSdk>) -> Self {
        Self { rewards }
    }
}

#[async_trait]
impl Stage<BootstrapContext> for RewardsSdkStage {
    fn name(&self) -> &'static str {
        REWARDS_SDK_INIT
    }

    fn requirement(&self) -> Requirement {
        Requirement::Optional
    }

    fn opens_gate(&self) -> bool {
        true
    }

    async fn run(&self, _context: &mut BootstrapContext) -> StageOutcome {
        self.rewards
            .initialise()
            .map_err(|source| StageError::with_source("rewards SDK failed to start", source))
    }
}
