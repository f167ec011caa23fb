//! Scripted stand-in for every bootstrap collaborator except storage.
//!
//! Each call is appended to a shared journal before it succeeds or fails, so
//! tests can assert both ordering and which steps were never reached.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bootgate_config::Network;

use crate::bootstrap::{
    AccountError, AccountService, AccountSnapshot, ApiBinder, BindError, Card, Collaborators,
    HydrationError, LoadingIndicator, PairedStores, PairingToken, RewardsSdk, SdkError,
    StoreHydrator, UserProfile,
};
use crate::identity::{Ed25519IdentityGenerator, Identity, IdentityError, IdentityGenerator};

use super::store::MemoryStore;

pub const GENERATE: &str = "generate";
pub const BIND: &str = "bind";
pub const HYDRATE: &str = "hydrate";
pub const FETCH: &str = "fetch";
pub const PROFILE: &str = "profile";
pub const CARDS: &str = "cards";
pub const REWARDS: &str = "rewards";

/// Journal-keeping collaborator double.
#[derive(Debug, Default)]
pub struct FakeServices {
    journal: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    dismissals: AtomicUsize,
}

impl FakeServices {
    /// Makes every future call of `step` fail.
    pub fn fail(&self, step: &'static str) {
        self.failing
            .lock()
            .expect("failures mutex poisoned")
            .insert(step);
    }

    /// Steps attempted so far, in order.
    pub fn journal(&self) -> Vec<&'static str> {
        self.journal.lock().expect("journal mutex poisoned").clone()
    }

    /// Returns `true` when `step` was attempted at least once.
    pub fn attempted(&self, step: &str) -> bool {
        self.journal().iter().any(|entry| *entry == step)
    }

    /// Number of loading indicator dismissals.
    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }

    /// Bundles these services with `store`.
    pub fn collaborators(self: &Arc<Self>, store: &Arc<MemoryStore>) -> Collaborators {
        Collaborators {
            store: store.clone(),
            identity_generator: self.clone(),
            api_binders: vec![self.clone() as Arc<dyn ApiBinder>],
            hydrators: vec![self.clone() as Arc<dyn StoreHydrator>],
            accounts: self.clone(),
            paired_stores: self.clone(),
            rewards: self.clone(),
            loading: self.clone(),
        }
    }

    fn step(&self, step: &'static str) -> Result<(), String> {
        self.journal
            .lock()
            .expect("journal mutex poisoned")
            .push(step);
        let failing = self
            .failing
            .lock()
            .expect("failures mutex poisoned")
            .contains(step);
        if failing {
            Err(format!("{step} failed"))
        } else {
            Ok(())
        }
    }
}

/// Account data returned to paired clients.
pub fn sample_account() -> AccountSnapshot {
    AccountSnapshot {
        profile: UserProfile {
            id: "account-1".to_owned(),
            email: Some("holder@example.com".to_owned()),
            name: Some("Holder".to_owned()),
        },
        cards: vec![Card {
            id: "card-1".to_owned(),
            provider: "galileo".to_owned(),
            last_four_digits: "4242".to_owned(),
        }],
    }
}

impl IdentityGenerator for FakeServices {
    fn generate(&self) -> Result<Identity, IdentityError> {
        self.step(GENERATE)
            .map_err(|message| IdentityError::Generate { message })?;
        Ed25519IdentityGenerator.generate()
    }
}

impl ApiBinder for FakeServices {
    fn name(&self) -> &'static str {
        "fake-api"
    }

    fn bind(&self, _identity: &Identity, _network: Network) -> Result<(), BindError> {
        self.step(BIND).map_err(|message| BindError {
            api: "fake-api",
            message,
        })
    }
}

#[async_trait]
impl StoreHydrator for FakeServices {
    fn name(&self) -> &'static str {
        "fake-store"
    }

    async fn hydrate(&self, _network: Network) -> Result<(), HydrationError> {
        self.step(HYDRATE).map_err(|message| HydrationError {
            store: "fake-store",
            message,
        })
    }
}

#[async_trait]
impl AccountService for FakeServices {
    async fn fetch_all(&self, _token: &PairingToken) -> Result<AccountSnapshot, AccountError> {
        self.step(FETCH)
            .map_err(|message| AccountError::Unavailable { message })?;
        Ok(sample_account())
    }
}

#[async_trait]
impl PairedStores for FakeServices {
    async fn init_profile(
        &self,
        _network: Network,
        _profile: &UserProfile,
    ) -> Result<(), HydrationError> {
        self.step(PROFILE).map_err(|message| HydrationError {
            store: "profile",
            message,
        })
    }

    async fn init_cards(&self, _network: Network, _cards: &[Card]) -> Result<(), HydrationError> {
        self.step(CARDS).map_err(|message| HydrationError {
            store: "cards",
            message,
        })
    }
}

impl RewardsSdk for FakeServices {
    fn initialise(&self) -> Result<(), SdkError> {
        self.step(REWARDS).map_err(|message| SdkError {
            sdk: "rewards",
            message,
        })
    }
}

impl LoadingIndicator for FakeServices {
    fn dismiss(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }
}
