//! Collaborators used by the `bootgate` binary until real integrations land.
//!
//! Only [`FileKeyValueStore`] does real work. The remaining types accept every
//! call, log it, and report success.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bootgate_config::{Config, Network};
use camino::{Utf8Path, Utf8PathBuf};

use crate::analytics::{
    AnalyticsConfig, AnalyticsHandle, AnalyticsPlugin, AnalyticsSdk, Properties,
};
use crate::bootstrap::{
    AccountError, AccountService, AccountSnapshot, ApiBinder, BindError, Card, Collaborators,
    HydrationError, KeyValueStore, LoadingIndicator, PairedStores, PairingToken, RewardsSdk,
    SdkError, StoreError, StoreHydrator, UserProfile,
};
use crate::identity::{Ed25519IdentityGenerator, Identity};
use crate::queue::OperationError;

const PLACEHOLDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::placeholder");

/// Key-value store persisting each key as a file under a root directory.
///
/// Keys are `/`-separated relative paths whose segments never start with a
/// dot. Writes go through a hidden sibling file (`.<name>.tmp`) and a rename,
/// so readers never observe partial values and staging files never collide
/// with another key.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: Utf8PathBuf,
}

impl FileKeyValueStore {
    /// Builds a store rooted at `root`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<Utf8PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .split('/')
                .all(|segment| !segment.is_empty() && !segment.starts_with('.'))
            && !key.contains('\\');
        if valid {
            Ok(self.root.join(key))
        } else {
            Err(StoreError::InvalidKey {
                key: key.to_owned(),
            })
        }
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let io_error = |source| StoreError::Io {
            key: key.to_owned(),
            source,
        };

        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
            });
        };
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        let staging = parent.join(format!(".{name}.tmp"));
        tokio::fs::write(&staging, bytes).await.map_err(io_error)?;
        tokio::fs::rename(&staging, &path).await.map_err(io_error)
    }
}

/// API binder that only logs the binding.
#[derive(Debug, Clone, Copy)]
pub struct LoggingApiBinder {
    name: &'static str,
}

impl LoggingApiBinder {
    /// Builds a binder reported as `name`.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl ApiBinder for LoggingApiBinder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn bind(&self, identity: &Identity, network: Network) -> Result<(), BindError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            api = self.name,
            network = %network,
            derived_id = %identity.derived_id,
            "API client bound"
        );
        Ok(())
    }
}

/// Store hydrator with nothing to restore.
#[derive(Debug, Clone, Copy)]
pub struct EmptyStoreHydrator {
    name: &'static str,
}

impl EmptyStoreHydrator {
    /// Builds a hydrator reported as `name`.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl StoreHydrator for EmptyStoreHydrator {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn hydrate(&self, network: Network) -> Result<(), HydrationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            store = self.name,
            network = %network,
            "store hydrated"
        );
        Ok(())
    }
}

/// Account service without a remote backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineAccountService;

#[async_trait]
impl AccountService for OfflineAccountService {
    async fn fetch_all(&self, _token: &PairingToken) -> Result<AccountSnapshot, AccountError> {
        Err(AccountError::Unavailable {
            message: "no account service configured".to_owned(),
        })
    }
}

/// Paired stores that discard what they are given.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardingPairedStores;

#[async_trait]
impl PairedStores for DiscardingPairedStores {
    async fn init_profile(
        &self,
        network: Network,
        profile: &UserProfile,
    ) -> Result<(), HydrationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            network = %network,
            account = %profile.id,
            "profile store seeded"
        );
        Ok(())
    }

    async fn init_cards(&self, network: Network, cards: &[Card]) -> Result<(), HydrationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            network = %network,
            cards = cards.len(),
            "card store seeded"
        );
        Ok(())
    }
}

/// Rewards SDK that starts instantly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRewardsSdk;

impl RewardsSdk for NoopRewardsSdk {
    fn initialise(&self) -> Result<(), SdkError> {
        tracing::debug!(target: PLACEHOLDER_TARGET, "rewards SDK started");
        Ok(())
    }
}

/// Loading indicator for a headless process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLoadingIndicator;

impl LoadingIndicator for LogLoadingIndicator {
    fn dismiss(&self) {
        tracing::info!(target: PLACEHOLDER_TARGET, "loading finished");
    }
}

/// Analytics SDK whose handles log every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAnalyticsSdk;

#[async_trait]
impl AnalyticsSdk for LoggingAnalyticsSdk {
    async fn create(
        &self,
        config: &AnalyticsConfig,
    ) -> Result<Arc<dyn AnalyticsHandle>, OperationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            debug = config.debug,
            lifecycle = config.track_lifecycle_events,
            "analytics handle created"
        );
        Ok(Arc::new(LoggingAnalyticsHandle))
    }
}

#[derive(Debug, Clone, Copy)]
struct LoggingAnalyticsHandle;

#[async_trait]
impl AnalyticsHandle for LoggingAnalyticsHandle {
    fn add_plugin(&self, plugin: AnalyticsPlugin) {
        tracing::debug!(target: PLACEHOLDER_TARGET, ?plugin, "analytics plugin added");
    }

    async fn identify(
        &self,
        user_id: Option<String>,
        traits: Properties,
    ) -> Result<(), OperationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            user_id = user_id.as_deref().unwrap_or("anonymous"),
            traits = traits.len(),
            "identify"
        );
        Ok(())
    }

    async fn screen(&self, name: String, properties: Properties) -> Result<(), OperationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            screen = %name,
            properties = properties.len(),
            "screen"
        );
        Ok(())
    }

    async fn track(&self, event: String, properties: Properties) -> Result<(), OperationError> {
        tracing::debug!(
            target: PLACEHOLDER_TARGET,
            action = %event,
            properties = properties.len(),
            "track"
        );
        Ok(())
    }
}

/// Collaborators for the `bootgate` binary, persisting under the configured
/// data directory.
#[must_use]
pub fn placeholder_collaborators(config: &Config) -> Collaborators {
    Collaborators {
        store: Arc::new(FileKeyValueStore::new(config.data_dir().clone())),
        identity_generator: Arc::new(Ed25519IdentityGenerator),
        api_binders: vec![
            Arc::new(LoggingApiBinder::new("rest")),
            Arc::new(LoggingApiBinder::new("graphql")),
        ],
        hydrators: vec![Arc::new(EmptyStoreHydrator::new("app"))],
        accounts: Arc::new(OfflineAccountService),
        paired_stores: Arc::new(DiscardingPairedStores),
        rewards: Arc::new(NoopRewardsSdk),
        loading: Arc::new(LogLoadingIndicator),
    }
}
