//! Product analytics behind a readiness gate.
//!
//! The analytics SDK is created asynchronously after startup. Calls made
//! before it is ready are queued and replayed in order once
//! [`AnalyticsClient::initialise`] completes; calls made when analytics are
//! disabled are discarded outright. Callers never observe SDK failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bootgate_config::Config;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::gated::GatedClient;
use crate::health::QueueReporter;
use crate::queue::{OperationError, PendingOperation};

const ANALYTICS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::analytics");

/// Free-form event properties or user traits.
pub type Properties = Map<String, Value>;

/// Operating system family the client runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Apple mobile platforms.
    Ios,
    /// Android.
    Android,
    /// Anything else, including desktop test hosts.
    Other,
}

impl Platform {
    /// Platform of the running binary.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "android") {
            Self::Android
        } else {
            Self::Other
        }
    }
}

/// Companion plugins attached to the SDK handle after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsPlugin {
    /// Install attribution.
    Attribution,
    /// Advertising-identifier collection; only attached on iOS.
    AdvertisingId,
}

impl AnalyticsPlugin {
    /// Plugins attached on `platform`, in attachment order.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Vec<Self> {
        match platform {
            Platform::Ios => vec![Self::Attribution, Self::AdvertisingId],
            Platform::Android | Platform::Other => vec![Self::Attribution],
        }
    }
}

/// Options handed to [`AnalyticsSdk::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// SDK write key.
    pub write_key: String,
    /// Enables SDK debug logging.
    pub debug: bool,
    /// Records install, open, update and background events automatically.
    pub track_lifecycle_events: bool,
    /// Platform the handle is created for.
    pub platform: Platform,
}

/// Behaviour of an [`AnalyticsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsSettings {
    /// Global kill switch.
    pub enabled: bool,
    /// SDK write key.
    pub write_key: String,
    /// Enables SDK debug logging.
    pub debug: bool,
    /// Records lifecycle events automatically.
    pub track_lifecycle_events: bool,
    /// Platform the handle is created for.
    pub platform: Platform,
    /// Calls buffered before the SDK is ready.
    pub queue_capacity: usize,
    /// Bound on SDK creation.
    pub init_timeout: Option<Duration>,
}

impl AnalyticsSettings {
    /// Derives settings from the runtime configuration.
    ///
    /// Debug logging follows the build profile.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.analytics_enabled(),
            write_key: config.analytics_write_key().to_owned(),
            debug: cfg!(debug_assertions),
            track_lifecycle_events: true,
            platform: Platform::current(),
            queue_capacity: config.analytics_queue_capacity(),
            init_timeout: config.analytics_init_timeout(),
        }
    }

    fn sdk_config(&self) -> AnalyticsConfig {
        AnalyticsConfig {
            write_key: self.write_key.clone(),
            debug: self.debug,
            track_lifecycle_events: self.track_lifecycle_events,
            platform: self.platform,
        }
    }
}

/// Ready analytics SDK client.
#[async_trait]
pub trait AnalyticsHandle: Send + Sync {
    /// Attaches a companion plugin.
    fn add_plugin(&self, plugin: AnalyticsPlugin);

    /// Ties the current user to their actions.
    async fn identify(
        &self,
        user_id: Option<String>,
        traits: Properties,
    ) -> Result<(), OperationError>;

    /// Records a screen view.
    async fn screen(&self, name: String, properties: Properties) -> Result<(), OperationError>;

    /// Records a user action.
    async fn track(&self, event: String, properties: Properties) -> Result<(), OperationError>;
}

/// Factory for SDK handles.
#[async_trait]
pub trait AnalyticsSdk: Send + Sync {
    /// Creates a ready handle.
    async fn create(
        &self,
        config: &AnalyticsConfig,
    ) -> Result<Arc<dyn AnalyticsHandle>, OperationError>;
}

/// Errors surfaced by [`AnalyticsClient::initialise`].
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The SDK refused to create a handle.
    #[error("failed to create analytics client: {source}")]
    Create {
        /// Error reported by the SDK.
        #[source]
        source: OperationError,
    },
    /// Creation did not finish in time.
    #[error("analytics client creation timed out after {timeout:?}")]
    TimedOut {
        /// Configured bound.
        timeout: Duration,
    },
}

type Handle = Arc<dyn AnalyticsHandle>;

/// Gated wrapper around the analytics SDK.
pub struct AnalyticsClient {
    settings: AnalyticsSettings,
    sdk: Arc<dyn AnalyticsSdk>,
    gated: GatedClient<Handle>,
    initialising: Mutex<()>,
}

impl AnalyticsClient {
    /// Builds an uninitialised client.
    #[must_use]
    pub fn new(
        settings: AnalyticsSettings,
        sdk: Arc<dyn AnalyticsSdk>,
        reporter: Arc<dyn QueueReporter>,
    ) -> Self {
        let gated = GatedClient::new(settings.enabled, settings.queue_capacity, reporter);
        Self {
            settings,
            sdk,
            gated,
            initialising: Mutex::new(()),
        }
    }

    /// Creates the SDK handle, attaches plugins and replays queued calls.
    ///
    /// Does nothing when analytics are disabled or already initialised.
    /// Concurrent calls create at most one handle. On failure the queue is
    /// kept so a later call can retry.
    pub async fn initialise(&self) -> Result<(), AnalyticsError> {
        if !self.settings.enabled || self.gated.is_open() {
            return Ok(());
        }

        let _initialising = self.initialising.lock().await;
        if self.gated.is_open() {
            return Ok(());
        }

        let config = self.settings.sdk_config();
        let created = match self.settings.init_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.sdk.create(&config))
                .await
                .map_err(|_| AnalyticsError::TimedOut { timeout })?,
            None => self.sdk.create(&config).await,
        };
        let handle = created.map_err(|source| AnalyticsError::Create { source })?;

        for plugin in AnalyticsPlugin::for_platform(config.platform) {
            handle.add_plugin(plugin);
        }

        let report = self.gated.open_with(handle).await;
        tracing::info!(
            target: ANALYTICS_TARGET,
            event = "analytics_ready",
            replayed = report.succeeded,
            failed = report.failed,
            "analytics client initialised"
        );
        Ok(())
    }

    /// Ties `user_id` to subsequent events and records `traits` about them.
    pub async fn identify(&self, user_id: Option<String>, traits: Properties) {
        self.gated
            .invoke(PendingOperation::new(
                "identify",
                move |handle: Handle| async move { handle.identify(user_id, traits).await },
            ))
            .await;
    }

    /// Records that the user viewed screen `name`.
    pub async fn screen(&self, name: impl Into<String>, properties: Properties) {
        let screen = name.into();
        self.gated
            .invoke(PendingOperation::new(
                "screen",
                move |handle: Handle| async move { handle.screen(screen, properties).await },
            ))
            .await;
    }

    /// Records that the user performed `event`.
    pub async fn track(&self, event: impl Into<String>, properties: Properties) {
        let action = event.into();
        self.gated
            .invoke(PendingOperation::new(
                "track",
                move |handle: Handle| async move { handle.track(action, properties).await },
            ))
            .await;
    }

    /// The SDK handle, once initialised.
    pub async fn handle(&self) -> Option<Handle> {
        self.gated.resource().await
    }

    /// Returns `true` once the SDK handle is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gated.is_open()
    }

    /// Calls waiting for the SDK.
    pub async fn pending(&self) -> usize {
        self.gated.pending().await
    }

    /// Active settings.
    #[must_use]
    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }
}

impl std::fmt::Debug for AnalyticsClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AnalyticsClient")
            .field("enabled", &self.settings.enabled)
            .field("gated", &self.gated)
            .finish_non_exhaustive()
    }
}
