//! Composition root: configuration, telemetry and the two gated services.

use std::sync::Arc;

use bootgate_config::Config;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::{info, warn};

use crate::analytics::{AnalyticsClient, AnalyticsSdk, AnalyticsSettings, Properties};
use crate::bootstrap::{BootstrapError, BootstrapOrchestrator, Bootstrapped, Collaborators};
use crate::health::{
    HealthReporter, QueueReporter, StructuredHealthReporter, StructuredQueueReporter,
};
use crate::placeholder::{LoggingAnalyticsSdk, placeholder_collaborators};
use crate::telemetry::{self, TelemetryError};

const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Abstracts configuration loading for tests.
pub trait ConfigLoader: Send + Sync {
    /// Loads the runtime configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that layers CLI flags, environment and files via [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced while launching the client runtime.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[from]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[from]
        source: TelemetryError,
    },
    /// A required bootstrap stage failed.
    #[error(transparent)]
    Bootstrap {
        /// Underlying bootstrap error.
        #[from]
        source: BootstrapError,
    },
}

/// The client runtime: one bootstrap orchestrator and one analytics client.
#[derive(Debug)]
pub struct Client {
    config: Config,
    bootstrap: BootstrapOrchestrator,
    analytics: AnalyticsClient,
}

impl Client {
    /// Wires the services from their collaborators.
    #[must_use]
    pub fn new(
        config: Config,
        collaborators: Collaborators,
        analytics_sdk: Arc<dyn AnalyticsSdk>,
        health: Arc<dyn HealthReporter>,
        queue: Arc<dyn QueueReporter>,
    ) -> Self {
        let bootstrap = BootstrapOrchestrator::new(&config, collaborators, health);
        let analytics =
            AnalyticsClient::new(AnalyticsSettings::from_config(&config), analytics_sdk, queue);
        Self {
            config,
            bootstrap,
            analytics,
        }
    }

    /// Runs the bootstrap sequence and initialises analytics concurrently.
    ///
    /// Analytics failures are logged and never fail the start; queued calls
    /// stay buffered for a later [`AnalyticsClient::initialise`].
    pub async fn start(&self) -> Result<Bootstrapped, BootstrapError> {
        let (bootstrapped, analytics) =
            tokio::join!(self.bootstrap.start(), self.analytics.initialise());
        if let Err(error) = analytics {
            warn!(
                target: LAUNCH_TARGET,
                error = %error,
                "analytics unavailable; calls remain queued"
            );
        }
        bootstrapped
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The bootstrap orchestrator.
    #[must_use]
    pub fn bootstrap(&self) -> &BootstrapOrchestrator {
        &self.bootstrap
    }

    /// The analytics client.
    #[must_use]
    pub fn analytics(&self) -> &AnalyticsClient {
        &self.analytics
    }
}

/// Launches the client with system configuration and placeholder
/// collaborators.
pub async fn run_client() -> Result<(), LaunchError> {
    let client = launch_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(StructuredQueueReporter::new()),
    )
    .await?;
    info!(
        target: LAUNCH_TARGET,
        network = %client.config().network(),
        readiness = %client.bootstrap().readiness(),
        "client runtime started"
    );
    Ok(())
}

/// Loads configuration, installs telemetry and starts a [`Client`].
pub(crate) async fn launch_with(
    loader: &dyn ConfigLoader,
    health: Arc<dyn HealthReporter>,
    queue: Arc<dyn QueueReporter>,
) -> Result<Client, LaunchError> {
    let config = loader.load()?;
    let _telemetry = telemetry::initialise(&config)?;

    let collaborators = placeholder_collaborators(&config);
    let client = Client::new(
        config,
        collaborators,
        Arc::new(LoggingAnalyticsSdk),
        health,
        queue,
    );
    client.start().await?;
    client
        .analytics()
        .track("Application Opened", Properties::new())
        .await;
    Ok(client)
}
