//! BDD test world: owns a runtime plus every double the scenarios inspect.

use std::cell::RefCell;
use std::sync::Arc;

use bootgate_config::Config;
use tokio::runtime::Runtime;

use crate::analytics::{AnalyticsClient, AnalyticsSettings, Properties};
use crate::bootstrap::{
    BootstrapError, BootstrapOrchestrator, Bootstrapped, identity_key, pairing_token_key,
};
use crate::identity::{Ed25519IdentityGenerator, IdentityGenerator};

use super::analytics::RecordingAnalyticsSdk;
use super::reporter::{RecordingHealthReporter, RecordingQueueReporter};
use super::services::FakeServices;
use super::store::MemoryStore;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    runtime: Runtime,
    config: Config,
    pub store: Arc<MemoryStore>,
    pub services: Arc<FakeServices>,
    pub health: Arc<RecordingHealthReporter>,
    pub queue: Arc<RecordingQueueReporter>,
    pub sdk: Arc<RecordingAnalyticsSdk>,
    outcomes: Vec<Result<Bootstrapped, BootstrapError>>,
    analytics: Option<AnalyticsClient>,
}

impl TestWorld {
    /// Builds a world with empty storage and healthy collaborators.
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build test runtime");
        Self {
            runtime,
            config: test_config(),
            store: Arc::new(MemoryStore::default()),
            services: Arc::new(FakeServices::default()),
            health: Arc::new(RecordingHealthReporter::default()),
            queue: Arc::new(RecordingQueueReporter::default()),
            sdk: Arc::new(RecordingAnalyticsSdk::default()),
            outcomes: Vec::new(),
            analytics: None,
        }
    }

    /// Stores a pairing token for the configured network.
    pub fn pair(&self, token: &str) {
        self.store
            .insert(&pairing_token_key(self.config.network()), token.as_bytes());
    }

    /// Stores a valid identity for the configured network.
    pub fn persist_identity(&self) {
        let identity = Ed25519IdentityGenerator
            .generate()
            .expect("generate identity");
        let bytes = identity.encode().expect("encode identity");
        self.store
            .insert(&identity_key(self.config.network()), &bytes);
    }

    /// Runs a fresh orchestrator to completion.
    pub fn bootstrap(&mut self) {
        let orchestrator = BootstrapOrchestrator::new(
            &self.config,
            self.services.collaborators(&self.store),
            self.health.clone(),
        );
        let outcome = self.runtime.block_on(orchestrator.start());
        self.outcomes.push(outcome);
    }

    /// Result of the most recent bootstrap.
    pub fn last_outcome(&self) -> Option<&Result<Bootstrapped, BootstrapError>> {
        self.outcomes.last()
    }

    /// Sets the analytics kill switch and builds a fresh analytics client.
    pub fn configure_analytics(&mut self, enabled: bool) {
        let settings = AnalyticsSettings {
            enabled,
            ..AnalyticsSettings::from_config(&self.config)
        };
        self.analytics = Some(AnalyticsClient::new(
            settings,
            self.sdk.clone(),
            self.queue.clone(),
        ));
    }

    /// Issues a `track` call for each event in order.
    pub fn track_all(&self, events: &[String]) -> Result<(), String> {
        let client = self.analytics()?;
        for event in events {
            self.runtime
                .block_on(client.track(event.clone(), Properties::new()));
        }
        Ok(())
    }

    /// Initialises the analytics client.
    pub fn initialise_analytics(&self) -> Result<(), String> {
        let client = self.analytics()?;
        self.runtime
            .block_on(client.initialise())
            .map_err(|error| error.to_string())
    }

    fn analytics(&self) -> Result<&AnalyticsClient, String> {
        self.analytics
            .as_ref()
            .ok_or_else(|| "analytics client not configured".to_owned())
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with no settle delay.
pub fn test_config() -> Config {
    Config {
        splash_settle_ms: 0,
        ..Config::default()
    }
}

/// Default test world fixture.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
