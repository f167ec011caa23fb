//! Shared configuration for the bootgate client runtime.
//!
//! Values are layered by [`ortho_config`]: command-line flags override
//! `BOOTGATE_*` environment variables, which override configuration files,
//! which override the defaults in [`defaults`].

mod defaults;
mod logging;
mod network;

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ANALYTICS_INIT_TIMEOUT_MS, DEFAULT_ANALYTICS_QUEUE_CAPACITY, DEFAULT_LOG_FILTER,
    DEFAULT_SPLASH_SETTLE_MS, DEFAULT_STAGE_TIMEOUT_MS, default_data_dir,
    default_log_filter_string, default_log_format, default_network,
};
pub use logging::LogFormat;
pub use network::Network;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BOOTGATE")]
pub struct Config {
    /// Network whose identity, pairing token and API endpoints are used.
    #[ortho_config(default = default_network())]
    pub network: Network,
    /// `tracing` filter expression applied to the global subscriber.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the global subscriber.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Directory holding persisted client state.
    #[ortho_config(default = default_data_dir())]
    pub data_dir: Utf8PathBuf,
    /// Global analytics kill switch.
    #[ortho_config(default = true)]
    pub analytics_enabled: bool,
    /// Write key handed to the analytics SDK.
    #[ortho_config(default = String::new())]
    pub analytics_write_key: String,
    /// Maximum number of analytics calls buffered before the SDK is ready.
    #[ortho_config(default = DEFAULT_ANALYTICS_QUEUE_CAPACITY)]
    pub analytics_queue_capacity: usize,
    /// Bound on analytics SDK creation in milliseconds; `0` disables it.
    #[ortho_config(default = DEFAULT_ANALYTICS_INIT_TIMEOUT_MS)]
    pub analytics_init_timeout_ms: u64,
    /// Bound on each bootstrap stage in milliseconds; `0` disables it.
    #[ortho_config(default = DEFAULT_STAGE_TIMEOUT_MS)]
    pub stage_timeout_ms: u64,
    /// Pause between a successful bootstrap and readiness in milliseconds.
    #[ortho_config(default = DEFAULT_SPLASH_SETTLE_MS)]
    pub splash_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: default_network(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            data_dir: default_data_dir(),
            analytics_enabled: true,
            analytics_write_key: String::new(),
            analytics_queue_capacity: DEFAULT_ANALYTICS_QUEUE_CAPACITY,
            analytics_init_timeout_ms: DEFAULT_ANALYTICS_INIT_TIMEOUT_MS,
            stage_timeout_ms: DEFAULT_STAGE_TIMEOUT_MS,
            splash_settle_ms: DEFAULT_SPLASH_SETTLE_MS,
        }
    }
}

impl Config {
    /// Network targeted by this process.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Filter expression for the global subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for the global subscriber.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Directory holding persisted client state.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8PathBuf {
        &self.data_dir
    }

    /// Whether analytics calls reach the SDK at all.
    #[must_use]
    pub fn analytics_enabled(&self) -> bool {
        self.analytics_enabled
    }

    /// Write key handed to the analytics SDK.
    #[must_use]
    pub fn analytics_write_key(&self) -> &str {
        self.analytics_write_key.as_str()
    }

    /// Queue bound for analytics calls issued before initialisation.
    ///
    /// A configured value of zero is raised to one so the queue can always
    /// hold at least the first call.
    #[must_use]
    pub fn analytics_queue_capacity(&self) -> usize {
        self.analytics_queue_capacity.max(1)
    }

    /// Bound on analytics SDK creation, if any.
    #[must_use]
    pub fn analytics_init_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.analytics_init_timeout_ms)
    }

    /// Bound on each bootstrap stage, if any.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.stage_timeout_ms)
    }

    /// Pause between a successful bootstrap and readiness.
    #[must_use]
    pub fn splash_settle(&self) -> Duration {
        Duration::from_millis(self.splash_settle_ms)
    }
}

fn non_zero_millis(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}
