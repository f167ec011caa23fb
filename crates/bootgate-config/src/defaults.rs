use camino::Utf8PathBuf;
use std::env;

use crate::logging::LogFormat;
use crate::network::Network;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default number of analytics calls buffered before the SDK is ready.
pub const DEFAULT_ANALYTICS_QUEUE_CAPACITY: usize = 1_000;

/// Default bound on analytics SDK creation, in milliseconds.
pub const DEFAULT_ANALYTICS_INIT_TIMEOUT_MS: u64 = 10_000;

/// Default bound on any single bootstrap stage, in milliseconds.
pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 30_000;

/// Default pause between a successful bootstrap and readiness, in milliseconds.
pub const DEFAULT_SPLASH_SETTLE_MS: u64 = 500;

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default network targeted by a fresh install.
pub fn default_network() -> Network {
    Network::Mainnet
}

/// Computes the default directory for persisted client state.
pub fn default_data_dir() -> Utf8PathBuf {
    let mut base = dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push("bootgate");
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
