//! Global `tracing` subscriber installation.
//!
//! The first successful call owns the process-wide subscriber. Its settings
//! are captured in a [`TelemetryHandle`] and handed back to every later
//! caller, so code that reconfigures telemetry can tell its request was not
//! applied.

use std::io::{self, IsTerminal};

use bootgate_config::{Config, LogFormat, Network};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, fmt};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

static INSTALLED: OnceCell<TelemetryHandle> = OnceCell::new();

/// Settings of the subscriber that owns the global slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    network: Network,
}

impl TelemetryHandle {
    /// Output format of the installed subscriber.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Network the process was targeting when telemetry came up.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },
    /// Another subscriber already owns the global slot.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return the handle of the installed subscriber, even when
/// their configuration differs.
///
/// # Examples
///
/// ```rust
/// use bootgate::telemetry;
/// use bootgate_config::{Config, LogFormat};
///
/// # fn main() -> Result<(), bootgate::telemetry::TelemetryError> {
/// let first = telemetry::initialise(&Config::default())?;
/// let compact = Config {
///     log_format: LogFormat::Compact,
///     ..Config::default()
/// };
/// let second = telemetry::initialise(&compact)?;
/// assert_eq!(second.format(), first.format());
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install_subscriber(config))
        .copied()
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|source| TelemetryError::Filter {
        filter: expression.to_owned(),
        source,
    })
}

fn install_subscriber(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let format = config.log_format();
    let ansi = format.is_human_readable() && io::stderr().is_terminal();

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(io::stderr)
            .with_ansi(ansi)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(
            builder(filter)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .finish(),
        ),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
        LogFormat::Pretty => Box::new(
            builder(filter)
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .finish(),
        ),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;

    let handle = TelemetryHandle {
        format,
        network: config.network(),
    };
    info!(
        target: TELEMETRY_TARGET,
        event = "telemetry_installed",
        format = %handle.format,
        network = %handle.network,
        filter = config.log_filter(),
        "telemetry installed"
    );
    Ok(handle)
}
