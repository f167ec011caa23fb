//! Output formats for the client's structured logs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the global subscriber renders events.
///
/// Field builds ship logs to a collector, so JSON is the default. Developers
/// running the client locally usually want `compact` or `pretty`.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// Single-line human-readable output.
    Compact,
    /// Multi-line output with source locations, for local debugging.
    Pretty,
}

impl LogFormat {
    /// Whether the format is meant for a person rather than a collector.
    #[must_use]
    pub fn is_human_readable(self) -> bool {
        !matches!(self, Self::Json)
    }
}
