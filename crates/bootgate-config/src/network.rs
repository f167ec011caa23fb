//! Logical networks the client can target.
//!
//! Identities and pairing tokens are scoped per network: switching networks
//! never reuses credentials minted for another one.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Network environment selected for the running process.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression network used in development.
    Regtest,
}

impl Network {
    /// Stable label used when deriving persistence keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
