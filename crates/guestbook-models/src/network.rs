//! Target network description.
//!
//! The wallet scopes its permission grant to a single network; the client
//! passes a [`NetworkConfig`] when asking for permissions so the wallet can
//! refuse if it is pointed somewhere else.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named Tezos networks understood by wallets.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NetworkType {
    /// Production network.
    Mainnet,
    /// Florence test network.
    Florencenet,
    /// Long-running test network.
    Ghostnet,
    /// Local sandbox or development ledger.
    Custom,
}

/// Network a permission request is scoped to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Which network.
    #[serde(rename = "type")]
    pub kind: NetworkType,
    /// RPC node the wallet should use for this network.
    pub rpc_url: String,
}

impl NetworkConfig {
    /// Build a network description.
    pub fn new(kind: NetworkType, rpc_url: impl Into<String>) -> Self {
        Self {
            kind,
            rpc_url: rpc_url.into(),
        }
    }
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.rpc_url)
    }
}
