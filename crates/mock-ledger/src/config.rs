//! Configuration for the development ledger, read from the environment.

use guestbook_models::{Address, ContractAddress, Mutez, NetworkType};

/// Default listening port (the usual sandbox node port).
const DEFAULT_PORT: u16 = 8732;

/// Account the bridge grants on a permission request.
const DEFAULT_ACCOUNT: &str = "tz1W4W2yFAHz7iGyQvFys4K7Df9mZL6cSKCp";

const DEFAULT_CONTRACT: &str = "KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu";

/// 100 tez.
const DEFAULT_BALANCE: u64 = 100_000_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub listen_port: u16,
    pub account: Address,
    pub contract: ContractAddress,
    pub initial_balance: Mutez,
    /// When set, permission requests for any other network are refused.
    pub network: Option<NetworkType>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_PORT,
            account: Address::new(DEFAULT_ACCOUNT),
            contract: ContractAddress::parse(DEFAULT_CONTRACT)
                .expect("default contract address is valid"),
            initial_balance: Mutez::new(DEFAULT_BALANCE),
            network: None,
        }
    }
}

impl MockConfig {
    /// Build configuration from environment variables.
    ///
    /// | Variable                 | Default                                | Description |
    /// |--------------------------|----------------------------------------|-------------|
    /// | `MOCK_LEDGER_PORT`       | `8732`                                 | HTTP listen port |
    /// | `MOCK_LEDGER_ACCOUNT`    | `tz1W4W2yFAHz7iGyQvFys4K7Df9mZL6cSKCp` | account granted by the bridge |
    /// | `MOCK_LEDGER_CONTRACT`   | `KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu` | address of the guestbook |
    /// | `MOCK_LEDGER_BALANCE`    | `100000000`                            | initial balance in mutez |
    /// | `MOCK_LEDGER_NETWORK`    | *(any)*                                | only grant for this network |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = env("MOCK_LEDGER_PORT") {
            config.listen_port = v.parse().map_err(|e| invalid("MOCK_LEDGER_PORT", e))?;
        }
        if let Some(v) = env("MOCK_LEDGER_ACCOUNT") {
            config.account = Address::parse(&v).map_err(|e| invalid("MOCK_LEDGER_ACCOUNT", e))?;
        }
        if let Some(v) = env("MOCK_LEDGER_CONTRACT") {
            config.contract =
                ContractAddress::parse(&v).map_err(|e| invalid("MOCK_LEDGER_CONTRACT", e))?;
        }
        if let Some(v) = env("MOCK_LEDGER_BALANCE") {
            config.initial_balance = v.parse().map_err(|e| invalid("MOCK_LEDGER_BALANCE", e))?;
        }
        if let Some(v) = env("MOCK_LEDGER_NETWORK") {
            config.network = Some(v.parse().map_err(|e| invalid("MOCK_LEDGER_NETWORK", e))?);
        }
        Ok(config)
    }
}

fn invalid(key: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}
