//! Client configuration.
//!
//! Built once at startup from, in increasing precedence: built-in defaults,
//! the settings file ([`crate::settings`]) and environment variables.
//! Binaries apply their command-line flags on top.

use std::time::Duration;

use guestbook_models::{ContractAddress, NetworkConfig, NetworkType};

use crate::settings::{load_settings, Settings};
use crate::submission::SubmitPolicy;

/// Public RPC node of the network the guestbook was originated on.
pub const DEFAULT_RPC_URL: &str = "https://florencenet.api.tez.ie";
/// The guestbook contract.
pub const DEFAULT_CONTRACT: &str = "KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu";
/// Wallet bridge served by `mock-ledger` in development.
pub const DEFAULT_WALLET_URL: &str = "http://localhost:8732/wallet";
/// Name shown by the wallet in its approval prompt.
pub const DEFAULT_APP_NAME: &str = "TezosDApp";

const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 180;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuestbookConfig {
    pub rpc_url: String,
    pub wallet_url: String,
    pub network: NetworkConfig,
    pub contract: ContractAddress,
    pub app_name: String,
    /// Head polling interval while awaiting a confirmation.
    pub poll_interval: Duration,
    pub submit: SubmitPolicy,
}

impl GuestbookConfig {
    /// Defaults, then the settings file, then the environment.
    ///
    /// | Variable                         | Default                                | Description |
    /// |----------------------------------|----------------------------------------|-------------|
    /// | `GUESTBOOK_RPC_URL`              | `https://florencenet.api.tez.ie`       | node RPC |
    /// | `GUESTBOOK_WALLET_URL`           | `http://localhost:8732/wallet`         | wallet bridge |
    /// | `GUESTBOOK_NETWORK`              | `florencenet`                          | network of the permission request |
    /// | `GUESTBOOK_CONTRACT`             | `KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu` | guestbook contract |
    /// | `GUESTBOOK_APP_NAME`             | `TezosDApp`                            | name shown by the wallet |
    /// | `GUESTBOOK_CONFIRM_TIMEOUT_SECS` | `180` (`0` = unbounded)                | confirmation bound |
    /// | `GUESTBOOK_POLL_INTERVAL_MS`     | `2000`                                 | head polling interval |
    /// | `GUESTBOOK_CLEAR_ON_SUCCESS`     | `false`                                | clear message once confirmed |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(load_settings(), |key| std::env::var(key).ok())
    }

    /// Defaults and the environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(Settings::default(), |key| std::env::var(key).ok())
    }

    /// Resolve every option from `settings` overridden by `env`.
    pub fn from_sources(
        settings: Settings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let rpc_url = env("GUESTBOOK_RPC_URL")
            .or(settings.rpc_url)
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let wallet_url = env("GUESTBOOK_WALLET_URL")
            .or(settings.wallet_url)
            .unwrap_or_else(|| DEFAULT_WALLET_URL.to_string());
        let app_name = env("GUESTBOOK_APP_NAME")
            .or(settings.app_name)
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let network = match env("GUESTBOOK_NETWORK") {
            Some(v) => v
                .parse::<NetworkType>()
                .map_err(|e| invalid("GUESTBOOK_NETWORK", e))?,
            None => settings.network.unwrap_or(NetworkType::Florencenet),
        };

        let contract_raw = env("GUESTBOOK_CONTRACT")
            .or(settings.contract)
            .unwrap_or_else(|| DEFAULT_CONTRACT.to_string());
        let contract =
            ContractAddress::parse(&contract_raw).map_err(|e| invalid("GUESTBOOK_CONTRACT", e))?;

        let confirm_timeout_secs = parse_env(&env, "GUESTBOOK_CONFIRM_TIMEOUT_SECS")?
            .or(settings.confirm_timeout_secs)
            .unwrap_or(DEFAULT_CONFIRM_TIMEOUT_SECS);
        let poll_interval_ms = parse_env(&env, "GUESTBOOK_POLL_INTERVAL_MS")?
            .or(settings.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        let clear_message_on_success = parse_env(&env, "GUESTBOOK_CLEAR_ON_SUCCESS")?
            .or(settings.clear_on_success)
            .unwrap_or(false);

        Ok(Self {
            network: NetworkConfig::new(network, rpc_url.clone()),
            rpc_url,
            wallet_url,
            contract,
            app_name,
            poll_interval: Duration::from_millis(poll_interval_ms),
            submit: SubmitPolicy {
                confirmation_timeout: (confirm_timeout_secs > 0)
                    .then(|| Duration::from_secs(confirm_timeout_secs)),
                clear_message_on_success,
            },
        })
    }

    /// Point the client at another node; the permission request follows.
    pub fn with_rpc_url(mut self, rpc_url: &str) -> Self {
        self.rpc_url = rpc_url.to_string();
        self.network.rpc_url = rpc_url.to_string();
        self
    }

    /// The settings that reproduce this configuration.
    pub fn to_settings(&self) -> Settings {
        Settings {
            rpc_url: Some(self.rpc_url.clone()),
            wallet_url: Some(self.wallet_url.clone()),
            network: Some(self.network.kind),
            contract: Some(self.contract.to_string()),
            app_name: Some(self.app_name.clone()),
            confirm_timeout_secs: Some(
                self.submit
                    .confirmation_timeout
                    .map_or(0, |t| t.as_secs()),
            ),
            poll_interval_ms: Some(u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX)),
            clear_on_success: Some(self.submit.clear_message_on_success),
        }
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|v| v.trim().parse::<T>().map_err(|e| invalid(key, e)))
        .transpose()
}
