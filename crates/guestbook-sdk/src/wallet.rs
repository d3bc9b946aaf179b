//! HTTP wallet-bridge signer.
//!
//! Desktop and terminal clients cannot embed a browser wallet, so they talk
//! to a small bridge process that owns the keys, shows the approval prompt
//! and injects signed operations. The wire types in this module are shared
//! with the development ledger, which implements the same bridge.

use async_trait::async_trait;
use guestbook_models::{Address, ContractCall, NetworkConfig, OperationHash};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capability::WalletSigner;
use crate::error::SdkError;
use crate::paths::RpcPaths;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /permissions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PermissionRequest {
    /// Network the grant is scoped to.
    pub network: NetworkConfig,
    /// Name shown to the user in the approval prompt.
    pub app_name: String,
}

/// Response carrying an account (`null` when nothing is granted).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccountResponse {
    /// The granted account.
    pub address: Option<Address>,
}

/// Response of `POST /operations`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperationResponse {
    /// Hash of the injected operation.
    pub operation_hash: OperationHash,
}

// ---------------------------------------------------------------------------
// HttpWalletSigner
// ---------------------------------------------------------------------------

/// [`WalletSigner`] backed by a wallet bridge reachable over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWalletSigner {
    http: reqwest::Client,
    base_url: String,
    app_name: String,
}

impl HttpWalletSigner {
    /// Create a signer for the bridge at `base_url`.
    pub fn new(base_url: &str, app_name: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map a non-success response to an error.
    ///
    /// `401`/`403` mean the user (or wallet policy) declined.
    async fn check(res: reqwest::Response) -> Result<reqwest::Response, SdkError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            Err(SdkError::WalletRejected(body))
        } else {
            Err(SdkError::Rpc {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn granted_account(&self, path: &str) -> Result<Option<Address>, SdkError> {
        let res = self.http.get(self.url(path)).send().await?;
        let body: AccountResponse = Self::check(res).await?.json().await?;
        Ok(body.address)
    }
}

#[async_trait]
impl WalletSigner for HttpWalletSigner {
    async fn active_account(&self) -> Result<Option<Address>, SdkError> {
        self.granted_account(RpcPaths::WALLET_ACTIVE_ACCOUNT).await
    }

    async fn request_permissions(&self, network: &NetworkConfig) -> Result<Address, SdkError> {
        let req = PermissionRequest {
            network: network.clone(),
            app_name: self.app_name.clone(),
        };
        debug!(network = %network, app = %self.app_name, "requesting permissions");
        let res = self
            .http
            .post(self.url(RpcPaths::WALLET_PERMISSIONS))
            .json(&req)
            .send()
            .await?;
        let body: AccountResponse = Self::check(res).await?.json().await?;
        body.address
            .ok_or_else(|| SdkError::WalletRejected("permission response without address".into()))
    }

    async fn public_key_hash(&self) -> Result<Address, SdkError> {
        self.granted_account(RpcPaths::WALLET_PUBLIC_KEY_HASH)
            .await?
            .ok_or_else(|| SdkError::WalletRejected("no account granted".into()))
    }

    async fn send_operation(&self, call: &ContractCall) -> Result<OperationHash, SdkError> {
        let res = self
            .http
            .post(self.url(RpcPaths::WALLET_OPERATIONS))
            .json(call)
            .send()
            .await?;
        let body: OperationResponse = Self::check(res).await?.json().await?;
        Ok(body.operation_hash)
    }

    async fn clear_active_account(&self) -> Result<(), SdkError> {
        let res = self
            .http
            .delete(self.url(RpcPaths::WALLET_ACTIVE_ACCOUNT))
            .send()
            .await?;
        if let Err(e) = Self::check(res).await {
            warn!(error = %e, "wallet did not clear its grant");
            return Err(e);
        }
        Ok(())
    }
}
