//! Tezos node RPC client.
//!
//! [`RpcLedgerClient`] implements [`LedgerClient`] over plain HTTP against a
//! node (or the development ledger). Writes are delegated to an attached
//! [`WalletSigner`], which signs and injects the operation; the client then
//! follows the chain head to find the block that included it.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use guestbook_models::{Address, ContractAddress};
//! use guestbook_sdk::{HttpWalletSigner, LedgerClient, RpcLedgerClient};
//!
//! # async fn run() -> Result<(), guestbook_sdk::SdkError> {
//! let wallet = Arc::new(HttpWalletSigner::new("http://localhost:8732/wallet", "TezosDApp"));
//! let ledger = RpcLedgerClient::new("http://localhost:8732").with_wallet(wallet);
//!
//! let kt1 = ContractAddress::parse("KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu")?;
//! let contract = ledger.contract_at(&kt1).await?;
//! for entry in ledger.contract_storage(&contract).await? {
//!     println!("{} {}", entry.address, entry.text);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guestbook_models::micheline::decode_entries;
use guestbook_models::{
    Address, Confirmation, ContractAddress, Entry, Mutez, OperationHandle, OperationHash,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::capability::{build_call, ContractHandle, LedgerClient, WalletSigner};
use crate::error::SdkError;
use crate::paths::RpcPaths;

/// Default interval between two head polls while awaiting a confirmation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Status string of an operation result that was applied.
const APPLIED: &str = "applied";

/// HTTP client for a Tezos node.
#[derive(Clone)]
pub struct RpcLedgerClient {
    http: reqwest::Client,
    rpc_url: String,
    wallet: Option<Arc<dyn WalletSigner>>,
    poll_interval: Duration,
}

impl RpcLedgerClient {
    /// Create a read-only client for the node at `rpc_url`.
    pub fn new(rpc_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.trim_end_matches('/').to_string(),
            wallet: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Attach the wallet used to sign and inject invocations.
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletSigner>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Override the head polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Base URL of the node.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Level of the current head block.
    pub async fn head_level(&self) -> Result<u64, SdkError> {
        let header = self.get_json(&RpcPaths::head_header()).await?;
        header["level"]
            .as_u64()
            .ok_or_else(|| SdkError::UnexpectedResponse("header without `level`".into()))
    }

    async fn get_json(&self, path: &str) -> Result<Value, SdkError> {
        let res = self
            .http
            .get(format!("{}{path}", self.rpc_url))
            .send()
            .await?;
        Self::json_body(res).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, SdkError> {
        let res = self
            .http
            .post(format!("{}{path}", self.rpc_url))
            .json(body)
            .send()
            .await?;
        Self::json_body(res).await
    }

    async fn json_body(res: reqwest::Response) -> Result<Value, SdkError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SdkError::Rpc {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn balance(&self, account: &Address) -> Result<Mutez, SdkError> {
        let body = self.get_json(&RpcPaths::balance(account)).await?;
        let raw = body
            .as_str()
            .ok_or_else(|| SdkError::UnexpectedResponse(format!("balance is not a string: {body}")))?;
        Ok(raw.parse()?)
    }

    async fn contract_at(&self, address: &ContractAddress) -> Result<ContractHandle, SdkError> {
        let body = self.get_json(&RpcPaths::entrypoints(address)).await?;
        let entrypoints = parse_entrypoints(&body)?;
        debug!(contract = %address, ?entrypoints, "contract bound");
        Ok(ContractHandle::new(address.clone(), entrypoints))
    }

    async fn contract_storage(&self, contract: &ContractHandle) -> Result<Vec<Entry>, SdkError> {
        let storage = self
            .post_json(
                &RpcPaths::storage_normalized(&contract.address),
                &json!({ "unparsing_mode": "Readable" }),
            )
            .await?;
        Ok(decode_entries(&storage)?)
    }

    async fn invoke(
        &self,
        contract: &ContractHandle,
        entrypoint: &str,
        parameter: Value,
    ) -> Result<OperationHandle, SdkError> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| SdkError::Config("no wallet attached to the RPC client".into()))?;
        let call = build_call(contract, entrypoint, parameter)?;

        let injected_after_level = self.head_level().await?;
        let hash = wallet.send_operation(&call).await?;
        info!(operation = %hash, contract = %contract.address, entrypoint, "operation injected");

        Ok(OperationHandle {
            hash,
            injected_after_level,
        })
    }

    async fn await_confirmation(
        &self,
        operation: &OperationHandle,
    ) -> Result<Confirmation, SdkError> {
        let mut next_level = operation.injected_after_level + 1;
        loop {
            let head = self.head_level().await?;
            while next_level <= head {
                let operations = self.get_json(&RpcPaths::block_operations(next_level)).await?;
                if let Some(applied) = find_operation_status(&operations, &operation.hash) {
                    info!(
                        operation = %operation.hash,
                        level = next_level,
                        applied,
                        "operation included"
                    );
                    return Ok(Confirmation {
                        completed: applied,
                        level: next_level,
                    });
                }
                next_level += 1;
            }
            debug!(operation = %operation.hash, head, "not yet included");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Entry point names from an `/entrypoints` response.
fn parse_entrypoints(body: &Value) -> Result<Vec<String>, SdkError> {
    let map = body["entrypoints"]
        .as_object()
        .ok_or_else(|| SdkError::UnexpectedResponse(format!("no `entrypoints` in {body}")))?;
    Ok(map.keys().cloned().collect())
}

/// Look for `hash` in a block's operation lists.
///
/// Returns `Some(true)` when every content of the operation was applied,
/// `Some(false)` when it was included but failed, backtracked or skipped,
/// and `None` when the block does not contain it.
pub fn find_operation_status(operations: &Value, hash: &OperationHash) -> Option<bool> {
    let passes = operations.as_array()?;
    let op = passes
        .iter()
        .filter_map(Value::as_array)
        .flatten()
        .find(|op| op["hash"].as_str() == Some(hash.as_str()))?;

    let contents = op["contents"].as_array()?;
    let applied = !contents.is_empty()
        && contents.iter().all(|c| {
            c["metadata"]["operation_result"]["status"].as_str() == Some(APPLIED)
        });
    Some(applied)
}
