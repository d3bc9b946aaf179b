//! Capability traits for the two external collaborators.
//!
//! The guestbook core never talks to a node or a wallet directly. It is
//! handed an `Arc<dyn WalletSigner>` and an `Arc<dyn LedgerClient>` at
//! construction time, which keeps it testable with in-process fakes and
//! lets a binary pick concrete transports ([`crate::HttpWalletSigner`],
//! [`crate::RpcLedgerClient`]).

use async_trait::async_trait;
use guestbook_models::{
    Address, Confirmation, ContractAddress, ContractCall, Entry, Mutez, NetworkConfig,
    OperationHandle, OperationHash, Unit, DEFAULT_ENTRYPOINT,
};
use serde_json::Value;

use crate::error::SdkError;

/// A wallet able to grant access to an account and sign operations.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Account already granted to this application, if any.
    async fn active_account(&self) -> Result<Option<Address>, SdkError>;

    /// Ask the user to grant access for the given network.
    ///
    /// Fails with [`SdkError::WalletRejected`] when the user declines or the
    /// wallet is configured for another network.
    async fn request_permissions(&self, network: &NetworkConfig) -> Result<Address, SdkError>;

    /// Public key hash (address) of the granted account.
    async fn public_key_hash(&self) -> Result<Address, SdkError>;

    /// Sign and inject a contract call, returning the operation hash.
    async fn send_operation(&self, call: &ContractCall) -> Result<OperationHash, SdkError>;

    /// Forget the current grant.
    async fn clear_active_account(&self) -> Result<(), SdkError>;
}

/// A bound contract, obtained from [`LedgerClient::contract_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    /// Address of the contract.
    pub address: ContractAddress,
    /// Entry points the contract exposes (always includes `default`).
    pub entrypoints: Vec<String>,
}

impl ContractHandle {
    /// Build a handle; `default` is added when missing.
    pub fn new(address: ContractAddress, mut entrypoints: Vec<String>) -> Self {
        if !entrypoints.iter().any(|e| e == DEFAULT_ENTRYPOINT) {
            entrypoints.push(DEFAULT_ENTRYPOINT.to_string());
        }
        entrypoints.sort();
        Self {
            address,
            entrypoints,
        }
    }

    /// Whether the contract exposes `name`.
    pub fn has_entrypoint(&self, name: &str) -> bool {
        self.entrypoints.iter().any(|e| e == name)
    }
}

/// Read and write access to the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Spendable balance of `account`.
    async fn balance(&self, account: &Address) -> Result<Mutez, SdkError>;

    /// Bind to an originated contract.
    async fn contract_at(&self, address: &ContractAddress) -> Result<ContractHandle, SdkError>;

    /// Current storage of the guestbook contract, read wholesale.
    async fn contract_storage(&self, contract: &ContractHandle) -> Result<Vec<Entry>, SdkError>;

    /// Submit a call to `entrypoint` with a Micheline `parameter`.
    async fn invoke(
        &self,
        contract: &ContractHandle,
        entrypoint: &str,
        parameter: Value,
    ) -> Result<OperationHandle, SdkError>;

    /// Wait until the operation is included and report whether it applied.
    ///
    /// Implementations may wait indefinitely; callers bound the wait.
    async fn await_confirmation(&self, operation: &OperationHandle)
        -> Result<Confirmation, SdkError>;

    /// Render an amount for display.
    fn format_amount(&self, unit: Unit, value: Mutez) -> String {
        value.format(unit)
    }
}

/// Build the [`ContractCall`] for an invocation, checking the entry point.
pub fn build_call(
    contract: &ContractHandle,
    entrypoint: &str,
    parameter: Value,
) -> Result<ContractCall, SdkError> {
    if !contract.has_entrypoint(entrypoint) {
        return Err(SdkError::Config(format!(
            "contract {} has no entry point \"{entrypoint}\"",
            contract.address
        )));
    }
    Ok(ContractCall {
        destination: contract.address.clone(),
        entrypoint: entrypoint.to_string(),
        parameter,
        amount: Mutez::ZERO,
    })
}
