//! # Guestbook SDK
//!
//! Capabilities the guestbook client consumes, and their concrete
//! transports.
//!
//! The SDK provides:
//!
//! * [`WalletSigner`] and [`LedgerClient`], the two capability traits the
//!   core is written against.
//! * [`RpcLedgerClient`], a Tezos node RPC client (balance, storage,
//!   invocation through a wallet, confirmation polling).
//! * [`HttpWalletSigner`], a client for an HTTP wallet bridge.
//! * [`RpcPaths`], canonical node and bridge paths shared with the
//!   development ledger.
//! * [`SdkError`], the unified error type.
//!
//! Model types from [`guestbook_models`] are re-exported for convenience.

pub mod capability;
pub mod error;
pub mod paths;
pub mod rpc;
pub mod wallet;

pub use capability::{build_call, ContractHandle, LedgerClient, WalletSigner};
pub use error::SdkError;
pub use paths::RpcPaths;
pub use rpc::RpcLedgerClient;
pub use wallet::HttpWalletSigner;

pub use guestbook_models::{
    Address, Confirmation, ContractAddress, ContractCall, Entry, Mutez, NetworkConfig,
    NetworkType, OperationHandle, OperationHash, Unit,
};
