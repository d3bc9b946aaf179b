//! Canonical RPC and wallet-bridge paths.
//!
//! Every URL path the client requests, and every route the development
//! ledger serves, is built through [`RpcPaths`] so both sides agree on a
//! single layout.
//!
//! # Node RPC layout
//!
//! ```text
//! /chains/main/blocks/head/header                                   ← current level
//! /chains/main/blocks/{level}/operations                            ← confirmation scan
//! /chains/main/blocks/head/context/contracts/{addr}/balance         ← balance (mutez string)
//! /chains/main/blocks/head/context/contracts/{kt1}/entrypoints      ← contract handle
//! /chains/main/blocks/head/context/contracts/{kt1}/storage/normalized  ← storage (POST)
//! ```
//!
//! # Wallet bridge layout
//!
//! ```text
//! /active-account      ← GET current grant, DELETE to forget it
//! /permissions         ← POST permission request
//! /public-key-hash     ← GET account of the grant
//! /operations          ← POST a contract call to sign and inject
//! ```

use guestbook_models::{Address, ContractAddress};

const CHAIN: &str = "/chains/main";
const HEAD_CONTEXT: &str = "/chains/main/blocks/head/context/contracts";

/// Central authority for RPC and wallet-bridge paths.
///
/// # Examples
///
/// ```
/// use guestbook_models::{Address, ContractAddress};
/// use guestbook_sdk::RpcPaths;
///
/// let kt1 = ContractAddress::parse("KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu").unwrap();
/// assert_eq!(
///     RpcPaths::storage_normalized(&kt1),
///     "/chains/main/blocks/head/context/contracts/KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu/storage/normalized",
/// );
/// assert_eq!(RpcPaths::block_operations(42), "/chains/main/blocks/42/operations");
/// ```
pub struct RpcPaths;

impl RpcPaths {
    // ------------------------------------------------------------------
    // Node RPC
    // ------------------------------------------------------------------

    /// Header of the current head block (contains `level`).
    pub fn head_header() -> String {
        format!("{CHAIN}/blocks/head/header")
    }

    /// All operations of the block at `level`, grouped by validation pass.
    pub fn block_operations(level: u64) -> String {
        format!("{CHAIN}/blocks/{level}/operations")
    }

    /// Spendable balance of any account, in mutez.
    pub fn balance(address: &Address) -> String {
        format!("{HEAD_CONTEXT}/{address}/balance")
    }

    /// Entry points of an originated contract.
    pub fn entrypoints(contract: &ContractAddress) -> String {
        format!("{HEAD_CONTEXT}/{contract}/entrypoints")
    }

    /// Storage of an originated contract, normalized by the node.
    pub fn storage_normalized(contract: &ContractAddress) -> String {
        format!("{HEAD_CONTEXT}/{contract}/storage/normalized")
    }

    // ------------------------------------------------------------------
    // Node RPC route templates (`{name}` marks a path parameter)
    // ------------------------------------------------------------------

    /// Template of [`RpcPaths::head_header`].
    pub const HEAD_HEADER: &'static str = "/chains/main/blocks/head/header";
    /// Template of [`RpcPaths::block_operations`]; `{block}` is a level or `head`.
    pub const BLOCK_OPERATIONS: &'static str = "/chains/main/blocks/{block}/operations";
    /// Template of [`RpcPaths::balance`].
    pub const BALANCE: &'static str =
        "/chains/main/blocks/head/context/contracts/{address}/balance";
    /// Template of [`RpcPaths::entrypoints`].
    pub const ENTRYPOINTS: &'static str =
        "/chains/main/blocks/head/context/contracts/{address}/entrypoints";
    /// Template of [`RpcPaths::storage_normalized`].
    pub const STORAGE_NORMALIZED: &'static str =
        "/chains/main/blocks/head/context/contracts/{address}/storage/normalized";

    // ------------------------------------------------------------------
    // Wallet bridge
    // ------------------------------------------------------------------

    /// Currently granted account.
    pub const WALLET_ACTIVE_ACCOUNT: &'static str = "/active-account";
    /// Permission request.
    pub const WALLET_PERMISSIONS: &'static str = "/permissions";
    /// Public key hash of the granted account.
    pub const WALLET_PUBLIC_KEY_HASH: &'static str = "/public-key-hash";
    /// Sign-and-inject endpoint.
    pub const WALLET_OPERATIONS: &'static str = "/operations";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kt1() -> ContractAddress {
        ContractAddress::parse("KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu").unwrap()
    }

    #[test]
    fn head_header_path() {
        assert_eq!(RpcPaths::head_header(), "/chains/main/blocks/head/header");
    }

    #[test]
    fn balance_path() {
        assert_eq!(
            RpcPaths::balance(&Address::new("tz1Abc")),
            "/chains/main/blocks/head/context/contracts/tz1Abc/balance",
        );
    }

    #[test]
    fn entrypoints_path() {
        assert_eq!(
            RpcPaths::entrypoints(&kt1()),
            "/chains/main/blocks/head/context/contracts/KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu/entrypoints",
        );
    }

    #[test]
    fn block_operations_path() {
        assert_eq!(RpcPaths::block_operations(7), "/chains/main/blocks/7/operations");
    }

    #[test]
    fn builders_fill_the_route_templates() {
        let kt1 = kt1();
        let contract = |template: &str| template.replace("{address}", kt1.as_str());
        assert_eq!(RpcPaths::head_header(), RpcPaths::HEAD_HEADER);
        assert_eq!(
            RpcPaths::block_operations(7),
            RpcPaths::BLOCK_OPERATIONS.replace("{block}", "7")
        );
        assert_eq!(
            RpcPaths::balance(&Address::new("tz1Abc")),
            RpcPaths::BALANCE.replace("{address}", "tz1Abc")
        );
        assert_eq!(RpcPaths::entrypoints(&kt1), contract(RpcPaths::ENTRYPOINTS));
        assert_eq!(
            RpcPaths::storage_normalized(&kt1),
            contract(RpcPaths::STORAGE_NORMALIZED)
        );
    }
}
