//! Account and contract addresses.
//!
//! Tezos addresses are base58check strings of 36 characters whose
//! three-character prefix tells the kind of account:
//!
//! | Prefix | Kind |
//! |--------|------|
//! | `tz1` / `tz2` / `tz3` / `tz4` | implicit account (Ed25519, secp256k1, P-256, BLS) |
//! | `KT1` | originated contract |
//!
//! [`Address`] is treated as an opaque identifier once it has been handed to
//! us by a wallet or the ledger; [`Address::parse`] is used for user input.
//! [`ContractAddress`] is always validated because it is only ever typed in
//! by an operator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of characters in a base58check-encoded Tezos address.
pub const ADDRESS_LENGTH: usize = 36;

const IMPLICIT_PREFIXES: [&str; 4] = ["tz1", "tz2", "tz3", "tz4"];
const ORIGINATED_PREFIX: &str = "KT1";
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Check the layout of an address: known prefix, length and base58 alphabet.
///
/// The base58check checksum itself is not verified; the ledger rejects
/// addresses with a bad checksum on first use.
fn validate_layout(value: &str, prefixes: &[&str]) -> Result<(), ModelError> {
    let invalid = |reason: String| ModelError::InvalidAddress {
        value: value.to_string(),
        reason,
    };

    if !prefixes.iter().any(|p| value.starts_with(p)) {
        return Err(invalid(format!("expected one of {}", prefixes.join(", "))));
    }
    if value.len() != ADDRESS_LENGTH {
        return Err(invalid(format!(
            "expected {ADDRESS_LENGTH} characters, got {}",
            value.len()
        )));
    }
    if let Some(c) = value.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(invalid(format!("character '{c}' is not base58")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Address of an account on the ledger (the sender of a guestbook entry).
///
/// # Examples
///
/// ```
/// use guestbook_models::Address;
///
/// let addr = Address::new("tz1W4W2yFAHz7iGyQvFys4K7Df9mZL6cSKCp");
/// assert_eq!(addr.to_string(), "tz1W4W2yFAHz7iGyQvFys4K7Df9mZL6cSKCp");
/// assert!(addr.is_implicit());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap an address without validating it.
    pub fn new(addr: &str) -> Self {
        Self(addr.to_string())
    }

    /// Parse and validate an implicit or originated address.
    pub fn parse(addr: &str) -> Result<Self, ModelError> {
        let trimmed = addr.trim();
        let mut prefixes = IMPLICIT_PREFIXES.to_vec();
        prefixes.push(ORIGINATED_PREFIX);
        validate_layout(trimmed, &prefixes)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is an implicit (`tz…`) account.
    pub fn is_implicit(&self) -> bool {
        IMPLICIT_PREFIXES.iter().any(|p| self.0.starts_with(p))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for Address {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// ContractAddress
// ---------------------------------------------------------------------------

/// Address of an originated contract (`KT1…`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ContractAddress(String);

impl ContractAddress {
    /// Parse and validate a `KT1` contract address.
    pub fn parse(addr: &str) -> Result<Self, ModelError> {
        let trimmed = addr.trim();
        validate_layout(trimmed, &[ORIGINATED_PREFIX])?;
        Ok(Self(trimmed.to_string()))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContractAddress {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContractAddress {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ContractAddress> for String {
    fn from(addr: ContractAddress) -> Self {
        addr.0
    }
}

impl From<ContractAddress> for Address {
    fn from(addr: ContractAddress) -> Self {
        Address(addr.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
