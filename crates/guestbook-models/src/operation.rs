//! Contract calls, operation hashes and confirmations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::address::ContractAddress;
use crate::amount::Mutez;

/// Name of the entry point every single-entry contract exposes.
pub const DEFAULT_ENTRYPOINT: &str = "default";

/// A contract invocation the wallet is asked to sign and inject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContractCall {
    /// Contract being called.
    pub destination: ContractAddress,
    /// Entry point name.
    pub entrypoint: String,
    /// Micheline (JSON) parameter.
    pub parameter: Value,
    /// Amount transferred along with the call.
    pub amount: Mutez,
}

impl ContractCall {
    /// Call the `default` entry point with a single string argument.
    ///
    /// # Examples
    ///
    /// ```
    /// use guestbook_models::{ContractAddress, ContractCall};
    ///
    /// let kt1 = ContractAddress::parse("KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu").unwrap();
    /// let call = ContractCall::default_with_text(kt1, "hello");
    /// assert_eq!(call.entrypoint, "default");
    /// assert_eq!(call.parameter["string"], "hello");
    /// ```
    pub fn default_with_text(destination: ContractAddress, text: &str) -> Self {
        Self {
            destination,
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
            parameter: json!({ "string": text }),
            amount: Mutez::ZERO,
        }
    }

    /// The string argument, if the parameter is a single Micheline string.
    pub fn text_argument(&self) -> Option<&str> {
        self.parameter.get("string").and_then(Value::as_str)
    }
}

/// Hash identifying an injected operation (`o…`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OperationHash(String);

impl OperationHash {
    /// Wrap an operation hash.
    pub fn new(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Handle returned by an invocation, used to await its confirmation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// Hash of the injected operation.
    pub hash: OperationHash,
    /// Head level observed right before injection; the operation can only
    /// be included in a later block.
    pub injected_after_level: u64,
}

/// Outcome of waiting for an operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// `true` when the operation was included and applied.
    pub completed: bool,
    /// Level of the block that included the operation.
    pub level: u64,
}
