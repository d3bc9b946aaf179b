//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. It wraps transport, serialization, wallet and
//! model errors into a unified enum.

use guestbook_models::ModelError;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL, no wallet attached).
    #[error("configuration error: {0}")]
    Config(String),

    /// The wallet refused the request (permission denied, user cancelled,
    /// network mismatch).
    #[error("wallet rejected the request: {0}")]
    WalletRejected(String),

    /// The node answered with a non-success status.
    #[error("RPC error {status}: {body}")]
    Rpc {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the node.
        body: String,
    },

    /// The node answered with an unexpected payload.
    #[error("unexpected RPC response: {0}")]
    UnexpectedResponse(String),

    /// HTTP request failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value returned by the ledger or wallet failed model validation.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SdkError {
    /// Whether the failure came from the wallet declining, as opposed to a
    /// transport or decoding problem.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SdkError::WalletRejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_display() {
        let err = SdkError::Rpc {
            status: 404,
            body: "contract not found".into(),
        };
        assert_eq!(err.to_string(), "RPC error 404: contract not found");
    }

    #[test]
    fn model_error_is_transparent() {
        let err: SdkError = ModelError::EmptyMessage.into();
        assert_eq!(err.to_string(), "message must not be empty");
        assert!(!err.is_rejection());
    }

    #[test]
    fn rejection_classification() {
        assert!(SdkError::WalletRejected("aborted".into()).is_rejection());
        assert!(!SdkError::Config("x".into()).is_rejection());
    }
}
