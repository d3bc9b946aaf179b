//! Error types for the `guestbook-models` crate.
//!
//! All fallible constructors, parsers and storage decoders in this crate
//! return variants of [`ModelError`].

/// Errors produced when constructing, parsing or decoding model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An address did not match the Tezos base58check layout.
    #[error("invalid address \"{value}\": {reason}")]
    InvalidAddress {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// An amount string could not be parsed as a mutez quantity.
    #[error("invalid amount \"{value}\": {reason}")]
    InvalidAmount {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A guestbook message was empty.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The contract storage did not have the expected shape.
    #[error("malformed storage: {0}")]
    MalformedStorage(String),
}
