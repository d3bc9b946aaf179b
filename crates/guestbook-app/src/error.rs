//! Error taxonomy of the guestbook core.
//!
//! Each component reports its own kind ([`ConnectError`], [`ReadError`],
//! [`SubmitError`]); [`GuestbookError`] unifies them for the top-level
//! handler in [`crate::Guestbook`], which logs the failure and turns it into
//! a user-facing notice. None of them is fatal.

use std::time::Duration;

use guestbook_models::{ModelError, OperationHash};
use guestbook_sdk::SdkError;

/// Failure to establish or tear down a wallet session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The wallet declined, is unreachable, or answered something unusable.
    #[error("wallet connection failed: {0}")]
    Failed(#[source] SdkError),

    /// A connection attempt is already outstanding.
    #[error("a wallet connection is already in progress")]
    InProgress,

    /// A session is already established.
    #[error("already connected")]
    AlreadyConnected,

    /// The wallet granted access, but the session was closed before the
    /// grant could be applied.
    #[error("connection attempt superseded")]
    Superseded,
}

/// Failure while reading balance or entries from the ledger.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The guestbook contract could not be bound.
    #[error("could not bind the guestbook contract: {0}")]
    Contract(#[source] SdkError),

    /// The balance read failed.
    #[error("could not read the balance: {0}")]
    Balance(#[source] SdkError),

    /// The storage read failed.
    #[error("could not read the guestbook entries: {0}")]
    Storage(#[source] SdkError),
}

/// Failure of the submit-and-confirm sequence.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The message did not pass validation.
    #[error(transparent)]
    Invalid(#[from] ModelError),

    /// The wallet or node refused the invocation.
    #[error("submission rejected: {0}")]
    Invocation(#[source] SdkError),

    /// Waiting for the confirmation failed.
    #[error("confirmation failed: {0}")]
    Confirmation(#[source] SdkError),

    /// The operation was included but did not apply.
    #[error("operation {operation} was included at level {level} but not applied")]
    NotApplied {
        /// Hash of the operation.
        operation: OperationHash,
        /// Level of the including block.
        level: u64,
    },

    /// No confirmation within the configured bound.
    #[error("operation {operation} not confirmed within {}s", timeout.as_secs())]
    TimedOut {
        /// Hash of the operation.
        operation: OperationHash,
        /// The bound that elapsed.
        timeout: Duration,
    },
}

/// Any failure surfaced by [`crate::Guestbook`].
#[derive(Debug, thiserror::Error)]
pub enum GuestbookError {
    /// See [`ConnectError`].
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// See [`ReadError`].
    #[error(transparent)]
    Read(#[from] ReadError),

    /// See [`SubmitError`].
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl GuestbookError {
    /// Errors that only mean "nothing to do"; they are not shown to the user.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            GuestbookError::Connect(
                ConnectError::InProgress | ConnectError::AlreadyConnected | ConnectError::Superseded
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_applied_display() {
        let err = SubmitError::NotApplied {
            operation: OperationHash::new("ooTarget"),
            level: 12,
        };
        assert_eq!(
            err.to_string(),
            "operation ooTarget was included at level 12 but not applied"
        );
    }

    #[test]
    fn timed_out_display() {
        let err = SubmitError::TimedOut {
            operation: OperationHash::new("ooTarget"),
            timeout: Duration::from_secs(180),
        };
        assert_eq!(err.to_string(), "operation ooTarget not confirmed within 180s");
    }

    #[test]
    fn empty_message_is_invalid() {
        let err: SubmitError = ModelError::EmptyMessage.into();
        assert_eq!(err.to_string(), "message must not be empty");
    }

    #[test]
    fn benign_classification() {
        assert!(GuestbookError::from(ConnectError::InProgress).is_benign());
        assert!(GuestbookError::from(ConnectError::AlreadyConnected).is_benign());
        assert!(GuestbookError::from(ConnectError::Superseded).is_benign());
        let failed = ConnectError::Failed(SdkError::WalletRejected("aborted".into()));
        assert!(!GuestbookError::from(failed).is_benign());
    }
}
