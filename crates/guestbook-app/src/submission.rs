//! The write path: submit a message and wait for it to land.
//!
//! Only one submission runs at a time. The in-flight flag lives in the
//! shared state (so renderers can show it) and is held by an
//! [`InFlightGuard`], which clears it on every exit path, including
//! errors and a dropped future.

use std::sync::Arc;
use std::time::Duration;

use guestbook_models::entry::validate_message;
use guestbook_models::{Address, OperationHash, DEFAULT_ENTRYPOINT};
use guestbook_sdk::{ContractHandle, LedgerClient};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{ReadError, SubmitError};
use crate::state::StateHandle;
use crate::view::ContractView;

/// Knobs of the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// Upper bound on the confirmation wait; `None` waits as long as the
    /// ledger client does.
    pub confirmation_timeout: Option<Duration>,
    /// Clear the pending message once its submission is confirmed.
    pub clear_message_on_success: bool,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            confirmation_timeout: Some(Duration::from_secs(180)),
            clear_message_on_success: false,
        }
    }
}

/// Why a submission did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SkipReason {
    /// No account or no bound contract yet.
    #[strum(to_string = "not connected")]
    NotConnected,
    /// Another submission is outstanding.
    #[strum(to_string = "a submission is already in flight")]
    AlreadyInFlight,
}

/// Result of a submission that did not fail.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The operation applied; the view was refreshed once.
    Confirmed {
        operation: OperationHash,
        level: u64,
        /// Set when the follow-up refresh failed.
        refresh_error: Option<ReadError>,
    },
    /// Preconditions not met; nothing was sent.
    Skipped(SkipReason),
}

/// Holds the in-flight flag for the duration of a submission.
struct InFlightGuard {
    state: StateHandle,
}

impl InFlightGuard {
    fn acquire(state: &StateHandle) -> Option<Self> {
        let acquired = state.update_if(|s| {
            if s.submitting {
                return false;
            }
            s.submitting = true;
            true
        });
        acquired.then(|| Self {
            state: state.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.update(|s| s.submitting = false);
    }
}

#[derive(Clone)]
pub struct SubmissionController {
    ledger: Arc<dyn LedgerClient>,
    view: ContractView,
    state: StateHandle,
    policy: SubmitPolicy,
}

impl SubmissionController {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        view: ContractView,
        state: StateHandle,
        policy: SubmitPolicy,
    ) -> Self {
        Self {
            ledger,
            view,
            state,
            policy,
        }
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    /// Post `message` to the guestbook and wait for it to be confirmed.
    ///
    /// Without an account or bound contract, or while another submission
    /// is in flight, this is a no-op reported as [`SubmitOutcome::Skipped`].
    pub async fn submit(
        &self,
        message: &str,
        account: Option<&Address>,
        contract: Option<&ContractHandle>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let (Some(account), Some(contract)) = (account, contract) else {
            return Ok(SubmitOutcome::Skipped(SkipReason::NotConnected));
        };
        let Some(guard) = InFlightGuard::acquire(&self.state) else {
            return Ok(SubmitOutcome::Skipped(SkipReason::AlreadyInFlight));
        };
        let text = validate_message(message)?;

        let operation = self
            .ledger
            .invoke(contract, DEFAULT_ENTRYPOINT, json!({ "string": text }))
            .await
            .map_err(SubmitError::Invocation)?;
        info!(operation = %operation.hash, account = %account, "message submitted, awaiting confirmation");

        let confirmation = self.ledger.await_confirmation(&operation);
        let confirmation = match self.policy.confirmation_timeout {
            Some(timeout) => tokio::time::timeout(timeout, confirmation)
                .await
                .map_err(|_| SubmitError::TimedOut {
                    operation: operation.hash.clone(),
                    timeout,
                })?,
            None => confirmation.await,
        }
        .map_err(SubmitError::Confirmation)?;

        if !confirmation.completed {
            warn!(operation = %operation.hash, level = confirmation.level, "operation not applied");
            return Err(SubmitError::NotApplied {
                operation: operation.hash,
                level: confirmation.level,
            });
        }
        info!(operation = %operation.hash, level = confirmation.level, "message confirmed");

        if self.policy.clear_message_on_success {
            self.state.update(|s| s.pending_message.clear());
        }
        drop(guard);

        let refresh_error = self.view.refresh(account).await.err();
        Ok(SubmitOutcome::Confirmed {
            operation: operation.hash,
            level: confirmation.level,
            refresh_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{GuestbookState, SessionState};
    use crate::testing::{guestbook_address, guestbook_handle, ConfirmMode, FakeLedger};
    use guestbook_models::Mutez;

    struct Fixture {
        ledger: Arc<FakeLedger>,
        state: StateHandle,
        controller: SubmissionController,
        account: Address,
        contract: ContractHandle,
    }

    fn fixture(policy: SubmitPolicy) -> Fixture {
        let account = Address::new("tz1Abc");
        let ledger = Arc::new(FakeLedger::new(Mutez::new(5_000_000), vec![]).with_sender(&account));
        let state = StateHandle::new(GuestbookState {
            session: SessionState::Connected,
            account: Some(account.clone()),
            contract: Some(guestbook_handle()),
            pending_message: "hello".into(),
            ..Default::default()
        });
        let view = ContractView::new(ledger.clone(), state.clone(), guestbook_address());
        let controller = SubmissionController::new(ledger.clone(), view, state.clone(), policy);
        Fixture {
            ledger,
            state,
            controller,
            account,
            contract: guestbook_handle(),
        }
    }

    impl Fixture {
        async fn submit(&self, message: &str) -> Result<SubmitOutcome, SubmitError> {
            self.controller
                .submit(message, Some(&self.account), Some(&self.contract))
                .await
        }
    }

    #[tokio::test]
    async fn confirmed_submission_refreshes_exactly_once() {
        let f = fixture(SubmitPolicy::default());
        let outcome = f.submit("hello").await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Confirmed { refresh_error: None, .. }));
        assert_eq!(f.ledger.invocations(), 1);
        assert_eq!(f.ledger.storage_reads(), 1);
        let s = f.state.snapshot();
        assert!(!s.submitting);
        assert_eq!(s.entries.unwrap()[0].text, "hello");
        assert_eq!(s.pending_message, "hello");
    }

    #[tokio::test]
    async fn not_applied_confirmation_does_not_refresh() {
        let f = fixture(SubmitPolicy::default());
        f.ledger.confirm_mode(ConfirmMode::NotApplied);

        let err = f.submit("hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::NotApplied { .. }));
        assert_eq!(f.ledger.storage_reads(), 0);
        assert!(!f.state.snapshot().submitting);
    }

    #[tokio::test]
    async fn confirmation_error_clears_flag_and_keeps_message() {
        let f = fixture(SubmitPolicy::default());
        f.ledger.confirm_mode(ConfirmMode::Fail);

        let err = f.submit("hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::Confirmation(_)));
        let s = f.state.snapshot();
        assert!(!s.submitting);
        assert_eq!(s.pending_message, "hello");
        assert_eq!(s.entries, None);
    }

    #[tokio::test]
    async fn invocation_rejected_clears_flag() {
        let f = fixture(SubmitPolicy::default());
        f.ledger.fail_invocations(true);

        let err = f.submit("hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::Invocation(_)));
        assert!(!f.state.snapshot().submitting);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_is_bounded_by_policy() {
        let f = fixture(SubmitPolicy {
            confirmation_timeout: Some(Duration::from_secs(30)),
            ..SubmitPolicy::default()
        });
        f.ledger.confirm_mode(ConfirmMode::Hang);

        let err = f.submit("hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::TimedOut { timeout, .. } if timeout == Duration::from_secs(30)));
        assert!(!f.state.snapshot().submitting);
        assert_eq!(f.ledger.storage_reads(), 0);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_a_noop() {
        let f = Arc::new(fixture(SubmitPolicy::default()));
        let release = f.ledger.gate_confirmation();

        let first = {
            let f = f.clone();
            tokio::spawn(async move { f.submit("hello").await })
        };
        f.state.subscribe().wait_for(|s| s.submitting).await.unwrap();

        let before = f.state.snapshot();
        let outcome = f.submit("hello again").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Skipped(SkipReason::AlreadyInFlight)));
        assert_eq!(f.ledger.invocations(), 1);
        let after = f.state.snapshot();
        assert_eq!(after.entries, before.entries);
        assert_eq!(after.balance, before.balance);
        assert_eq!(after.pending_message, before.pending_message);

        release.open();
        assert!(matches!(first.await.unwrap().unwrap(), SubmitOutcome::Confirmed { .. }));
        assert!(!f.state.snapshot().submitting);
    }

    #[tokio::test]
    async fn submit_without_session_is_a_noop() {
        let f = fixture(SubmitPolicy::default());
        let outcome = f.controller.submit("hello", None, Some(&f.contract)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Skipped(SkipReason::NotConnected)));
        let outcome = f.controller.submit("hello", Some(&f.account), None).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Skipped(SkipReason::NotConnected)));
        assert_eq!(f.ledger.invocations(), 0);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_invocation() {
        let f = fixture(SubmitPolicy::default());
        let err = f.submit("").await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert_eq!(f.ledger.invocations(), 0);
        assert!(!f.state.snapshot().submitting);
    }

    #[tokio::test]
    async fn message_cleared_on_success_when_enabled() {
        let f = fixture(SubmitPolicy {
            clear_message_on_success: true,
            ..SubmitPolicy::default()
        });
        f.submit("hello").await.unwrap();
        assert_eq!(f.state.snapshot().pending_message, "");
    }
}
