//! Top-level controller.
//!
//! [`Guestbook`] wires a [`WalletSession`], a [`ContractView`] and a
//! [`SubmissionController`] onto one [`StateHandle`] and is the single place
//! where failures become user-facing notices ([`Guestbook::handle`]).

use std::sync::Arc;

use guestbook_models::Address;
use guestbook_sdk::{LedgerClient, WalletSigner};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::GuestbookConfig;
use crate::error::{GuestbookError, ReadError};
use crate::projector::{ButtonAction, UiProjection};
use crate::session::WalletSession;
use crate::state::{GuestbookState, Notice, StateHandle};
use crate::submission::{SubmissionController, SubmitOutcome};
use crate::view::ContractView;

struct Inner {
    config: GuestbookConfig,
    state: StateHandle,
    session: WalletSession,
    view: ContractView,
    submission: SubmissionController,
}

/// The guestbook client. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Guestbook {
    inner: Arc<Inner>,
}

impl Guestbook {
    pub fn new(
        config: GuestbookConfig,
        signer: Arc<dyn WalletSigner>,
        ledger: Arc<dyn LedgerClient>,
    ) -> Self {
        let state = StateHandle::default();
        let session = WalletSession::new(signer, state.clone());
        let view = ContractView::new(ledger.clone(), state.clone(), config.contract.clone());
        let submission =
            SubmissionController::new(ledger, view.clone(), state.clone(), config.submit);
        Self {
            inner: Arc::new(Inner {
                config,
                state,
                session,
                view,
                submission,
            }),
        }
    }

    pub fn config(&self) -> &GuestbookConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> watch::Receiver<GuestbookState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> GuestbookState {
        self.inner.state.snapshot()
    }

    pub fn projection(&self) -> UiProjection {
        self.inner.state.read(UiProjection::project)
    }

    /// Replace the staged message.
    pub fn set_message(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.state.update(|s| s.pending_message = text);
    }

    /// Restore a previous grant, if any, and load the guestbook for it.
    pub async fn start(&self) -> Result<Option<Address>, GuestbookError> {
        let restored = self.inner.session.restore_if_authorized().await?;
        if let Some(account) = &restored {
            self.load_after_connect(account).await;
        }
        Ok(restored)
    }

    /// Ask the wallet for access, then load the guestbook once.
    pub async fn connect(&self) -> Result<Address, GuestbookError> {
        let account = self.inner.session.connect(&self.inner.config.network).await?;
        self.notify(Notice::info(format!("connected as {account}")));
        self.load_after_connect(&account).await;
        Ok(account)
    }

    /// Re-read balance and entries for the current account.
    pub async fn refresh(&self) -> Result<(), GuestbookError> {
        let Some(account) = self.inner.session.account() else {
            debug!("refresh skipped, no account");
            return Ok(());
        };
        self.inner.view.refresh(&account).await?;
        Ok(())
    }

    /// Submit the staged message and wait for its confirmation.
    pub async fn submit(&self) -> Result<SubmitOutcome, GuestbookError> {
        let (message, account, contract) = self
            .inner
            .state
            .read(|s| (s.pending_message.clone(), s.account.clone(), s.contract.clone()));
        let outcome = self
            .inner
            .submission
            .submit(&message, account.as_ref(), contract.as_ref())
            .await?;

        match &outcome {
            SubmitOutcome::Confirmed {
                level,
                refresh_error,
                ..
            } => {
                self.notify(Notice::info(format!("message confirmed at level {level}")));
                if let Some(e) = refresh_error {
                    self.report_read(e);
                }
            }
            SubmitOutcome::Skipped(reason) => debug!(%reason, "submission skipped"),
        }
        Ok(outcome)
    }

    /// End the session and forget the wallet grant.
    pub async fn disconnect(&self) -> Result<(), GuestbookError> {
        self.inner.session.disconnect().await?;
        self.notify(Notice::info("disconnected"));
        Ok(())
    }

    /// What the context button does right now: connect or send.
    pub async fn activate(&self) -> Result<(), GuestbookError> {
        match self.projection().button {
            ButtonAction::Connect => self.connect().await.map(|_| ()),
            ButtonAction::Send => self.submit().await.map(|_| ()),
        }
    }

    /// Report a failure to the user; returns the value on success.
    ///
    /// Every caller-facing failure goes through here. The failure is logged
    /// and recorded as the current notice, except for benign refusals such
    /// as a second connect while one is outstanding.
    pub fn handle<T>(&self, result: Result<T, GuestbookError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(&err);
                None
            }
        }
    }

    fn report(&self, err: &GuestbookError) {
        if err.is_benign() {
            debug!(error = %err, "ignored");
            return;
        }
        error!(error = %err, "guestbook operation failed");
        self.notify(Notice::error(err.to_string()));
    }

    fn report_read(&self, err: &ReadError) {
        error!(error = %err, "guestbook refresh failed");
        self.notify(Notice::error(err.to_string()));
    }

    fn notify(&self, notice: Notice) {
        self.inner.state.update(|s| s.notice = Some(notice));
    }

    /// First load of a new connection; `loading` stays set until it ends.
    async fn load_after_connect(&self, account: &Address) {
        let epoch = self.inner.state.read(|s| s.connection_epoch);
        self.inner.state.update(|s| s.loading = true);
        info!(account = %account, epoch, "loading guestbook");

        let result = self.inner.view.refresh(account).await;
        self.inner.state.update_if(|s| {
            if s.connection_epoch != epoch || !s.loading {
                return false;
            }
            s.loading = false;
            true
        });
        if let Err(e) = result {
            self.report_read(&e);
        }
    }
}
