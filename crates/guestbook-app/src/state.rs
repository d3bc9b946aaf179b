//! Explicit client state and its change notification.
//!
//! All mutable state of the client lives in one [`GuestbookState`] value held
//! by a [`StateHandle`]. Components mutate it through the handle and every
//! mutation is published to subscribers (renderers, tests) over a
//! `tokio::sync::watch` channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use guestbook_models::{Address, Entry, Mutez};
use guestbook_sdk::ContractHandle;
use tokio::sync::watch;

// ── Session ───────────────────────────────────────────────────────────

/// Wallet connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum SessionState {
    /// No account; the "Connect Wallet" affordance is offered.
    #[default]
    Disconnected,
    /// A permission request is outstanding.
    Connecting,
    /// An account is granted.
    Connected,
}

// ── Notices ───────────────────────────────────────────────────────────

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    /// Something completed.
    Info,
    /// Something failed; the client kept its previous state.
    Error,
}

/// A one-line message for the user, set by the top-level handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────

/// Everything the client knows at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuestbookState {
    pub session: SessionState,
    pub account: Option<Address>,
    /// Bound guestbook contract; recreated on each connection.
    pub contract: Option<ContractHandle>,
    /// Last balance read for `account`.
    pub balance: Option<Mutez>,
    /// Last storage snapshot read.
    pub entries: Option<Vec<Entry>>,
    /// Text staged by the user.
    pub pending_message: String,
    /// A submission is outstanding.
    pub submitting: bool,
    /// Balance and entries are being loaded for a new connection.
    pub loading: bool,
    pub notice: Option<Notice>,
    /// Incremented on every transition to [`SessionState::Connected`].
    pub connection_epoch: u64,
}

impl GuestbookState {
    /// `true` when `account` is the account of the current session.
    pub fn is_active_account(&self, account: &Address) -> bool {
        self.session == SessionState::Connected && self.account.as_ref() == Some(account)
    }
}

/// Shared, observable handle on the [`GuestbookState`].
#[derive(Debug, Clone)]
pub struct StateHandle {
    tx: Arc<watch::Sender<GuestbookState>>,
}

impl StateHandle {
    pub fn new(initial: GuestbookState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> GuestbookState {
        self.tx.borrow().clone()
    }

    /// Read a part of the state without cloning all of it.
    pub fn read<T>(&self, f: impl FnOnce(&GuestbookState) -> T) -> T {
        f(&self.tx.borrow())
    }

    /// Mutate the state and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut GuestbookState)) {
        self.tx.send_modify(f);
    }

    /// Mutate the state; subscribers are notified only if `f` returns `true`.
    ///
    /// The closure runs under the channel's write lock, so a check-and-set
    /// done here is atomic with respect to every other update.
    pub fn update_if(&self, f: impl FnOnce(&mut GuestbookState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn subscribe(&self) -> watch::Receiver<GuestbookState> {
        self.tx.subscribe()
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new(GuestbookState::default())
    }
}
