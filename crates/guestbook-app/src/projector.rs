//! Presentation flags derived from the client state.
//!
//! [`UiProjection::project`] is a pure function of a [`GuestbookState`];
//! renderers call it on every state change and never look at the raw state.

use guestbook_models::{Entry, Unit};

use crate::state::{GuestbookState, Notice, SessionState};

/// Label of the context button when no account is known.
pub const CONNECT_LABEL: &str = "Connect Wallet";
/// Label of the context button once connected.
pub const SEND_LABEL: &str = "send message";

/// What the single context-sensitive button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Connect,
    Send,
}

impl ButtonAction {
    pub fn label(self) -> &'static str {
        match self {
            ButtonAction::Connect => CONNECT_LABEL,
            ButtonAction::Send => SEND_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiProjection {
    pub can_submit: bool,
    pub can_connect: bool,
    pub is_busy: bool,
    pub button: ButtonAction,
    pub account: Option<String>,
    /// Balance in tez, absent unless connected and read at least once.
    pub display_balance: Option<String>,
    /// Entries in storage order; empty unless connected.
    pub display_entries: Vec<Entry>,
    pub notice: Option<Notice>,
}

impl UiProjection {
    pub fn project(state: &GuestbookState) -> Self {
        let connected = state.session == SessionState::Connected;
        let is_busy =
            state.session == SessionState::Connecting || state.submitting || state.loading;

        let button = if state.account.is_some() {
            ButtonAction::Send
        } else {
            ButtonAction::Connect
        };

        Self {
            can_submit: connected && !state.submitting && !state.pending_message.is_empty(),
            can_connect: state.session == SessionState::Disconnected,
            is_busy,
            button,
            account: state.account.as_ref().map(ToString::to_string),
            display_balance: state
                .balance
                .filter(|_| connected)
                .map(|b| b.format(Unit::Tez)),
            display_entries: if connected {
                state.entries.clone().unwrap_or_default()
            } else {
                Vec::new()
            },
            notice: state.notice.clone(),
        }
    }
}
