//! # Guestbook App
//!
//! The client core: wallet session, contract view, submission and the
//! presentation projection, coordinated by [`Guestbook`].
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`state`] | `GuestbookState` and the observable `StateHandle` |
//! | [`session`] | `WalletSession`: restore, connect, disconnect |
//! | [`view`] | `ContractView`: balance and entries refresh |
//! | [`submission`] | `SubmissionController`: submit and await confirmation |
//! | [`projector`] | `UiProjection`: flags and labels for renderers |
//! | [`controller`] | `Guestbook`: wiring and the top-level error handler |
//! | [`config`] | `GuestbookConfig` from defaults, settings file and env |
//! | [`settings`] | Settings file and log location in the config directory |
//! | [`error`] | Error taxonomy |
//!
//! Collaborators are injected as `Arc<dyn WalletSigner>` and
//! `Arc<dyn LedgerClient>` from [`guestbook_sdk`].

pub mod config;
pub mod controller;
pub mod error;
pub mod projector;
pub mod session;
pub mod settings;
pub mod state;
pub mod submission;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, GuestbookConfig};
pub use controller::Guestbook;
pub use error::{ConnectError, GuestbookError, ReadError, SubmitError};
pub use projector::{ButtonAction, UiProjection};
pub use session::WalletSession;
pub use state::{GuestbookState, Notice, NoticeLevel, SessionState, StateHandle};
pub use submission::{SkipReason, SubmissionController, SubmitOutcome, SubmitPolicy};
pub use view::ContractView;
