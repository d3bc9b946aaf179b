//! Wallet session lifecycle.
//!
//! ```text
//!               connect()                 permissions granted
//! Disconnected ───────────► Connecting ─────────────────────► Connected
//!      ▲                        │                                 │
//!      └────── failure ─────────┘                                 │
//!      └──────────────────────── disconnect() ────────────────────┘
//! ```
//!
//! [`WalletSession`] only moves the session through these states. Loading
//! the guestbook after a successful transition is the caller's job (see
//! [`crate::Guestbook`]), which watches `connection_epoch`.

use std::sync::Arc;

use guestbook_models::{Address, NetworkConfig};
use guestbook_sdk::WalletSigner;
use tracing::{debug, info, warn};

use crate::error::ConnectError;
use crate::state::{SessionState, StateHandle};

#[derive(Clone)]
pub struct WalletSession {
    signer: Arc<dyn WalletSigner>,
    state: StateHandle,
}

impl WalletSession {
    pub fn new(signer: Arc<dyn WalletSigner>, state: StateHandle) -> Self {
        Self { signer, state }
    }

    pub fn state(&self) -> SessionState {
        self.state.read(|s| s.session)
    }

    pub fn account(&self) -> Option<Address> {
        self.state.read(|s| s.account.clone())
    }

    /// Pick up a grant left by a previous run.
    ///
    /// Returns the account, and moves to `Connected`, only if the wallet
    /// still has an active account for this application and the session
    /// was still `Disconnected` when the wallet answered. A session that is
    /// connecting or connected in the meantime is left alone.
    pub async fn restore_if_authorized(&self) -> Result<Option<Address>, ConnectError> {
        if self.state() != SessionState::Disconnected {
            return Ok(None);
        }

        let active = self
            .signer
            .active_account()
            .await
            .map_err(ConnectError::Failed)?;
        if active.is_none() {
            info!("no previously authorized account");
            return Ok(None);
        }

        let account = self
            .signer
            .public_key_hash()
            .await
            .map_err(ConnectError::Failed)?;
        if !self.mark_connected(&account, SessionState::Disconnected) {
            debug!(account = %account, "session changed during restore, grant not applied");
            return Ok(None);
        }
        info!(account = %account, "restored authorized session");
        Ok(Some(account))
    }

    /// Ask the wallet for permissions on `network`.
    ///
    /// On any failure the session is back to `Disconnected` with no
    /// account.
    pub async fn connect(&self, network: &NetworkConfig) -> Result<Address, ConnectError> {
        let mut refused = None;
        self.state.update_if(|s| match s.session {
            SessionState::Disconnected => {
                s.session = SessionState::Connecting;
                s.account = None;
                true
            }
            SessionState::Connecting => {
                refused = Some(ConnectError::InProgress);
                false
            }
            SessionState::Connected => {
                refused = Some(ConnectError::AlreadyConnected);
                false
            }
        });
        if let Some(err) = refused {
            return Err(err);
        }

        info!(network = %network, "requesting wallet permissions");
        match self.signer.request_permissions(network).await {
            Ok(account) => {
                if !self.mark_connected(&account, SessionState::Connecting) {
                    debug!(account = %account, "session changed while connecting, grant not applied");
                    return Err(ConnectError::Superseded);
                }
                info!(account = %account, "wallet connected");
                Ok(account)
            }
            Err(e) => {
                self.state.update_if(|s| {
                    if s.session != SessionState::Connecting {
                        return false;
                    }
                    s.session = SessionState::Disconnected;
                    s.account = None;
                    true
                });
                warn!(error = %e, rejected = e.is_rejection(), "wallet connection failed");
                Err(ConnectError::Failed(e))
            }
        }
    }

    /// Drop the session locally, then ask the wallet to forget the grant.
    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        self.state.update(|s| {
            s.session = SessionState::Disconnected;
            s.account = None;
            s.contract = None;
            s.balance = None;
            s.entries = None;
            s.loading = false;
        });
        info!("session closed");
        self.signer
            .clear_active_account()
            .await
            .map_err(ConnectError::Failed)
    }

    /// Move from `from` to `Connected` with a fresh snapshot slot.
    ///
    /// Returns `false`, leaving the state untouched, if the session is no
    /// longer in `from`.
    fn mark_connected(&self, account: &Address, from: SessionState) -> bool {
        self.state.update_if(|s| {
            if s.session != from {
                return false;
            }
            s.session = SessionState::Connected;
            s.account = Some(account.clone());
            s.contract = None;
            s.balance = None;
            s.entries = None;
            s.connection_epoch += 1;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWallet;
    use guestbook_models::NetworkType;

    fn network() -> NetworkConfig {
        NetworkConfig::new(NetworkType::Custom, "http://localhost:8732")
    }

    fn session(wallet: FakeWallet) -> (WalletSession, Arc<FakeWallet>, StateHandle) {
        let wallet = Arc::new(wallet);
        let state = StateHandle::default();
        (WalletSession::new(wallet.clone(), state.clone()), wallet, state)
    }

    #[tokio::test]
    async fn restore_without_grant_stays_disconnected() {
        let (session, _, state) = session(FakeWallet::granting("tz1Abc"));
        assert_eq!(session.restore_if_authorized().await.unwrap(), None);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(state.read(|s| s.connection_epoch), 0);
    }

    #[tokio::test]
    async fn restore_with_grant_connects() {
        let (session, _, state) = session(FakeWallet::granting("tz1Abc").already_authorized());
        let account = session.restore_if_authorized().await.unwrap();
        assert_eq!(account, Some(Address::new("tz1Abc")));
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(state.read(|s| s.connection_epoch), 1);
    }

    #[tokio::test]
    async fn connect_success_transitions_to_connected() {
        let (session, wallet, state) = session(FakeWallet::granting("tz1Abc"));
        let account = session.connect(&network()).await.unwrap();
        assert_eq!(account.as_str(), "tz1Abc");
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.account(), Some(account));
        assert_eq!(state.read(|s| s.connection_epoch), 1);
        assert_eq!(wallet.permission_requests(), 1);
    }

    #[tokio::test]
    async fn connect_failure_leaves_no_partial_state() {
        let (session, _, state) = session(FakeWallet::rejecting());
        let err = session.connect(&network()).await.unwrap_err();
        assert!(matches!(err, ConnectError::Failed(_)));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.account(), None);
        assert_eq!(state.read(|s| s.connection_epoch), 0);
    }

    #[tokio::test]
    async fn connect_when_connected_is_refused_without_prompt() {
        let (session, wallet, _) = session(FakeWallet::granting("tz1Abc"));
        session.connect(&network()).await.unwrap();
        let err = session.connect(&network()).await.unwrap_err();
        assert!(matches!(err, ConnectError::AlreadyConnected));
        assert_eq!(wallet.permission_requests(), 1);
    }

    #[tokio::test]
    async fn connect_while_connecting_is_refused() {
        let (session, wallet, state) = session(FakeWallet::granting("tz1Abc").gated());
        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.connect(&network()).await })
        };
        state
            .subscribe()
            .wait_for(|s| s.session == SessionState::Connecting)
            .await
            .unwrap();

        let err = session.connect(&network()).await.unwrap_err();
        assert!(matches!(err, ConnectError::InProgress));

        wallet.release();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(wallet.permission_requests(), 1);
    }

    /// Start a restore that is parked on the public key hash lookup, then a
    /// connect that is parked on the permission prompt.
    async fn restore_racing_connect(
        wallet: FakeWallet,
    ) -> (
        Arc<FakeWallet>,
        StateHandle,
        tokio::task::JoinHandle<Result<Option<Address>, ConnectError>>,
        tokio::task::JoinHandle<Result<Address, ConnectError>>,
    ) {
        let (session, wallet, state) =
            session(wallet.already_authorized().gated_public_key_hash().gated());
        let restore = {
            let session = session.clone();
            tokio::spawn(async move { session.restore_if_authorized().await })
        };
        wallet.wait_for_public_key_hash_requests(1).await;

        let connect = tokio::spawn(async move { session.connect(&network()).await });
        state
            .subscribe()
            .wait_for(|s| s.session == SessionState::Connecting)
            .await
            .unwrap();
        (wallet, state, restore, connect)
    }

    #[tokio::test]
    async fn restore_does_not_connect_under_an_outstanding_connect() {
        let (wallet, state, restore, connect) =
            restore_racing_connect(FakeWallet::granting("tz1Abc").declining()).await;

        wallet.release_public_key_hash();
        assert_eq!(restore.await.unwrap().unwrap(), None);
        assert_eq!(state.read(|s| s.session), SessionState::Connecting);
        assert_eq!(state.read(|s| s.connection_epoch), 0);

        wallet.release();
        assert!(matches!(connect.await.unwrap(), Err(ConnectError::Failed(_))));
        let s = state.snapshot();
        assert_eq!(s.session, SessionState::Disconnected);
        assert_eq!(s.account, None);
        assert_eq!(s.connection_epoch, 0);
    }

    #[tokio::test]
    async fn racing_restore_and_connect_report_one_connection() {
        let (wallet, state, restore, connect) =
            restore_racing_connect(FakeWallet::granting("tz1Abc")).await;

        wallet.release_public_key_hash();
        assert_eq!(restore.await.unwrap().unwrap(), None);

        wallet.release();
        assert_eq!(connect.await.unwrap().unwrap().as_str(), "tz1Abc");
        let s = state.snapshot();
        assert_eq!(s.session, SessionState::Connected);
        assert_eq!(s.connection_epoch, 1);
    }

    #[tokio::test]
    async fn connect_granted_after_disconnect_is_superseded() {
        let (session, wallet, state) = session(FakeWallet::granting("tz1Abc").gated());
        let connect = {
            let session = session.clone();
            tokio::spawn(async move { session.connect(&network()).await })
        };
        state
            .subscribe()
            .wait_for(|s| s.session == SessionState::Connecting)
            .await
            .unwrap();

        session.disconnect().await.unwrap();
        wallet.release();
        assert!(matches!(connect.await.unwrap(), Err(ConnectError::Superseded)));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(state.read(|s| s.connection_epoch), 0);
    }

    #[tokio::test]
    async fn restore_when_already_connected_returns_nothing() {
        let (session, _, state) = session(FakeWallet::granting("tz1Abc").already_authorized());
        session.connect(&network()).await.unwrap();
        assert_eq!(session.restore_if_authorized().await.unwrap(), None);
        assert_eq!(state.read(|s| s.connection_epoch), 1);
    }

    #[tokio::test]
    async fn disconnect_clears_session_and_grant() {
        let (session, wallet, state) = session(FakeWallet::granting("tz1Abc"));
        session.connect(&network()).await.unwrap();
        session.disconnect().await.unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.account(), None);
        assert!(state.read(|s| s.entries.is_none() && s.balance.is_none()));
        assert!(!wallet.is_authorized());
    }
}
