//! Development ledger: a Tezos node RPC subset and a wallet bridge in one
//! process, hosting an in-memory guestbook contract.
//!
//! Point the client at it with
//! `GUESTBOOK_RPC_URL=http://localhost:8732` and
//! `GUESTBOOK_WALLET_URL=http://localhost:8732/wallet`.

mod config;
mod error;
mod ledger;
mod routes;

use std::sync::Arc;

use chrono::Utc;
use guestbook_models::{Address, Entry};
use tracing::info;

use crate::config::MockConfig;
use crate::ledger::Ledger;
use crate::routes::{router, AppState, WALLET_PREFIX};

/// Entry present in storage at startup.
fn genesis_entries() -> Vec<Entry> {
    vec![Entry::new(
        Address::new("tz1W4W2yFAHz7iGyQvFys433Df9mZL6cSKCp"),
        Utc::now(),
        "Hello",
    )]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = MockConfig::from_env()?;
    let ledger = Ledger::new(&config).with_entries(genesis_entries());
    info!(
        contract = %config.contract,
        account = %config.account,
        balance = %config.initial_balance,
        "guestbook originated"
    );

    let app = router(Arc::new(AppState::new(ledger, config.network)));

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, wallet = WALLET_PREFIX, "mock ledger listening");
    axum::serve(listener, app).await?;
    Ok(())
}
