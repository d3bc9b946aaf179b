mod app_state;
mod page;
mod tui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use guestbook_app::settings::{log_path, save_settings};
use guestbook_app::{Guestbook, GuestbookConfig, SubmitOutcome};
use guestbook_models::{Address, ContractAddress, NetworkType, Unit};
use guestbook_sdk::{HttpWalletSigner, LedgerClient, RpcLedgerClient};
use tracing::info;

use crate::app_state::AppController;
use crate::page::{entry_line, GuestbookPage};
use crate::tui::{Action, EventHandler};

#[derive(Parser, Debug)]
#[command(name = "guestbook")]
#[command(about = "Read and sign the on-chain guestbook")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Node RPC URL (e.g. http://localhost:8732)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Wallet bridge URL (e.g. http://localhost:8732/wallet)
    #[arg(long)]
    pub wallet_url: Option<String>,

    /// Guestbook contract address (KT1...)
    #[arg(long)]
    pub contract: Option<ContractAddress>,

    /// Network the wallet grant is scoped to
    #[arg(long)]
    pub network: Option<NetworkType>,

    /// Ignore the settings file; use the environment and defaults only
    #[arg(long, action)]
    pub no_settings: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the guestbook entries (no wallet needed)
    Entries,
    /// Show the balance of an account
    Balance { address: Address },
    /// Connect the wallet, or show the account already granted
    Connect,
    /// Sign the guestbook and wait for the confirmation
    Send { text: String },
    /// Forget the wallet grant
    Disconnect,
    /// Print the resolved configuration
    Config {
        /// Also write it to the settings file
        #[arg(long, action)]
        save: bool,
    },
    /// Interactive page
    Tui,
}

impl Cli {
    /// Settings file and environment, overridden by flags.
    fn config(&self) -> anyhow::Result<GuestbookConfig> {
        let mut config = if self.no_settings {
            GuestbookConfig::from_env()?
        } else {
            GuestbookConfig::load()?
        };
        if let Some(url) = &self.rpc_url {
            config = config.with_rpc_url(url);
        }
        if let Some(url) = &self.wallet_url {
            config.wallet_url.clone_from(url);
        }
        if let Some(contract) = &self.contract {
            config.contract = contract.clone();
        }
        if let Some(network) = self.network {
            config.network.kind = network;
        }
        Ok(config)
    }
}

fn init_tracing(to_file: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if to_file {
        // the terminal belongs to the page
        let path = log_path().context("no config directory for the log file")?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn clients(config: &GuestbookConfig) -> (Arc<HttpWalletSigner>, Arc<RpcLedgerClient>) {
    let signer = Arc::new(HttpWalletSigner::new(&config.wallet_url, &config.app_name));
    let ledger = Arc::new(
        RpcLedgerClient::new(&config.rpc_url)
            .with_wallet(signer.clone())
            .with_poll_interval(config.poll_interval),
    );
    (signer, ledger)
}

/// Reuse an existing grant, or ask for one.
async fn ensure_connected(guestbook: &Guestbook) -> anyhow::Result<Address> {
    if let Some(account) = guestbook.start().await? {
        return Ok(account);
    }
    Ok(guestbook.connect().await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Tui))?;

    let config = cli.config()?;
    info!(rpc = %config.rpc_url, contract = %config.contract, network = %config.network, "starting");
    let (signer, ledger) = clients(&config);

    match cli.command {
        Commands::Entries => {
            let contract = ledger.contract_at(&config.contract).await?;
            let entries = ledger.contract_storage(&contract).await?;
            for entry in &entries {
                println!("{}", entry_line(entry));
            }
            println!("{} entries", entries.len());
        }
        Commands::Balance { address } => {
            let balance = ledger.balance(&address).await?;
            println!("Your balance: {} tez", ledger.format_amount(Unit::Tez, balance));
        }
        Commands::Connect => {
            let guestbook = Guestbook::new(config, signer, ledger);
            let account = ensure_connected(&guestbook).await?;
            println!("Connected as {account}");
        }
        Commands::Send { text } => {
            let guestbook = Guestbook::new(config, signer, ledger);
            let account = ensure_connected(&guestbook).await?;
            guestbook.set_message(text);
            match guestbook.submit().await? {
                SubmitOutcome::Confirmed {
                    operation,
                    level,
                    refresh_error,
                } => {
                    println!("Message from {account} confirmed in {operation} at level {level}");
                    if let Some(e) = refresh_error {
                        eprintln!("warning: {e}");
                    }
                }
                SubmitOutcome::Skipped(reason) => bail!("nothing sent: {reason}"),
            }
        }
        Commands::Disconnect => {
            let guestbook = Guestbook::new(config, signer, ledger);
            guestbook.disconnect().await?;
            println!("Disconnected");
        }
        Commands::Config { save } => {
            let settings = config.to_settings();
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                let path = save_settings(&settings)?;
                println!("Saved to {}", path.display());
            }
        }
        Commands::Tui => {
            run_tui(Guestbook::new(config, signer, ledger)).await?;
        }
    }

    Ok(())
}

async fn run_tui(guestbook: Guestbook) -> anyhow::Result<()> {
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Redraw on every state change
    let tx = events.sender();
    let mut changes = guestbook.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            if tx.send(Action::StateChanged).is_err() {
                break;
            }
        }
    });

    let starter = guestbook.clone();
    tokio::spawn(async move {
        let result = starter.start().await;
        starter.handle(result);
    });

    let mut page = GuestbookPage::new(guestbook);
    let result = loop {
        if let Err(e) = terminal.draw(|f| page.render(f)) {
            break Err(e.into());
        }
        let Some(action) = events.next().await else {
            break Ok(());
        };
        page.update(action);
        if page.should_quit() {
            break Ok(());
        }
    };

    tui::restore()?;
    result
}
