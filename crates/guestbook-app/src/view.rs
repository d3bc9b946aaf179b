//! Balance and entries, derived from the ledger.
//!
//! [`ContractView::refresh`] re-reads both values and publishes each one as
//! soon as the read succeeds. A failed read leaves the previous value in
//! place. Overlapping refreshes are allowed: whichever completes last is
//! what subscribers end up seeing.

use std::sync::Arc;

use guestbook_models::{Address, ContractAddress};
use guestbook_sdk::{ContractHandle, LedgerClient};
use tracing::{debug, warn};

use crate::error::ReadError;
use crate::state::StateHandle;

#[derive(Clone)]
pub struct ContractView {
    ledger: Arc<dyn LedgerClient>,
    state: StateHandle,
    contract: ContractAddress,
}

impl ContractView {
    pub fn new(ledger: Arc<dyn LedgerClient>, state: StateHandle, contract: ContractAddress) -> Self {
        Self {
            ledger,
            state,
            contract,
        }
    }

    /// Re-read the balance of `account` and the full guestbook storage.
    ///
    /// Results for an account that is no longer the active one are
    /// discarded. When both reads fail, the balance error is returned.
    pub async fn refresh(&self, account: &Address) -> Result<(), ReadError> {
        let balance = async {
            self.ledger
                .balance(account)
                .await
                .map_err(ReadError::Balance)
        };
        let entries = async {
            let contract = self.bound_contract(account).await?;
            self.ledger
                .contract_storage(&contract)
                .await
                .map_err(ReadError::Storage)
        };
        let (balance, entries) = tokio::join!(balance, entries);

        let balance = balance.map(|balance| {
            self.state.update_if(|s| {
                if !s.is_active_account(account) {
                    return false;
                }
                s.balance = Some(balance);
                true
            })
        });
        let entries = entries.map(|entries| {
            let count = entries.len();
            let applied = self.state.update_if(|s| {
                if !s.is_active_account(account) {
                    return false;
                }
                s.entries = Some(entries);
                true
            });
            debug!(account = %account, count, applied, "guestbook entries refreshed");
            applied
        });

        if let Err(e) = &balance {
            warn!(account = %account, error = %e, "balance refresh failed, keeping previous value");
        }
        if let Err(e) = &entries {
            warn!(account = %account, error = %e, "entries refresh failed, keeping previous value");
        }
        balance.and(entries).map(|_| ())
    }

    /// The contract handle of the current connection, bound on first use.
    async fn bound_contract(&self, account: &Address) -> Result<ContractHandle, ReadError> {
        if let Some(contract) = self.state.read(|s| s.contract.clone()) {
            return Ok(contract);
        }
        let contract = self
            .ledger
            .contract_at(&self.contract)
            .await
            .map_err(ReadError::Contract)?;
        self.state.update_if(|s| {
            if !s.is_active_account(account) || s.contract.is_some() {
                return false;
            }
            s.contract = Some(contract.clone());
            true
        });
        Ok(contract)
    }
}
