//! In-memory chain hosting a single guestbook contract.
//!
//! Every injected operation is baked into its own block right away, so a
//! client polling the head finds it at `level + 1`. The guestbook entry
//! point pushes `{sender, now, text}` onto the head of the stored list.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, SubsecRound, Utc};
use guestbook_models::micheline::encode_entries;
use guestbook_models::{Address, ContractAddress, Entry, Mutez, OperationHash};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::MockConfig;

/// Flat fee charged for a guestbook call.
pub const CALL_FEE: Mutez = Mutez::new(1_420);

const GENESIS_LEVEL: u64 = 1;

pub struct Ledger {
    level: u64,
    head_timestamp: DateTime<Utc>,
    /// Manager operations per block level.
    blocks: BTreeMap<u64, Vec<Value>>,
    balances: HashMap<Address, Mutez>,
    contract: ContractAddress,
    guestbook: Vec<Entry>,
    next_operation: u64,
    granted: Option<Address>,
    account: Address,
}

impl Ledger {
    pub fn new(config: &MockConfig) -> Self {
        let now = Utc::now().trunc_subsecs(0);
        let mut balances = HashMap::new();
        balances.insert(config.account.clone(), config.initial_balance);
        Self {
            level: GENESIS_LEVEL,
            head_timestamp: now,
            blocks: BTreeMap::new(),
            balances,
            contract: config.contract.clone(),
            guestbook: Vec::new(),
            next_operation: 0,
            granted: None,
            account: config.account.clone(),
        }
    }

    /// Start with `entries` already in storage.
    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.guestbook = entries;
        self
    }

    pub fn level(&self) -> u64 {
        self.level
    }

    pub fn header(&self) -> Value {
        json!({
            "level": self.level,
            "timestamp": self.head_timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        })
    }

    /// Operations of the block at `level`, in the four validation passes.
    pub fn operations_at(&self, level: u64) -> Option<Value> {
        if level > self.level {
            return None;
        }
        let manager = self.blocks.get(&level).cloned().unwrap_or_default();
        Some(json!([[], [], [], manager]))
    }

    pub fn balance(&self, address: &Address) -> Mutez {
        self.balances.get(address).copied().unwrap_or(Mutez::ZERO)
    }

    pub fn is_guestbook(&self, address: &str) -> bool {
        self.contract.as_str() == address
    }

    pub fn contract(&self) -> &ContractAddress {
        &self.contract
    }

    /// Guestbook storage in readable Micheline.
    pub fn storage(&self) -> Value {
        encode_entries(&self.guestbook)
    }

    // ------------------------------------------------------------------
    // Wallet bridge
    // ------------------------------------------------------------------

    pub fn granted(&self) -> Option<&Address> {
        self.granted.as_ref()
    }

    pub fn grant(&mut self) -> Address {
        self.granted = Some(self.account.clone());
        self.account.clone()
    }

    pub fn revoke(&mut self) {
        self.granted = None;
    }

    /// Call the guestbook entry point as `sender`.
    ///
    /// The operation is always included. It applies only when the sender
    /// can pay the fee; otherwise storage is left untouched and the
    /// operation is recorded as failed.
    pub fn add_comment(&mut self, sender: &Address, text: &str) -> OperationHash {
        self.next_operation += 1;
        let hash = OperationHash::new(&format!("oo{:0>49}", self.next_operation));

        self.level += 1;
        self.head_timestamp = Utc::now().trunc_subsecs(0);
        let level = self.level;

        let balance = self.balance(sender);
        let applied = balance >= CALL_FEE;
        if applied {
            self.balances
                .insert(sender.clone(), Mutez::new(balance.as_u64() - CALL_FEE.as_u64()));
            self.guestbook
                .insert(0, Entry::new(sender.clone(), self.head_timestamp, text));
            info!(operation = %hash, level, sender = %sender, "guestbook entry added");
        } else {
            warn!(operation = %hash, level, sender = %sender, %balance, "fee not covered, operation failed");
        }

        let status = if applied { "applied" } else { "failed" };
        let operation = json!({
            "hash": hash,
            "contents": [{
                "kind": "transaction",
                "source": sender,
                "fee": CALL_FEE.as_u64().to_string(),
                "amount": "0",
                "destination": self.contract,
                "parameters": { "entrypoint": "default", "value": { "string": text } },
                "metadata": { "operation_result": { "status": status } }
            }]
        });
        self.blocks.entry(level).or_default().push(operation);
        hash
    }
}
