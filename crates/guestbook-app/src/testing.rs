//! In-process fakes for the wallet and the ledger.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use guestbook_models::{
    Address, Confirmation, ContractAddress, ContractCall, Entry, Mutez, NetworkConfig,
    OperationHandle, OperationHash,
};
use guestbook_sdk::{ContractHandle, LedgerClient, SdkError, WalletSigner};
use serde_json::Value;
use tokio::sync::watch;

pub const GUESTBOOK: &str = "KT19s3jHpUUPH3KfMcN1ShX7hzyCTkdnm2Cu";

pub fn guestbook_address() -> ContractAddress {
    ContractAddress::parse(GUESTBOOK).unwrap()
}

pub fn guestbook_handle() -> ContractHandle {
    ContractHandle::new(guestbook_address(), vec![])
}

pub fn entry(address: &str, text: &str) -> Entry {
    Entry::new(Address::new(address), Utc::now(), text)
}

fn unavailable() -> SdkError {
    SdkError::Rpc {
        status: 503,
        body: "node unavailable".into(),
    }
}

/// A one-shot barrier shared by any number of waiters.
#[derive(Clone)]
pub struct Gate(Arc<watch::Sender<bool>>);

impl Gate {
    pub fn new() -> Self {
        Self(Arc::new(watch::channel(false).0))
    }

    pub fn open(&self) {
        self.0.send_replace(true);
    }

    pub async fn wait(&self) {
        let mut rx = self.0.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

pub struct FakeWallet {
    account: Option<Address>,
    authorized: AtomicBool,
    declines: bool,
    gate: Option<Gate>,
    pkh_gate: Option<Gate>,
    permission_requests: AtomicUsize,
    pkh_requests: AtomicUsize,
    next_op: AtomicUsize,
}

impl FakeWallet {
    /// Grants `account` on every permission request.
    pub fn granting(account: &str) -> Self {
        Self {
            account: Some(Address::new(account)),
            authorized: AtomicBool::new(false),
            declines: false,
            gate: None,
            pkh_gate: None,
            permission_requests: AtomicUsize::new(0),
            pkh_requests: AtomicUsize::new(0),
            next_op: AtomicUsize::new(0),
        }
    }

    /// Declines every permission request.
    pub fn rejecting() -> Self {
        Self {
            account: None,
            ..Self::granting("tz1Unused")
        }
    }

    /// The grant survives from a previous run.
    pub fn already_authorized(self) -> Self {
        self.authorized.store(true, Ordering::SeqCst);
        self
    }

    /// Permission requests block until [`FakeWallet::release`].
    pub fn gated(mut self) -> Self {
        self.gate = Some(Gate::new());
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.open();
        }
    }

    /// Declines permission requests even though an account exists.
    pub fn declining(mut self) -> Self {
        self.declines = true;
        self
    }

    /// Public key hash lookups block until [`FakeWallet::release_public_key_hash`].
    pub fn gated_public_key_hash(mut self) -> Self {
        self.pkh_gate = Some(Gate::new());
        self
    }

    pub fn release_public_key_hash(&self) {
        if let Some(gate) = &self.pkh_gate {
            gate.open();
        }
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub async fn wait_for_public_key_hash_requests(&self, n: usize) {
        while self.pkh_requests.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for FakeWallet {
    async fn active_account(&self) -> Result<Option<Address>, SdkError> {
        Ok(self.account.clone().filter(|_| self.is_authorized()))
    }

    async fn request_permissions(&self, _network: &NetworkConfig) -> Result<Address, SdkError> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        let account = self
            .account
            .clone()
            .filter(|_| !self.declines)
            .ok_or_else(|| SdkError::WalletRejected("user declined".into()))?;
        self.authorized.store(true, Ordering::SeqCst);
        Ok(account)
    }

    async fn public_key_hash(&self) -> Result<Address, SdkError> {
        self.pkh_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.pkh_gate {
            gate.wait().await;
        }
        self.account
            .clone()
            .filter(|_| self.is_authorized())
            .ok_or_else(|| SdkError::WalletRejected("no active account".into()))
    }

    async fn send_operation(&self, _call: &ContractCall) -> Result<OperationHash, SdkError> {
        let n = self.next_op.fetch_add(1, Ordering::SeqCst);
        Ok(OperationHash::new(&format!("ooFake{n}")))
    }

    async fn clear_active_account(&self) -> Result<(), SdkError> {
        self.authorized.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// How [`FakeLedger::await_confirmation`] resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmMode {
    /// Included and applied; the message lands at the head of storage.
    #[default]
    Applied,
    NotApplied,
    Fail,
    Hang,
}

type Scripted<T> = Mutex<VecDeque<(T, Option<Gate>)>>;

pub struct FakeLedger {
    balance: Mutex<Mutez>,
    entries: Mutex<Vec<Entry>>,
    sender: Mutex<Address>,
    balance_script: Scripted<Mutez>,
    storage_script: Scripted<Vec<Entry>>,
    pending: Mutex<Option<String>>,
    confirm_mode: Mutex<ConfirmMode>,
    confirm_gate: Mutex<Option<Gate>>,
    fail_reads: AtomicBool,
    fail_invocations: AtomicBool,
    contract_bindings: AtomicUsize,
    storage_reads: AtomicUsize,
    invocations: AtomicUsize,
    level: AtomicUsize,
}

impl FakeLedger {
    pub fn new(balance: Mutez, entries: Vec<Entry>) -> Self {
        Self {
            balance: Mutex::new(balance),
            entries: Mutex::new(entries),
            sender: Mutex::new(Address::new("tz1Sender")),
            balance_script: Mutex::default(),
            storage_script: Mutex::default(),
            pending: Mutex::default(),
            confirm_mode: Mutex::default(),
            confirm_gate: Mutex::default(),
            fail_reads: AtomicBool::new(false),
            fail_invocations: AtomicBool::new(false),
            contract_bindings: AtomicUsize::new(0),
            storage_reads: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
            level: AtomicUsize::new(100),
        }
    }

    /// Applied messages are recorded as sent by `sender`.
    pub fn with_sender(self, sender: &Address) -> Self {
        *self.sender.lock().unwrap() = sender.clone();
        self
    }

    pub fn confirm_mode(&self, mode: ConfirmMode) {
        *self.confirm_mode.lock().unwrap() = mode;
    }

    /// Confirmations block until the returned gate opens.
    pub fn gate_confirmation(&self) -> Gate {
        let gate = Gate::new();
        *self.confirm_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_invocations(&self, fail: bool) {
        self.fail_invocations.store(fail, Ordering::SeqCst);
    }

    /// Queue the values returned by the next balance and storage reads.
    pub fn script_read(&self, balance: Mutez, entries: Vec<Entry>) {
        self.push_script(balance, entries, None);
    }

    /// Like [`FakeLedger::script_read`], held back until the gate opens.
    pub fn script_read_gated(&self, balance: Mutez, entries: Vec<Entry>) -> Gate {
        let gate = Gate::new();
        self.push_script(balance, entries, Some(gate.clone()));
        gate
    }

    fn push_script(&self, balance: Mutez, entries: Vec<Entry>, gate: Option<Gate>) {
        self.balance_script
            .lock()
            .unwrap()
            .push_back((balance, gate.clone()));
        self.storage_script.lock().unwrap().push_back((entries, gate));
    }

    pub fn contract_bindings(&self) -> usize {
        self.contract_bindings.load(Ordering::SeqCst)
    }

    pub fn storage_reads(&self) -> usize {
        self.storage_reads.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub async fn wait_for_storage_reads(&self, n: usize) {
        while self.storage_reads() < n {
            tokio::task::yield_now().await;
        }
    }

    fn reads_failing(&self) -> bool {
        self.fail_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn balance(&self, _account: &Address) -> Result<Mutez, SdkError> {
        let scripted = self.balance_script.lock().unwrap().pop_front();
        if self.reads_failing() {
            return Err(unavailable());
        }
        match scripted {
            Some((balance, gate)) => {
                if let Some(gate) = gate {
                    gate.wait().await;
                }
                Ok(balance)
            }
            None => Ok(*self.balance.lock().unwrap()),
        }
    }

    async fn contract_at(&self, address: &ContractAddress) -> Result<ContractHandle, SdkError> {
        if self.reads_failing() {
            return Err(unavailable());
        }
        self.contract_bindings.fetch_add(1, Ordering::SeqCst);
        Ok(ContractHandle::new(address.clone(), vec![]))
    }

    async fn contract_storage(&self, _contract: &ContractHandle) -> Result<Vec<Entry>, SdkError> {
        self.storage_reads.fetch_add(1, Ordering::SeqCst);
        let scripted = self.storage_script.lock().unwrap().pop_front();
        if self.reads_failing() {
            return Err(unavailable());
        }
        match scripted {
            Some((entries, gate)) => {
                if let Some(gate) = gate {
                    gate.wait().await;
                }
                Ok(entries)
            }
            None => Ok(self.entries.lock().unwrap().clone()),
        }
    }

    async fn invoke(
        &self,
        _contract: &ContractHandle,
        _entrypoint: &str,
        parameter: Value,
    ) -> Result<OperationHandle, SdkError> {
        if self.fail_invocations.load(Ordering::SeqCst) {
            return Err(SdkError::WalletRejected("user aborted signing".into()));
        }
        let n = self.invocations.fetch_add(1, Ordering::SeqCst);
        let text = parameter
            .get("string")
            .and_then(Value::as_str)
            .unwrap_or_default();
        *self.pending.lock().unwrap() = Some(text.to_string());
        Ok(OperationHandle {
            hash: OperationHash::new(&format!("ooFake{n}")),
            injected_after_level: self.level.load(Ordering::SeqCst) as u64,
        })
    }

    async fn await_confirmation(
        &self,
        _operation: &OperationHandle,
    ) -> Result<Confirmation, SdkError> {
        let gate = self.confirm_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        let mode = *self.confirm_mode.lock().unwrap();
        let level = self.level.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        match mode {
            ConfirmMode::Applied => {
                if let Some(text) = self.pending.lock().unwrap().take() {
                    let sender = self.sender.lock().unwrap().clone();
                    self.entries
                        .lock()
                        .unwrap()
                        .insert(0, Entry::new(sender, Utc::now(), text));
                }
                Ok(Confirmation {
                    completed: true,
                    level,
                })
            }
            ConfirmMode::NotApplied => Ok(Confirmation {
                completed: false,
                level,
            }),
            ConfirmMode::Fail => Err(unavailable()),
            ConfirmMode::Hang => std::future::pending().await,
        }
    }
}
