//! Node RPC subset and wallet bridge routes.
//!
//! Routes are mounted on the templates of [`guestbook_sdk::RpcPaths`] and
//! the tests request them through the matching builders, so client and
//! ledger share one path layout.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use guestbook_models::{Address, ContractCall, Mutez, NetworkType, DEFAULT_ENTRYPOINT};
use guestbook_sdk::wallet::{AccountResponse, OperationResponse, PermissionRequest};
use guestbook_sdk::RpcPaths;
use serde_json::{json, Value};
use tracing::info;

use crate::error::MockError;
use crate::ledger::Ledger;

/// Mount point of the wallet bridge.
pub const WALLET_PREFIX: &str = "/wallet";

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

pub struct AppState {
    ledger: Mutex<Ledger>,
    /// When set, permission requests for another network are refused.
    network: Option<NetworkType>,
}

impl AppState {
    pub fn new(ledger: Ledger, network: Option<NetworkType>) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            network,
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // a panicking handler cannot leave the ledger half-updated
        self.ledger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

type Shared = State<Arc<AppState>>;

pub fn router(state: Arc<AppState>) -> Router {
    let wallet = Router::new()
        .route(
            RpcPaths::WALLET_ACTIVE_ACCOUNT,
            get(active_account).delete(clear_active_account),
        )
        .route(RpcPaths::WALLET_PERMISSIONS, post(request_permissions))
        .route(RpcPaths::WALLET_PUBLIC_KEY_HASH, get(public_key_hash))
        .route(RpcPaths::WALLET_OPERATIONS, post(inject_operation));

    Router::new()
        .route(RpcPaths::HEAD_HEADER, get(head_header))
        .route(RpcPaths::BLOCK_OPERATIONS, get(block_operations))
        .route(RpcPaths::BALANCE, get(balance))
        .route(RpcPaths::ENTRYPOINTS, get(entrypoints))
        .route(RpcPaths::STORAGE_NORMALIZED, post(storage_normalized))
        .nest(WALLET_PREFIX, wallet)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Node RPC
// ---------------------------------------------------------------------------

async fn head_header(State(state): Shared) -> Json<Value> {
    Json(state.ledger().header())
}

/// `GET /chains/main/blocks/{level|head}/operations`
async fn block_operations(
    State(state): Shared,
    Path(block): Path<String>,
) -> Result<Json<Value>, MockError> {
    let ledger = state.ledger();
    let level = if block == "head" {
        ledger.level()
    } else {
        block
            .parse()
            .map_err(|_| MockError::BadRequest(format!("invalid block id {block}")))?
    };
    ledger
        .operations_at(level)
        .map(Json)
        .ok_or_else(|| MockError::NotFound(format!("block {level}")))
}

/// `GET …/contracts/{address}/balance`, a JSON string of mutez.
async fn balance(
    State(state): Shared,
    Path(address): Path<String>,
) -> Result<Json<String>, MockError> {
    let ledger = state.ledger();
    let balance = if ledger.is_guestbook(&address) {
        Mutez::ZERO
    } else {
        let address = Address::parse(&address).map_err(|e| MockError::BadRequest(e.to_string()))?;
        ledger.balance(&address)
    };
    Ok(Json(balance.as_u64().to_string()))
}

/// `GET …/contracts/{kt1}/entrypoints`; the guestbook only has `default`.
async fn entrypoints(
    State(state): Shared,
    Path(address): Path<String>,
) -> Result<Json<Value>, MockError> {
    if !state.ledger().is_guestbook(&address) {
        return Err(MockError::NotFound(format!("contract {address}")));
    }
    Ok(Json(json!({ "entrypoints": {} })))
}

/// `POST …/contracts/{kt1}/storage/normalized`
async fn storage_normalized(
    State(state): Shared,
    Path(address): Path<String>,
    Json(_unparsing): Json<Value>,
) -> Result<Json<Value>, MockError> {
    let ledger = state.ledger();
    if !ledger.is_guestbook(&address) {
        return Err(MockError::NotFound(format!("contract {address}")));
    }
    Ok(Json(ledger.storage()))
}

// ---------------------------------------------------------------------------
// Wallet bridge
// ---------------------------------------------------------------------------

async fn active_account(State(state): Shared) -> Json<AccountResponse> {
    Json(AccountResponse {
        address: state.ledger().granted().cloned(),
    })
}

async fn clear_active_account(State(state): Shared) -> StatusCode {
    state.ledger().revoke();
    info!("grant revoked");
    StatusCode::NO_CONTENT
}

/// `POST /permissions`; auto-approves unless the network is pinned.
async fn request_permissions(
    State(state): Shared,
    Json(req): Json<PermissionRequest>,
) -> Result<Json<AccountResponse>, MockError> {
    if let Some(expected) = state.network {
        if req.network.kind != expected {
            return Err(MockError::PermissionRefused(format!(
                "wallet is on {expected}, not {}",
                req.network.kind
            )));
        }
    }
    let account = state.ledger().grant();
    info!(app = %req.app_name, network = %req.network, account = %account, "permissions granted");
    Ok(Json(AccountResponse {
        address: Some(account),
    }))
}

async fn public_key_hash(State(state): Shared) -> Result<Json<AccountResponse>, MockError> {
    let account = state
        .ledger()
        .granted()
        .cloned()
        .ok_or(MockError::NoActiveAccount)?;
    Ok(Json(AccountResponse {
        address: Some(account),
    }))
}

/// `POST /operations`: sign and inject a guestbook call for the grant.
async fn inject_operation(
    State(state): Shared,
    Json(call): Json<ContractCall>,
) -> Result<Json<OperationResponse>, MockError> {
    let mut ledger = state.ledger();
    let sender = ledger.granted().cloned().ok_or(MockError::NoActiveAccount)?;
    if call.destination != *ledger.contract() {
        return Err(MockError::NotFound(format!("contract {}", call.destination)));
    }
    if call.entrypoint != DEFAULT_ENTRYPOINT {
        return Err(MockError::BadRequest(format!(
            "no entry point {}",
            call.entrypoint
        )));
    }
    let text = call
        .text_argument()
        .ok_or_else(|| MockError::BadRequest("parameter must be a string".into()))?;

    let operation_hash = ledger.add_comment(&sender, text);
    Ok(Json(OperationResponse { operation_hash }))
}
