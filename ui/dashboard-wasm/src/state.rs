//! Global application state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).
//! The wallet-API handle lives in its own slot because it is a raw JS
//! value, not data.

use std::cell::RefCell;

use wasm_bindgen::JsValue;

use dbk_api_types::{DocumentRecord, TokenDto};

/// Display fields of the current wallet connection; all empty while
/// disconnected. Replaced wholesale on connect/disconnect.
#[derive(Clone, Debug, Default)]
pub struct ConnectionView {
    pub wallet_key: String,
    pub wallet_name: String,
    pub wallet_icon: String,
    pub address: String,
    pub payment_key_hash: String,
    pub stake_address: String,
    pub stake_key_hash: String,
}

impl ConnectionView {
    pub fn is_connected(&self) -> bool {
        !self.address.is_empty()
    }
}

/// Central application state.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub connection: ConnectionView,
    pub documents: Vec<DocumentRecord>,
    pub tokens: Vec<TokenDto>,
    pub page: usize,
    /// Liveness gates: a resolved fetch only applies its result when the
    /// generation it started with is still current. Documents and tokens
    /// refresh independently, so each keeps its own counter.
    pub docs_generation: u64,
    pub tokens_generation: u64,
}

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
    static WALLET_API: RefCell<Option<JsValue>> = const { RefCell::new(None) };
}

/// Run a closure with shared read access to the state.
pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

/// Run a closure with mutable access to the state.
pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

// ── Convenience accessors ──

pub fn connection() -> ConnectionView {
    with(|s| s.connection.clone())
}

pub fn set_connection(view: ConnectionView) {
    with_mut(|s| s.connection = view);
}

pub fn documents() -> Vec<DocumentRecord> {
    with(|s| s.documents.clone())
}

pub fn set_documents(documents: Vec<DocumentRecord>) {
    with_mut(|s| s.documents = documents);
}

pub fn tokens() -> Vec<TokenDto> {
    with(|s| s.tokens.clone())
}

pub fn set_tokens(tokens: Vec<TokenDto>) {
    with_mut(|s| s.tokens = tokens);
}

pub fn page() -> usize {
    with(|s| s.page)
}

pub fn set_page(page: usize) {
    with_mut(|s| s.page = page);
}

/// Advance the document-fetch generation, invalidating every in-flight
/// document/stat request.
pub fn bump_docs_generation() -> u64 {
    with_mut(|s| {
        s.docs_generation += 1;
        s.docs_generation
    })
}

pub fn docs_generation_is_current(generation: u64) -> bool {
    with(|s| s.docs_generation == generation)
}

/// Advance the token-fetch generation, invalidating every in-flight
/// token request.
pub fn bump_tokens_generation() -> u64 {
    with_mut(|s| {
        s.tokens_generation += 1;
        s.tokens_generation
    })
}

pub fn tokens_generation_is_current(generation: u64) -> bool {
    with(|s| s.tokens_generation == generation)
}

pub fn wallet_api() -> Option<JsValue> {
    WALLET_API.with(|api| api.borrow().clone())
}

pub fn set_wallet_api(api: Option<JsValue>) {
    WALLET_API.with(|slot| *slot.borrow_mut() = api);
}

// ── localStorage helpers ──

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn local_get(key: &str) -> Option<String> {
    storage()?.get_item(key).ok()?
}

pub fn local_set(key: &str, value: &str) {
    if let Some(s) = storage() {
        let _ = s.set_item(key, value);
    }
}

pub fn local_remove(key: &str) {
    if let Some(s) = storage() {
        let _ = s.remove_item(key);
    }
}
