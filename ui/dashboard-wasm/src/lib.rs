//! DocBank dashboard frontend.
//!
//! Pure Rust + WASM: wallet connection against browser-injected providers,
//! uploads and registry reads against the docbank-service backend.
//! Each concern lives in its own module.

pub mod api;
pub mod cip30;
pub mod documents_view;
pub mod dom;
pub mod events;
pub mod state;
pub mod tokens_view;
pub mod upload_view;
pub mod wallet_view;

use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    wallet_view::render_connection(&els);
    documents_view::render_documents(&els);
    tokens_view::render_tokens(&els);

    events::bind_events(&els);

    Ok(())
}
