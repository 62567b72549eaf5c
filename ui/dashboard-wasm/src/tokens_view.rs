//! Token cards: list, update, burn.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use dbk_api_types::TokenDto;

use crate::api;
use crate::dom::{self, Elements};
use crate::state;
use crate::upload_view::sign_and_submit;

pub fn refresh(els: &Elements) {
    let generation = state::bump_tokens_generation();
    let e = els.clone();
    spawn_local(async move { load_tokens(&e, generation).await });
}

async fn load_tokens(els: &Elements, generation: u64) {
    let connection = state::connection();
    if !connection.is_connected() {
        return;
    }
    dom::set_inner_html(
        &els.tokens_container,
        r#"<div class="token-card token-card--empty">Loading tokens…</div>"#,
    );

    let path = format!(
        "/tokens?owner_address={}",
        js_sys::encode_uri_component(&connection.address)
    );
    match api::request(&path, "GET", None).await {
        Ok(result) => {
            let tokens = result
                .get("tokens")
                .cloned()
                .and_then(|value| serde_json::from_value::<Vec<TokenDto>>(value).ok())
                .unwrap_or_default();
            if !state::tokens_generation_is_current(generation) {
                return;
            }
            state::set_tokens(tokens);
            render_tokens(els);
        }
        Err(err) => {
            if !state::tokens_generation_is_current(generation) {
                return;
            }
            api::toast_error(els, &format!("failed to load tokens: {err}"));
            state::set_tokens(Vec::new());
            render_tokens(els);
        }
    }
}

/// Render the token cards and wire their update/burn buttons.
pub fn render_tokens(els: &Elements) {
    let tokens = state::tokens();
    let container = &els.tokens_container;
    dom::set_inner_html(container, "");

    if tokens.is_empty() {
        dom::set_inner_html(
            container,
            r#"<div class="token-card token-card--empty">No minted documents</div>"#,
        );
        return;
    }

    for (index, token) in tokens.iter().enumerate() {
        let card = dom::create_element("div");
        let _ = card.set_attribute("class", "token-card");

        let html = format!(
            r#"
            <div class="tc-name">{}</div>
            <div class="tc-asset" title="{}">{}</div>
            <a class="tc-image" href="{}" target="_blank" rel="noreferrer">view document</a>
            <div class="tc-actions">
              <button class="tc-update-btn" data-index="{index}">Update</button>
              <button class="tc-burn-btn" data-index="{index}">Burn</button>
            </div>
            "#,
            token.name,
            token.asset_name,
            dom::shorten(&token.asset_name, 10, 6),
            token.image,
        );
        dom::set_inner_html(&card, &html);
        container.append_child(&card).unwrap();
    }

    wire_token_card_events(els);
}

fn wire_token_card_events(els: &Elements) {
    let container = &els.tokens_container;

    for btn in dom::query_all_within(container, ".tc-update-btn") {
        let index: usize = btn
            .get_attribute("data-index")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els3 = els2.clone();
            wasm_bindgen_futures::spawn_local(async move {
                on_update(&els3, index).await;
            });
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }

    for btn in dom::query_all_within(container, ".tc-burn-btn") {
        let index: usize = btn
            .get_attribute("data-index")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els3 = els2.clone();
            wasm_bindgen_futures::spawn_local(async move {
                on_burn(&els3, index).await;
            });
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }
}

fn token_request_body(connection: &state::ConnectionView, token: &TokenDto) -> serde_json::Value {
    serde_json::json!({
        "owner_address": connection.address,
        "name": token.name,
        "image": token.image,
        "asset_name": token.asset_name,
        "utxo": token.utxo,
    })
}

async fn prepare_sign_submit(
    els: &Elements,
    path: &str,
    body: serde_json::Value,
) -> Option<(TokenDto, String)> {
    let result = match api::request(path, "POST", Some(body.to_string())).await {
        Ok(result) => result,
        Err(err) => {
            api::toast_error(els, &err);
            return None;
        }
    };

    let Some(token) = result
        .get("token")
        .cloned()
        .and_then(|value| serde_json::from_value::<TokenDto>(value).ok())
    else {
        api::toast_error(els, "prepare response carried no token");
        return None;
    };
    let Some(unsigned_tx) = result.get("unsigned_tx").and_then(|v| v.as_str()) else {
        api::toast_error(els, "prepare response carried no transaction");
        return None;
    };

    match sign_and_submit(unsigned_tx).await {
        Ok(tx_hash) => Some((token, tx_hash)),
        Err(err) => {
            api::toast_error(els, &err);
            None
        }
    }
}

/// Rewrite a token's name via an update transaction. The token keeps its
/// asset name; only the datum and the UTxO pointer change.
pub async fn on_update(els: &Elements, index: usize) {
    let connection = state::connection();
    let Some(mut token) = state::tokens().into_iter().nth(index) else {
        return;
    };

    let new_name = dom::window()
        .prompt_with_message("Enter the new token name:")
        .ok()
        .flatten()
        .unwrap_or_default();
    if new_name.trim().is_empty() {
        return;
    }
    token.name = new_name.trim().to_owned();

    let body = token_request_body(&connection, &token);
    if let Some((updated, tx_hash)) = prepare_sign_submit(els, "/tokens/update", body).await {
        api::toast_ok(els, &format!("Update Token TxHash: {tx_hash}"));
        let mut updated = updated;
        updated.utxo.tx_hash = tx_hash;
        state::with_mut(|s| {
            if let Some(slot) = s.tokens.get_mut(index) {
                *slot = updated;
            }
        });
        render_tokens(els);
    }
}

/// Burn both units; the token disappears from the wallet and its pointer
/// becomes the "no output" sentinel.
pub async fn on_burn(els: &Elements, index: usize) {
    let connection = state::connection();
    let Some(token) = state::tokens().into_iter().nth(index) else {
        return;
    };

    let confirmed = dom::window()
        .confirm_with_message(&format!("Burn {}? This cannot be undone.", token.name))
        .unwrap_or(false);
    if !confirmed {
        return;
    }

    let body = token_request_body(&connection, &token);
    if let Some((burned, tx_hash)) = prepare_sign_submit(els, "/tokens/burn", body).await {
        // Sentinel pointer: empty address, empty assets, index −1.
        debug_assert_eq!(burned.utxo.output_index, -1);
        api::toast_ok(els, &format!("Burn Token TxHash: {tx_hash}"));
        state::with_mut(|s| {
            s.tokens.remove(index);
        });
        render_tokens(els);
    }
}
