//! Wallet connector modal and connection display.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use dbk_chain_client::address;

use crate::api;
use crate::cip30;
use crate::dom::{self, Elements};
use crate::documents_view;
use crate::state;
use crate::tokens_view;

const WALLET_KEY_STORAGE: &str = "dbk_wallet";

/// Render the header connection area from the current state.
pub fn render_connection(els: &Elements) {
    let connection = state::connection();

    if connection.is_connected() {
        dom::set_text(&els.wallet_name_display, &connection.wallet_name);
        dom::set_text(
            &els.wallet_address_display,
            &dom::shorten(&connection.address, 12, 8),
        );
        let _ = els.wallet_address_display.set_attribute("title", &connection.address);
        dom::add_class(els.connect_btn.unchecked_ref(), "hidden");
        dom::remove_class(els.disconnect_btn.unchecked_ref(), "hidden");
    } else {
        dom::set_text(&els.wallet_name_display, "");
        dom::set_text(&els.wallet_address_display, "");
        dom::remove_class(els.connect_btn.unchecked_ref(), "hidden");
        dom::add_class(els.disconnect_btn.unchecked_ref(), "hidden");
    }
}

pub fn open_modal(els: &Elements) {
    render_wallet_modal(els);
    dom::add_class(&els.wallet_modal, "open");
}

pub fn close_modal(els: &Elements) {
    dom::remove_class(&els.wallet_modal, "open");
}

/// Render the provider cards inside the modal and wire their buttons.
pub fn render_wallet_modal(els: &Elements) {
    let container = &els.wallet_list_container;
    dom::set_inner_html(container, "");

    let wallets = cip30::injected_wallets();
    if wallets.is_empty() {
        dom::set_inner_html(
            container,
            r#"<div class="wallet-card wallet-card--empty">No Cardano wallets found</div>"#,
        );
        return;
    }

    for wallet in &wallets {
        let card = dom::create_element("div");
        let _ = card.set_attribute("class", "wallet-card");

        let icon_html = if wallet.icon.is_empty() {
            String::new()
        } else {
            format!(r#"<img class="wc-icon" src="{}" alt="{} icon">"#, wallet.icon, wallet.name)
        };
        let html = format!(
            r#"
            <span class="wc-name">{}</span>
            <span class="wc-version">v{}</span>
            {}
            <button class="wc-connect-btn" data-key="{}">Connect</button>
            "#,
            wallet.name, wallet.api_version, icon_html, wallet.key,
        );
        dom::set_inner_html(&card, &html);
        container.append_child(&card).unwrap();
    }

    for btn in dom::query_all_within(container, ".wc-connect-btn") {
        let key = btn.get_attribute("data-key").unwrap_or_default();
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els3 = els2.clone();
            let k = key.clone();
            wasm_bindgen_futures::spawn_local(async move {
                on_connect(&els3, &k).await;
            });
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }
}

fn reward_bech32(bytes: &[u8]) -> Result<String, address::AddressError> {
    let hrp = if bytes.first().map(|b| b & 1) == Some(1) {
        "stake"
    } else {
        "stake_test"
    };
    address::encode(hrp, bytes)
}

/// Authorize the chosen provider and derive every connection field before
/// committing the state in one write.
pub async fn on_connect(els: &Elements, key: &str) {
    let Some(wallet) = cip30::injected_wallet(key) else {
        api::toast_error(els, "wallet is no longer available");
        return;
    };

    let wallet_api = match cip30::enable(&wallet).await {
        Ok(api) => api,
        Err(err) => {
            api::toast_error(els, &err);
            return;
        }
    };

    let connection = match derive_connection(&wallet, &wallet_api).await {
        Ok(connection) => connection,
        Err(err) => {
            api::toast_error(els, &err);
            return;
        }
    };

    state::set_connection(connection);
    state::set_wallet_api(Some(wallet_api));
    state::local_set(WALLET_KEY_STORAGE, key);

    close_modal(els);
    render_connection(els);
    documents_view::refresh(els);
    tokens_view::refresh(els);
}

async fn derive_connection(
    wallet: &cip30::InjectedWallet,
    wallet_api: &JsValue,
) -> Result<state::ConnectionView, String> {
    let address_hex = cip30::used_address_hex(wallet_api).await?;
    let address_bytes = hex::decode(&address_hex).map_err(|e| format!("bad address hex: {e}"))?;
    let bech32_address = address::encode_payment_address(&address_bytes)
        .map_err(|e| format!("bad address payload: {e}"))?;
    let payment_key_hash =
        address::payment_key_hash(&bech32_address).map_err(|e| e.to_string())?;

    let stake_address = match cip30::reward_address_hex(wallet_api).await? {
        Some(reward_hex) => {
            let reward_bytes =
                hex::decode(&reward_hex).map_err(|e| format!("bad reward hex: {e}"))?;
            reward_bech32(&reward_bytes).map_err(|e| e.to_string())?
        }
        None => address::stake_address_of(&bech32_address)
            .map_err(|e| e.to_string())?
            .unwrap_or_default(),
    };
    let stake_key_hash = if stake_address.is_empty() {
        String::new()
    } else {
        address::stake_key_hash(&stake_address).map_err(|e| e.to_string())?
    };

    Ok(state::ConnectionView {
        wallet_key: wallet.key.clone(),
        wallet_name: wallet.name.clone(),
        wallet_icon: wallet.icon.clone(),
        address: bech32_address,
        payment_key_hash,
        stake_address,
        stake_key_hash,
    })
}

/// Drop the session and reset every derived field.
pub fn on_disconnect(els: &Elements) {
    state::set_connection(state::ConnectionView::default());
    state::set_wallet_api(None);
    state::local_remove(WALLET_KEY_STORAGE);
    state::set_documents(Vec::new());
    state::set_tokens(Vec::new());
    state::bump_docs_generation();
    state::bump_tokens_generation();

    render_connection(els);
    documents_view::render_documents(els);
    tokens_view::render_tokens(els);
}
