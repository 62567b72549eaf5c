//! Interop with browser-injected wallet providers (`window.cardano`).
//!
//! Each provider object exposes `{name, icon, apiVersion, enable()}`;
//! `enable()` resolves to the wallet API used for address queries and
//! transaction signing. Everything here is untyped JS interop; the typed
//! seam lives on the other side of the backend.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::dom;

/// A wallet-like object found on `window.cardano`.
#[derive(Clone)]
pub struct InjectedWallet {
    pub key: String,
    pub name: String,
    pub icon: String,
    pub api_version: String,
    handle: JsValue,
}

fn string_prop(object: &JsValue, name: &str) -> Option<String> {
    js_sys::Reflect::get(object, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.as_string())
}

/// Enumerate injected providers: objects without an `apiVersion` marker
/// are skipped, the rest are sorted case-insensitively by name.
pub fn injected_wallets() -> Vec<InjectedWallet> {
    let window: JsValue = dom::window().into();
    let Ok(cardano) = js_sys::Reflect::get(&window, &JsValue::from_str("cardano")) else {
        return Vec::new();
    };
    let Some(cardano_obj) = cardano.dyn_ref::<js_sys::Object>() else {
        return Vec::new();
    };

    let mut wallets = Vec::new();
    for key in js_sys::Object::keys(cardano_obj).iter() {
        let Some(key) = key.as_string() else { continue };
        let Ok(handle) = js_sys::Reflect::get(&cardano, &JsValue::from_str(&key)) else {
            continue;
        };

        // Skip non-wallet objects
        let Some(api_version) = string_prop(&handle, "apiVersion") else {
            continue;
        };

        let name = string_prop(&handle, "name").unwrap_or_else(|| key.clone());
        let icon = string_prop(&handle, "icon").unwrap_or_default();

        wallets.push(InjectedWallet {
            key,
            name,
            icon,
            api_version,
            handle,
        });
    }

    wallets.sort_by(|l, r| l.name.to_uppercase().cmp(&r.name.to_uppercase()));
    wallets
}

pub fn injected_wallet(key: &str) -> Option<InjectedWallet> {
    injected_wallets().into_iter().find(|w| w.key == key)
}

async fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, String> {
    let method = js_sys::Reflect::get(target, &JsValue::from_str(name))
        .map_err(|e| format!("{:?}", e))?;
    let function: js_sys::Function = method
        .dyn_into()
        .map_err(|_| format!("{name} is not callable"))?;

    let result = match args {
        [] => function.call0(target),
        [a] => function.call1(target, a),
        [a, b] => function.call2(target, a, b),
        _ => return Err("too many arguments".to_owned()),
    }
    .map_err(|e| format!("{name} failed: {:?}", e))?;

    match result.dyn_into::<js_sys::Promise>() {
        Ok(promise) => JsFuture::from(promise)
            .await
            .map_err(|e| format!("{name} rejected: {:?}", e)),
        Err(value) => Ok(value),
    }
}

/// Request authorization; resolves to the wallet API handle.
pub async fn enable(wallet: &InjectedWallet) -> Result<JsValue, String> {
    call_method(&wallet.handle, "enable", &[]).await
}

fn first_string(value: JsValue) -> Option<String> {
    let array = value.dyn_into::<js_sys::Array>().ok()?;
    array.get(0).as_string()
}

/// The wallet's first used address (falling back to unused), hex-encoded.
pub async fn used_address_hex(api: &JsValue) -> Result<String, String> {
    let used = call_method(api, "getUsedAddresses", &[]).await?;
    if let Some(address) = first_string(used) {
        return Ok(address);
    }
    let unused = call_method(api, "getUnusedAddresses", &[]).await?;
    first_string(unused).ok_or_else(|| "wallet reported no addresses".to_owned())
}

/// The wallet's first reward address, hex-encoded, when one exists.
pub async fn reward_address_hex(api: &JsValue) -> Result<Option<String>, String> {
    let rewards = call_method(api, "getRewardAddresses", &[]).await?;
    Ok(first_string(rewards))
}

/// Sign an unsigned transaction, returning the witness set
/// (`partialSign = true`: assembly happens backend-side).
pub async fn sign_tx(api: &JsValue, unsigned_tx: &str) -> Result<String, String> {
    let witness = call_method(
        api,
        "signTx",
        &[JsValue::from_str(unsigned_tx), JsValue::from_bool(true)],
    )
    .await?;
    witness
        .as_string()
        .ok_or_else(|| "signTx returned no witness".to_owned())
}
