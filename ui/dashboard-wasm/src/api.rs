//! HTTP API client.
//!
//! Wraps `fetch` for JSON requests to the docbank-service backend.
//! `base_url()` honors a user-supplied `#apiBase` input before falling
//! back to same-origin `:8080`.

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::dom;

pub fn base_url() -> String {
    if let Some(input) = dom::by_id_typed::<web_sys::HtmlInputElement>("apiBase") {
        let v = input.value().trim().to_string();
        if !v.is_empty() {
            return v.trim_end_matches('/').to_string();
        }
    }

    let loc = dom::window().location();
    let host = loc.hostname().unwrap_or_default();
    let protocol = loc.protocol().unwrap_or_else(|_| "http:".into());

    format!("{}//{}:8080", protocol, host)
}

/// Perform a fetch request, returning the parsed JSON as `serde_json::Value`.
pub async fn request(
    path: &str,
    method: &str,
    body: Option<String>,
) -> Result<serde_json::Value, String> {
    let url = format!("{}{}", base_url(), path);

    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);

    let headers = Headers::new().map_err(|e| format!("{:?}", e))?;

    if let Some(ref b) = body {
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| format!("{:?}", e))?;
        let js_body = JsValue::from_str(b);
        opts.set_body(&js_body);
    }

    opts.set_headers(&headers);

    let request = Request::new_with_str_and_init(&url, &opts).map_err(|e| format!("{:?}", e))?;

    let window = dom::window();
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("fetch error: {:?}", e))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "response is not a Response".to_string())?;

    let text = JsFuture::from(resp.text().map_err(|e| format!("{:?}", e))?)
        .await
        .map_err(|e| format!("text error: {:?}", e))?;

    let text_str = text.as_string().unwrap_or_default();

    if !resp.ok() {
        // The backend wraps failures as {"error": ...}; surface the message.
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text_str) {
            if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
                return Err(message.to_owned());
            }
        }
        return Err(format!("{} {}: {}", resp.status(), resp.status_text(), text_str));
    }

    serde_json::from_str(&text_str).map_err(|e| format!("JSON parse error: {} — raw: {}", e, text_str))
}

/// Drop a transient toast into the notification area.
pub fn toast(els: &crate::dom::Elements, message: &str, is_error: bool) {
    let note = dom::create_element("div");
    let class = if is_error { "toast toast--error" } else { "toast toast--ok" };
    let _ = note.set_attribute("class", class);
    note.set_text_content(Some(message));
    let _ = els.toast_area.append_child(&note);

    let area = els.toast_area.clone();
    wasm_bindgen_futures::spawn_local(async move {
        TimeoutFuture::new(4_000).await;
        let _ = area.remove_child(&note);
    });
}

pub fn toast_error(els: &crate::dom::Elements, message: &str) {
    toast(els, message, true);
}

pub fn toast_ok(els: &crate::dom::Elements, message: &str) {
    toast(els, message, false);
}
