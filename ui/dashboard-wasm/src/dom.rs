//! DOM element bindings.
//!
//! All fields are resolved once at startup. To add new UI elements, add a
//! field here and bind it in `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

// ── Helpers ──

fn doc() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_inner_html(el: &Element, html: &str) {
    el.set_inner_html(html);
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

pub fn get_select_value(el: &HtmlSelectElement) -> String {
    el.value()
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn remove_class(el: &Element, cls: &str) {
    let _ = el.class_list().remove_1(cls);
}

pub fn create_element(tag: &str) -> Element {
    doc().create_element(tag).unwrap()
}

/// Query all matching elements within a parent element.
pub fn query_all_within(parent: &Element, selector: &str) -> Vec<Element> {
    let nl = parent.query_selector_all(selector).unwrap();
    let mut v = Vec::new();
    for i in 0..nl.length() {
        if let Some(e) = nl.item(i) {
            if let Ok(el) = e.dyn_into::<Element>() {
                v.push(el);
            }
        }
    }
    v
}

pub fn window() -> web_sys::Window {
    web_sys::window().unwrap()
}

pub fn shorten(s: &str, head: usize, tail: usize) -> String {
    if s.len() <= head + tail + 1 {
        s.to_string()
    } else {
        format!("{}\u{2026}{}", &s[..head], &s[s.len() - tail..])
    }
}

// ── Elements struct ──

/// All DOM element references used by the dashboard.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    // Header / wallet
    pub connect_btn: HtmlElement,
    pub disconnect_btn: HtmlElement,
    pub wallet_modal: Element,
    pub wallet_modal_close: HtmlElement,
    pub wallet_list_container: Element,
    pub wallet_name_display: Element,
    pub wallet_address_display: Element,

    // Stat tiles
    pub stat_documents_total: Element,
    pub stat_storage_text: Element,
    pub stat_storage_count: Element,
    pub stat_storage_bar: HtmlElement,

    // Document table
    pub documents_table_body: Element,
    pub docs_prev_btn: HtmlElement,
    pub docs_next_btn: HtmlElement,
    pub docs_page_label: Element,

    // Upload dialog
    pub upload_file_input: HtmlInputElement,
    pub upload_name_input: HtmlInputElement,
    pub upload_mode_select: HtmlSelectElement,
    pub upload_btn: HtmlElement,

    // Token list
    pub tokens_container: Element,
    pub refresh_tokens_btn: HtmlElement,

    // Notifications
    pub toast_area: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_select {
    ($id:expr) => {
        by_id_typed::<HtmlSelectElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing select #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_html!("connectBtn"),
            disconnect_btn: get_html!("disconnectBtn"),
            wallet_modal: get_el!("walletModal"),
            wallet_modal_close: get_html!("walletModalClose"),
            wallet_list_container: get_el!("walletListContainer"),
            wallet_name_display: get_el!("walletNameDisplay"),
            wallet_address_display: get_el!("walletAddressDisplay"),

            stat_documents_total: get_el!("statDocumentsTotal"),
            stat_storage_text: get_el!("statStorageText"),
            stat_storage_count: get_el!("statStorageCount"),
            stat_storage_bar: get_html!("statStorageBar"),

            documents_table_body: get_el!("documentsTableBody"),
            docs_prev_btn: get_html!("docsPrevBtn"),
            docs_next_btn: get_html!("docsNextBtn"),
            docs_page_label: get_el!("docsPageLabel"),

            upload_file_input: get_input!("uploadFileInput"),
            upload_name_input: get_input!("uploadNameInput"),
            upload_mode_select: get_select!("uploadModeSelect"),
            upload_btn: get_html!("uploadBtn"),

            tokens_container: get_el!("tokensContainer"),
            refresh_tokens_btn: get_html!("refreshTokensBtn"),

            toast_area: get_el!("toastArea"),
        })
    }
}
