//! Document table, pagination, and the dashboard stat tiles.

use wasm_bindgen_futures::spawn_local;

use dbk_api_types::{DocumentRecord, DocumentStatus};

use crate::api;
use crate::dom::{self, Elements};
use crate::state;

pub const PAGE_SIZE: usize = 6;
const FETCH_LIMIT: u32 = 100;

/// Kick off the dashboard reads. Count and storage stats are independent
/// requests, each owning its own loading state; every request carries the
/// current fetch generation so stale completions are dropped.
pub fn refresh(els: &Elements) {
    let generation = state::bump_docs_generation();

    let e = els.clone();
    spawn_local(async move { load_documents(&e, generation).await });
    let e = els.clone();
    spawn_local(async move { load_count(&e, generation).await });
    let e = els.clone();
    spawn_local(async move { load_storage(&e, generation).await });
}

async fn load_documents(els: &Elements, generation: u64) {
    let connection = state::connection();
    if !connection.is_connected() {
        return;
    }
    dom::set_inner_html(
        &els.documents_table_body,
        r#"<tr><td colspan="5" class="table-loading">Loading documents…</td></tr>"#,
    );

    let path = format!(
        "/documents?owner_address={}&limit={}",
        js_sys::encode_uri_component(&connection.address),
        FETCH_LIMIT
    );
    match api::request(&path, "GET", None).await {
        Ok(result) => {
            let documents = result
                .get("documents")
                .cloned()
                .and_then(|value| serde_json::from_value::<Vec<DocumentRecord>>(value).ok())
                .unwrap_or_default();
            if !state::docs_generation_is_current(generation) {
                return;
            }
            state::set_documents(documents);
            state::set_page(0);
            render_documents(els);
        }
        Err(err) => {
            if !state::docs_generation_is_current(generation) {
                return;
            }
            api::toast_error(els, &format!("failed to load documents: {err}"));
            state::set_documents(Vec::new());
            render_documents(els);
        }
    }
}

async fn load_count(els: &Elements, generation: u64) {
    let connection = state::connection();
    if !connection.is_connected() {
        return;
    }
    dom::set_text(&els.stat_documents_total, "\u{2026}");

    let path = format!(
        "/documents/count?owner_address={}",
        js_sys::encode_uri_component(&connection.address)
    );
    match api::request(&path, "GET", None).await {
        Ok(result) => {
            if !state::docs_generation_is_current(generation) {
                return;
            }
            let total = result.get("total").and_then(|v| v.as_u64()).unwrap_or(0);
            dom::set_text(&els.stat_documents_total, &total.to_string());
        }
        Err(_) => {
            if state::docs_generation_is_current(generation) {
                dom::set_text(&els.stat_documents_total, "\u{2014}");
            }
        }
    }
}

async fn load_storage(els: &Elements, generation: u64) {
    let connection = state::connection();
    if !connection.is_connected() {
        return;
    }
    dom::set_text(&els.stat_storage_text, "Loading\u{2026}");

    let path = format!(
        "/stats/storage?owner_address={}",
        js_sys::encode_uri_component(&connection.address)
    );
    match api::request(&path, "GET", None).await {
        Ok(result) => {
            if !state::docs_generation_is_current(generation) {
                return;
            }
            let used_size = result.get("used_size").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let used_unit = result
                .get("used_unit")
                .and_then(|v| v.as_str())
                .unwrap_or("bytes");
            let quota_gb = result.get("quota_gb").and_then(|v| v.as_u64()).unwrap_or(0);
            let percentage = result
                .get("percentage")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            let count = result
                .get("document_count")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);

            dom::set_text(
                &els.stat_storage_text,
                &format!("{used_size} {used_unit} of {quota_gb} GB"),
            );
            dom::set_text(&els.stat_storage_count, &format!("Documents: {count}"));
            let _ = els
                .stat_storage_bar
                .style()
                .set_property("width", &format!("{}%", percentage.max(0.5)));
        }
        Err(_) => {
            if state::docs_generation_is_current(generation) {
                dom::set_text(&els.stat_storage_text, "\u{2014}");
            }
        }
    }
}

fn format_size_mb(size: &str) -> String {
    match size.parse::<f64>() {
        Ok(bytes) => format!("{:.1}MB", bytes / (1024.0 * 1024.0)),
        Err(_) => "Unknown".to_owned(),
    }
}

fn format_date(record: &DocumentRecord) -> String {
    record.created_at.format("%b %e, %Y, %H:%M").to_string()
}

fn status_badge(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Minted => r#"<span class="badge badge--minted">Minted</span>"#,
        DocumentStatus::NotMinted => r#"<span class="badge badge--plain">Not Minted</span>"#,
    }
}

/// Render the current page of the document table.
pub fn render_documents(els: &Elements) {
    let documents = state::documents();
    let body = &els.documents_table_body;

    if documents.is_empty() {
        dom::set_inner_html(
            body,
            r#"<tr><td colspan="5" class="table-empty">No documents yet</td></tr>"#,
        );
        dom::set_text(&els.docs_page_label, "");
        return;
    }

    let pages = documents.len().div_ceil(PAGE_SIZE).max(1);
    let page = state::page().min(pages - 1);

    let mut html = String::new();
    for record in documents.iter().skip(page * PAGE_SIZE).take(PAGE_SIZE) {
        html.push_str(&format!(
            r#"<tr>
                <td class="doc-name" title="{}">{}</td>
                <td>{}</td>
                <td>{}</td>
                <td>{}</td>
                <td>{}</td>
            </tr>"#,
            record.document_uri,
            record.document_name,
            format_date(record),
            record.document_type.to_uppercase(),
            format_size_mb(&record.document_size),
            status_badge(record.status),
        ));
    }
    dom::set_inner_html(body, &html);
    dom::set_text(
        &els.docs_page_label,
        &format!("Page {} of {}", page + 1, pages),
    );
}

pub fn next_page(els: &Elements) {
    let documents = state::documents();
    let pages = documents.len().div_ceil(PAGE_SIZE).max(1);
    let page = state::page();
    if page + 1 < pages {
        state::set_page(page + 1);
        render_documents(els);
    }
}

pub fn prev_page(els: &Elements) {
    let page = state::page();
    if page > 0 {
        state::set_page(page - 1);
        render_documents(els);
    }
}
