//! Upload dialog: file selection, client-side pre-validation, and the
//! upload/mint round trip.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use wasm_bindgen_futures::JsFuture;

use dbk_upload::{FileInput, validate_document_name, validate_file};

use crate::api;
use crate::cip30;
use crate::documents_view;
use crate::dom::{self, Elements};
use crate::state;
use crate::tokens_view;

async fn read_file(file: &web_sys::File) -> Result<FileInput, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("could not read file: {:?}", e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(FileInput {
        file_name: file.name(),
        bytes,
    })
}

/// Sign a prepared transaction with the connected wallet and hand the
/// witness back to the backend for assembly and submission.
pub async fn sign_and_submit(unsigned_tx: &str) -> Result<String, String> {
    let wallet_api = state::wallet_api().ok_or_else(|| "wallet session lost".to_owned())?;
    let witness = cip30::sign_tx(&wallet_api, unsigned_tx).await?;

    let body = serde_json::json!({ "tx": unsigned_tx, "witness": witness });
    let result = api::request("/chain/submit", "POST", Some(body.to_string())).await?;
    result
        .get("tx_hash")
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| "submit response carried no tx hash".to_owned())
}

pub async fn on_upload(els: &Elements) {
    let connection = state::connection();
    if !connection.is_connected() {
        api::toast_error(els, "Connect your wallet first");
        return;
    }

    let Some(file) = els.upload_file_input.files().and_then(|list| list.item(0)) else {
        api::toast_error(els, "Select a document to proceed");
        return;
    };
    let document_name = dom::get_input_value(&els.upload_name_input);
    let mode = dom::get_select_value(&els.upload_mode_select);

    let input = match read_file(&file).await {
        Ok(input) => input,
        Err(err) => {
            api::toast_error(els, &err);
            return;
        }
    };

    // Same rules the backend enforces; catching them here costs no
    // network round trip.
    if let Err(err) = validate_file(&input) {
        api::toast_error(els, &err.to_string());
        return;
    }
    if let Err(err) = validate_document_name(&document_name) {
        api::toast_error(els, &err.to_string());
        return;
    }

    api::toast_ok(els, &format!("Uploading {document_name}…"));

    let body = serde_json::json!({
        "owner_address": connection.address,
        "document_name": document_name,
        "file_name": input.file_name,
        "file_base64": STANDARD.encode(&input.bytes),
        "mode": mode,
    });

    let result = match api::request("/documents/upload", "POST", Some(body.to_string())).await {
        Ok(result) => result,
        Err(err) => {
            api::toast_error(els, &err);
            return;
        }
    };

    match result.get("kind").and_then(|k| k.as_str()) {
        Some("stored") => {
            api::toast_ok(els, &format!("Document stored: {document_name}"));
            documents_view::refresh(els);
        }
        Some("mint_pending") => {
            let Some(unsigned_tx) = result.get("unsigned_tx").and_then(|v| v.as_str()) else {
                api::toast_error(els, "prepare response carried no transaction");
                return;
            };
            match sign_and_submit(unsigned_tx).await {
                Ok(tx_hash) => {
                    api::toast_ok(els, &format!("Mint Token TxHash: {tx_hash}"));
                    documents_view::refresh(els);
                    tokens_view::refresh(els);
                }
                Err(err) => api::toast_error(els, &err),
            }
        }
        _ => api::toast_error(els, "unexpected upload response"),
    }

    els.upload_file_input.set_value("");
    els.upload_name_input.set_value("");
}
