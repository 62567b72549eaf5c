use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;

use dbk_api_types::{
    DocumentCountResponse, DocumentListResponse, ErrorResponse, StorageStatsResponse,
    UploadDocumentRequest, UploadDocumentResponse, UploadMode,
};
use dbk_token::{TokenParams, plan_mint};
use dbk_upload::{FileInput, UploadError, UploadOrchestrator};
use dbk_wallet::WalletConnection;

use crate::dto::token_to_dto;
use crate::{ApiResult, AppState, bad_request, epoch_ms, internal_error};

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerQuery {
    pub owner_address: String,
    pub limit: Option<u32>,
}

fn upload_error(err: UploadError) -> (StatusCode, Json<ErrorResponse>) {
    let is_client_error = matches!(
        err,
        UploadError::NotConnected
            | UploadError::NoFile
            | UploadError::NameRequired
            | UploadError::NameTooLong
            | UploadError::NameInvalid
            | UploadError::UnsupportedType(_)
            | UploadError::FileTooLarge
    );
    if is_client_error {
        return bad_request(err);
    }
    if let UploadError::Token(token_err) = &err {
        return crate::tokens::token_error(token_err);
    }
    internal_error(err)
}

pub(crate) async fn upload_document(
    State(state): State<AppState>,
    Json(request): Json<UploadDocumentRequest>,
) -> ApiResult<UploadDocumentResponse> {
    if request.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }

    let bytes = STANDARD
        .decode(request.file_base64.as_bytes())
        .map_err(|_| bad_request("file_base64 must be valid base64"))?;
    let file = FileInput {
        file_name: request.file_name.clone(),
        bytes,
    };

    // The registry paths only need the owner's address; signing stays
    // with the caller's wallet.
    let connection = WalletConnection {
        address: request.owner_address.clone(),
        ..WalletConnection::default()
    };

    let orchestrator = UploadOrchestrator::new(state.pinning.as_ref(), state.store.as_ref());

    match request.mode {
        UploadMode::Upload => {
            let document = orchestrator
                .upload_only(&connection, &file, &request.document_name)
                .await
                .map_err(upload_error)?;
            Ok(Json(UploadDocumentResponse::Stored { document }))
        }
        UploadMode::Mint => {
            let pinned = orchestrator
                .pin_document(&connection, &file, &request.document_name)
                .await
                .map_err(upload_error)?;

            let wallet_utxos = state
                .chain
                .utxos_at(&request.owner_address)
                .await
                .map_err(internal_error)?;
            if wallet_utxos.is_empty() {
                return Err(bad_request("user wallet holds no spendable outputs"));
            }

            let params = TokenParams {
                name: request.document_name.clone(),
                image: pinned.file_url.clone(),
                metadata: Some(pinned.metadata.clone()),
            };
            let prepared = plan_mint(
                &params,
                Some(&pinned.metadata_url),
                &request.owner_address,
                &wallet_utxos,
                &state.script,
                epoch_ms(),
            )
            .map_err(|err| crate::tokens::token_error(&err))?;

            let unsigned = state
                .builder
                .build(&prepared.plan)
                .await
                .map_err(internal_error)?;

            Ok(Json(UploadDocumentResponse::MintPending {
                token: token_to_dto(&prepared.token),
                unsigned_tx: unsigned.tx,
            }))
        }
    }
}

pub(crate) async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<DocumentListResponse> {
    if query.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }
    let limit = query.limit.unwrap_or(6).clamp(1, 100);

    let documents = dbk_registry::recent_documents(state.store.as_ref(), &query.owner_address, limit)
        .await
        .map_err(internal_error)?;

    Ok(Json(DocumentListResponse { documents }))
}

pub(crate) async fn count_documents(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<DocumentCountResponse> {
    if query.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }

    let total = dbk_registry::count_documents(state.store.as_ref(), &query.owner_address)
        .await
        .map_err(internal_error)?;

    Ok(Json(DocumentCountResponse {
        owner_address: query.owner_address,
        total,
    }))
}

pub(crate) async fn storage_stats(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<StorageStatsResponse> {
    if query.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }

    let usage = dbk_registry::storage_usage(
        state.store.as_ref(),
        &query.owner_address,
        state.storage_quota_gb,
    )
    .await
    .map_err(internal_error)?;

    Ok(Json(StorageStatsResponse {
        owner_address: query.owner_address,
        used_size: usage.used_size,
        used_unit: usage.used_unit.to_string(),
        quota_gb: usage.quota_gb,
        percentage: usage.percentage,
        document_count: usage.document_count,
    }))
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use uuid::Uuid;

    use dbk_api_types::{DocumentRecord, DocumentStatus};
    use dbk_chain_client::{
        AssetEntry, ChainError, ChainProvider, SignedTx, TxBuilder, TxPlan, UnsignedTx, Utxo,
    };
    use dbk_pinning::{PinError, PinnedContent, PinningClient};
    use dbk_registry::{DocumentStore, NewDocument, RegistryError, SizeEntry};
    use dbk_token::script::ScriptConfig;

    use crate::AppState;

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub rows: Mutex<Vec<DocumentRecord>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn insert_document(
            &self,
            document: NewDocument,
        ) -> Result<DocumentRecord, RegistryError> {
            let record = DocumentRecord {
                id: Uuid::new_v4(),
                owner_address: document.owner_address,
                document_hash: document.document_hash,
                document_uri: document.document_uri,
                document_name: document.document_name,
                document_type: document.document_type,
                document_size: document.document_size,
                status: document.status,
                created_at: chrono::Utc::now(),
            };
            self.rows.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn recent_documents(
            &self,
            owner_address: &str,
            limit: u32,
        ) -> Result<Vec<DocumentRecord>, RegistryError> {
            let mut rows: Vec<DocumentRecord> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.owner_address == owner_address)
                .cloned()
                .collect();
            rows.sort_by(|l, r| r.created_at.cmp(&l.created_at));
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn count_documents(&self, owner_address: &str) -> Result<u64, RegistryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.owner_address == owner_address)
                .count() as u64)
        }

        async fn document_sizes(
            &self,
            owner_address: &str,
        ) -> Result<Vec<SizeEntry>, RegistryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.owner_address == owner_address)
                .map(|r| (r.id, r.document_size.clone()))
                .collect())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockPinning {
        pub file_pins: AtomicUsize,
        pub json_pins: AtomicUsize,
    }

    #[async_trait]
    impl PinningClient for MockPinning {
        async fn pin_file(
            &self,
            _file_name: &str,
            _bytes: Vec<u8>,
        ) -> Result<PinnedContent, PinError> {
            self.file_pins.fetch_add(1, Ordering::SeqCst);
            Ok(PinnedContent {
                content_id: "QmFile".to_owned(),
            })
        }

        async fn pin_json(&self, _value: &serde_json::Value) -> Result<PinnedContent, PinError> {
            self.json_pins.fetch_add(1, Ordering::SeqCst);
            Ok(PinnedContent {
                content_id: "QmMeta".to_owned(),
            })
        }

        fn gateway_url(&self, content_id: &str) -> String {
            format!("https://gw.example/ipfs/{content_id}")
        }
    }

    #[derive(Default)]
    pub(crate) struct MockChain {
        pub utxos: Vec<Utxo>,
        pub script_utxos: Vec<Utxo>,
        pub assets: Vec<AssetEntry>,
    }

    #[async_trait]
    impl ChainProvider for MockChain {
        async fn utxos_at(&self, address: &str) -> Result<Vec<Utxo>, ChainError> {
            if address == script().address {
                Ok(self.script_utxos.clone())
            } else {
                Ok(self.utxos.clone())
            }
        }

        async fn utxos_at_with_unit(
            &self,
            _address: &str,
            unit: &str,
        ) -> Result<Vec<Utxo>, ChainError> {
            Ok(self
                .utxos
                .iter()
                .filter(|u| u.assets.contains_key(unit))
                .cloned()
                .collect())
        }

        async fn address_assets(
            &self,
            _address: &str,
            _policy_id: &str,
        ) -> Result<Vec<AssetEntry>, ChainError> {
            Ok(self.assets.clone())
        }

        async fn submit_tx(&self, _signed_tx: &str) -> Result<String, ChainError> {
            Ok("fe".repeat(32))
        }
    }

    #[derive(Default)]
    pub(crate) struct MockBuilder;

    #[async_trait]
    impl TxBuilder for MockBuilder {
        async fn build(&self, _plan: &TxPlan) -> Result<UnsignedTx, ChainError> {
            Ok(UnsignedTx {
                tx: "unsigned-tx".to_owned(),
            })
        }

        async fn assemble(
            &self,
            unsigned: &UnsignedTx,
            witness: &str,
        ) -> Result<SignedTx, ChainError> {
            Ok(SignedTx {
                tx: format!("{}+{}", unsigned.tx, witness),
            })
        }
    }

    pub(crate) fn script() -> ScriptConfig {
        ScriptConfig {
            address: "addr_test1script".to_owned(),
            policy_id: "ab".repeat(28),
            script: "5901ab".to_owned(),
        }
    }

    pub(crate) fn wallet_utxo() -> Utxo {
        Utxo {
            tx_hash: "11".repeat(32),
            output_index: 0,
            address: "addr_test1owner".to_owned(),
            assets: BTreeMap::from([("lovelace".to_owned(), 5_000_000)]),
            datum: None,
        }
    }

    pub(crate) fn mock_state() -> AppState {
        state_with(MockChain {
            utxos: vec![wallet_utxo()],
            ..MockChain::default()
        })
    }

    pub(crate) fn state_with(chain: MockChain) -> AppState {
        AppState {
            store: Arc::new(MemoryStore::default()),
            pinning: Arc::new(MockPinning::default()),
            chain: Arc::new(chain),
            builder: Arc::new(MockBuilder),
            script: script(),
            storage_quota_gb: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::*;
    use crate::router;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use tower::ServiceExt;

    fn upload_body(file_name: &str, document_name: &str, mode: &str) -> String {
        serde_json::json!({
            "owner_address": "addr_test1owner",
            "document_name": document_name,
            "file_name": file_name,
            "file_base64": STANDARD.encode(vec![0u8; 64]),
            "mode": mode,
        })
        .to_string()
    }

    async fn post_json(state: crate::AppState, path: &str, body: String) -> (StatusCode, serde_json::Value) {
        let app = router(state);
        let response = app
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn upload_rejects_disallowed_extension() {
        let (status, body) = post_json(
            mock_state(),
            "/documents/upload",
            upload_body("malware.exe", "Report_2024", "upload"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("unsupported"));
    }

    #[tokio::test]
    async fn upload_only_stores_a_not_minted_record() {
        let (status, body) = post_json(
            mock_state(),
            "/documents/upload",
            upload_body("report.pdf", "Report_2024", "upload"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "stored");
        assert_eq!(body["document"]["status"], "NOT MINTED");
        assert_eq!(body["document"]["document_type"], "pdf");
        assert_eq!(
            body["document"]["document_uri"],
            "https://gw.example/ipfs/QmMeta"
        );
        assert_eq!(body["document"]["document_hash"], "QmFile");
    }

    #[tokio::test]
    async fn mint_mode_returns_a_prepared_transaction() {
        let (status, body) = post_json(
            mock_state(),
            "/documents/upload",
            upload_body("report.pdf", "Report_2024", "mint"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "mint_pending");
        assert_eq!(body["unsigned_tx"], "unsigned-tx");
        assert_eq!(body["token"]["name"], "Report_2024");
        assert_eq!(body["token"]["utxo"]["address"], "addr_test1script");
    }

    #[tokio::test]
    async fn mint_mode_with_empty_wallet_is_a_client_error() {
        let state = state_with(MockChain::default());
        let (status, body) = post_json(
            state,
            "/documents/upload",
            upload_body("report.pdf", "Report_2024", "mint"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("spendable"));
    }

    #[tokio::test]
    async fn list_count_and_stats_reflect_uploads() {
        let state = mock_state();

        let (status, _) = post_json(
            state.clone(),
            "/documents/upload",
            upload_body("report.pdf", "Report_2024", "upload"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::get("/documents?owner_address=addr_test1owner")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["documents"].as_array().unwrap().len(), 1);

        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::get("/documents/count?owner_address=addr_test1owner")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total"], 1);

        let app = router(state);
        let response = app
            .oneshot(
                Request::get("/stats/storage?owner_address=addr_test1owner")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["document_count"], 1);
        assert_eq!(body["used_unit"], "bytes");
        assert_eq!(body["used_size"], 64.0);
    }

    #[tokio::test]
    async fn stats_for_unknown_owner_are_zero() {
        let app = router(mock_state());
        let response = app
            .oneshot(
                Request::get("/stats/storage?owner_address=addr_test1nobody")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["percentage"], 0.0);
        assert_eq!(body["used_size"], 0.0);
        assert_eq!(body["document_count"], 0);
    }
}
