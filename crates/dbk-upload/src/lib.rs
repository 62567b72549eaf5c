//! Upload orchestration: validate locally, pin the file, pin its metadata
//! object, then either register the document or hand off to the mint.
//!
//! Partial failures leave pinned content behind on purpose: a pin that
//! succeeded before a later store/mint failure is logged and accepted as a
//! permanent artifact. No compensation, no retry.

mod error;
mod validate;

pub use error::UploadError;
pub use validate::{
    ALLOWED_EXTENSIONS, FileInput, MAX_FILE_BYTES, MAX_NAME_LEN, validate_document_name,
    validate_file,
};

use tracing::warn;

use dbk_api_types::{DocumentRecord, DocumentStatus};
use dbk_chain_client::TxBuilder;
use dbk_pinning::PinningClient;
use dbk_registry::{DocumentStore, NewDocument};
use dbk_token::script::ScriptConfig;
use dbk_token::{Token, TokenParams};
use dbk_wallet::WalletConnection;

/// Everything the mint handoff needs beyond the connection.
pub struct MintContext<'a> {
    pub builder: &'a dyn TxBuilder,
    pub script: &'a ScriptConfig,
}

/// The artifacts of a successful double pin.
#[derive(Debug, Clone)]
pub struct PinnedDocument {
    pub file_content_id: String,
    pub file_url: String,
    pub metadata_content_id: String,
    pub metadata_url: String,
    pub metadata: serde_json::Value,
    pub file_type: String,
    pub file_size: u64,
}

pub struct UploadOrchestrator<'a> {
    pinning: &'a dyn PinningClient,
    store: &'a dyn DocumentStore,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(pinning: &'a dyn PinningClient, store: &'a dyn DocumentStore) -> Self {
        Self { pinning, store }
    }

    fn precheck(
        &self,
        connection: &WalletConnection,
        file: &FileInput,
        document_name: &str,
    ) -> Result<String, UploadError> {
        if !connection.is_connected() {
            return Err(UploadError::NotConnected);
        }
        let extension = validate_file(file)?;
        validate_document_name(document_name)?;
        Ok(extension)
    }

    /// Validate, then pin the file bytes and the derived metadata object.
    pub async fn pin_document(
        &self,
        connection: &WalletConnection,
        file: &FileInput,
        document_name: &str,
    ) -> Result<PinnedDocument, UploadError> {
        let extension = self.precheck(connection, file, document_name)?;
        let file_size = file.bytes.len() as u64;

        let pinned_file = self
            .pinning
            .pin_file(&file.file_name, file.bytes.clone())
            .await?;
        let file_url = self.pinning.gateway_url(&pinned_file.content_id);

        let metadata = serde_json::json!({
            "description": "Document uploaded via DocBank",
            "properties": {
                "type": extension,
                "size": file_size.to_string(),
                "hash": pinned_file.content_id,
            }
        });

        let pinned_metadata = match self.pinning.pin_json(&metadata).await {
            Ok(pinned) => pinned,
            Err(err) => {
                warn!(
                    content_id = %pinned_file.content_id,
                    "metadata pin failed; file pin left orphaned"
                );
                return Err(err.into());
            }
        };
        let metadata_url = self.pinning.gateway_url(&pinned_metadata.content_id);

        Ok(PinnedDocument {
            file_content_id: pinned_file.content_id,
            file_url,
            metadata_content_id: pinned_metadata.content_id,
            metadata_url,
            metadata,
            file_type: extension,
            file_size,
        })
    }

    /// Upload-only mode: pin, then write a "NOT MINTED" registry row.
    pub async fn upload_only(
        &self,
        connection: &WalletConnection,
        file: &FileInput,
        document_name: &str,
    ) -> Result<DocumentRecord, UploadError> {
        let pinned = self.pin_document(connection, file, document_name).await?;

        let record = self
            .store
            .insert_document(NewDocument {
                owner_address: connection.address.clone(),
                document_hash: pinned.file_content_id.clone(),
                document_uri: pinned.metadata_url.clone(),
                document_name: document_name.to_owned(),
                document_type: pinned.file_type.clone(),
                document_size: pinned.file_size.to_string(),
                status: DocumentStatus::NotMinted,
            })
            .await;

        match record {
            Ok(record) => Ok(record),
            Err(err) => {
                warn!(
                    content_id = %pinned.file_content_id,
                    "registry write failed; pinned content left orphaned"
                );
                Err(err.into())
            }
        }
    }

    /// Mint mode: pin, then mint a token whose image is the pinned file
    /// and whose extra datum field points at the pinned metadata object.
    pub async fn upload_and_mint(
        &self,
        connection: &WalletConnection,
        file: &FileInput,
        document_name: &str,
        mint: &MintContext<'_>,
    ) -> Result<Token, UploadError> {
        let pinned = self.pin_document(connection, file, document_name).await?;

        let params = TokenParams {
            name: document_name.to_owned(),
            image: pinned.file_url.clone(),
            metadata: Some(pinned.metadata.clone()),
        };

        let minted = dbk_token::mint(
            &params,
            Some(&pinned.metadata_url),
            connection,
            mint.builder,
            mint.script,
        )
        .await;

        match minted {
            Ok(token) => Ok(token),
            Err(err) => {
                warn!(
                    content_id = %pinned.file_content_id,
                    "mint failed; pinned content left orphaned"
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use dbk_chain_client::{
        AssetEntry, ChainError, ChainProvider, SignedTx, TxPlan, UnsignedTx, Utxo, WalletSession,
    };
    use dbk_pinning::{PinError, PinnedContent};
    use dbk_registry::{RegistryError, SizeEntry};
    use dbk_token::script::REF_LABEL;

    struct CountingPinning {
        file_pins: AtomicUsize,
        json_pins: AtomicUsize,
        fail_json: bool,
    }

    impl CountingPinning {
        fn new() -> Self {
            Self {
                file_pins: AtomicUsize::new(0),
                json_pins: AtomicUsize::new(0),
                fail_json: false,
            }
        }
    }

    #[async_trait]
    impl PinningClient for CountingPinning {
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
            if self.fail_json {
                return Err(PinError::Service {
                    status: 500,
                    message: "boom".to_owned(),
                });
            }
            Ok(PinnedContent {
                content_id: "QmMeta".to_owned(),
            })
        }

        fn gateway_url(&self, content_id: &str) -> String {
            format!("https://gw.example/ipfs/{content_id}")
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<DocumentRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn insert_document(
            &self,
            document: NewDocument,
        ) -> Result<DocumentRecord, RegistryError> {
            if self.fail {
                return Err(RegistryError::Query("insert failed".to_owned()));
            }
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
            _owner_address: &str,
            _limit: u32,
        ) -> Result<Vec<DocumentRecord>, RegistryError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn count_documents(&self, _owner_address: &str) -> Result<u64, RegistryError> {
            Ok(self.rows.lock().unwrap().len() as u64)
        }

        async fn document_sizes(
            &self,
            _owner_address: &str,
        ) -> Result<Vec<SizeEntry>, RegistryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .map(|r| (r.id, r.document_size.clone()))
                .collect())
        }
    }

    struct NullChain;

    #[async_trait]
    impl ChainProvider for NullChain {
        async fn utxos_at(&self, _address: &str) -> Result<Vec<Utxo>, ChainError> {
            Ok(Vec::new())
        }

        async fn utxos_at_with_unit(
            &self,
            _address: &str,
            _unit: &str,
        ) -> Result<Vec<Utxo>, ChainError> {
            Ok(Vec::new())
        }

        async fn address_assets(
            &self,
            _address: &str,
            _policy_id: &str,
        ) -> Result<Vec<AssetEntry>, ChainError> {
            Ok(Vec::new())
        }

        async fn submit_tx(&self, _signed_tx: &str) -> Result<String, ChainError> {
            Ok("fe".repeat(32))
        }
    }

    struct OneUtxoSession;

    #[async_trait]
    impl WalletSession for OneUtxoSession {
        async fn address(&self) -> Result<String, ChainError> {
            Ok("addr_test1wallet".to_owned())
        }

        async fn reward_address(&self) -> Result<Option<String>, ChainError> {
            Ok(None)
        }

        async fn utxos(&self) -> Result<Vec<Utxo>, ChainError> {
            Ok(vec![Utxo {
                tx_hash: "11".repeat(32),
                output_index: 0,
                address: "addr_test1wallet".to_owned(),
                assets: BTreeMap::from([("lovelace".to_owned(), 5_000_000)]),
                datum: None,
            }])
        }

        async fn sign_tx(&self, unsigned: &UnsignedTx) -> Result<SignedTx, ChainError> {
            Ok(SignedTx {
                tx: unsigned.tx.clone(),
            })
        }
    }

    struct RecordingBuilder {
        last_plan: Mutex<Option<TxPlan>>,
    }

    #[async_trait]
    impl dbk_chain_client::TxBuilder for RecordingBuilder {
        async fn build(&self, plan: &TxPlan) -> Result<UnsignedTx, ChainError> {
            *self.last_plan.lock().unwrap() = Some(plan.clone());
            Ok(UnsignedTx {
                tx: "unsigned".to_owned(),
            })
        }

        async fn assemble(
            &self,
            _unsigned: &UnsignedTx,
            _witness: &str,
        ) -> Result<SignedTx, ChainError> {
            Ok(SignedTx {
                tx: "signed".to_owned(),
            })
        }
    }

    fn connected() -> WalletConnection {
        WalletConnection {
            chain: Some(Arc::new(NullChain)),
            session: Some(Arc::new(OneUtxoSession)),
            wallet: None,
            address: "addr_test1wallet".to_owned(),
            payment_key_hash: "aa".repeat(28),
            stake_address: String::new(),
            stake_key_hash: String::new(),
        }
    }

    fn script() -> ScriptConfig {
        ScriptConfig {
            address: "addr_test1script".to_owned(),
            policy_id: "ab".repeat(28),
            script: "5901ab".to_owned(),
        }
    }

    fn pdf(len: usize) -> FileInput {
        FileInput {
            file_name: "report.pdf".to_owned(),
            bytes: vec![0u8; len],
        }
    }

    #[tokio::test]
    async fn invalid_inputs_never_reach_the_pinning_service() {
        let pinning = CountingPinning::new();
        let store = MemoryStore::default();
        let orchestrator = UploadOrchestrator::new(&pinning, &store);
        let connection = connected();

        let long_name = "x".repeat(29);
        let cases: Vec<(FileInput, &str)> = vec![
            (
                FileInput {
                    file_name: "malware.exe".to_owned(),
                    bytes: vec![0; 10],
                },
                "Report_2024",
            ),
            (pdf(10 * 1024 * 1024 + 1), "Report_2024"),
            (pdf(10), ""),
            (pdf(10), "bad/name!"),
            (pdf(10), long_name.as_str()),
        ];

        for (file, name) in &cases {
            assert!(orchestrator
                .upload_only(&connection, file, name)
                .await
                .is_err());
        }

        // Disconnected wallet fails before anything else.
        let disconnected = WalletConnection::default();
        assert!(matches!(
            orchestrator
                .upload_only(&disconnected, &pdf(10), "Report_2024")
                .await,
            Err(UploadError::NotConnected)
        ));

        assert_eq!(pinning.file_pins.load(Ordering::SeqCst), 0);
        assert_eq!(pinning.json_pins.load(Ordering::SeqCst), 0);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_only_writes_a_not_minted_record() {
        let pinning = CountingPinning::new();
        let store = MemoryStore::default();
        let orchestrator = UploadOrchestrator::new(&pinning, &store);
        let connection = connected();

        let record = orchestrator
            .upload_only(&connection, &pdf(2 * 1024 * 1024), "Report_2024")
            .await
            .unwrap();

        assert_eq!(record.status, DocumentStatus::NotMinted);
        assert_eq!(record.document_type, "pdf");
        assert_eq!(record.document_name, "Report_2024");
        assert_eq!(record.document_hash, "QmFile");
        assert_eq!(record.document_uri, "https://gw.example/ipfs/QmMeta");
        assert_eq!(record.document_size, (2 * 1024 * 1024).to_string());
        assert_eq!(record.owner_address, "addr_test1wallet");

        assert_eq!(pinning.file_pins.load(Ordering::SeqCst), 1);
        assert_eq!(pinning.json_pins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mint_mode_produces_a_token_paid_to_the_script() {
        let pinning = CountingPinning::new();
        let store = MemoryStore::default();
        let orchestrator = UploadOrchestrator::new(&pinning, &store);
        let connection = connected();
        let builder = RecordingBuilder {
            last_plan: Mutex::new(None),
        };
        let cfg = script();
        let mint = MintContext {
            builder: &builder,
            script: &cfg,
        };

        let token = orchestrator
            .upload_and_mint(&connection, &pdf(2 * 1024 * 1024), "Report_2024", &mint)
            .await
            .unwrap();

        assert_eq!(token.name, "Report_2024");
        assert_eq!(token.image, "https://gw.example/ipfs/QmFile");
        assert_eq!(
            token.metadata.get("metadata_url").and_then(|v| v.as_str()),
            Some("https://gw.example/ipfs/QmMeta")
        );

        let plan = builder.last_plan.lock().unwrap().clone().unwrap();
        let ref_output = &plan.outputs[0];
        assert_eq!(ref_output.address, cfg.address);
        assert!(ref_output.assets.keys().next().unwrap().contains(REF_LABEL));

        // Mint mode writes no registry row.
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_failure_leaves_the_pin_orphaned() {
        let pinning = CountingPinning::new();
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let orchestrator = UploadOrchestrator::new(&pinning, &store);
        let connection = connected();

        let err = orchestrator
            .upload_only(&connection, &pdf(10), "Report_2024")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Registry(_)));

        // Both pins happened and are not compensated.
        assert_eq!(pinning.file_pins.load(Ordering::SeqCst), 1);
        assert_eq!(pinning.json_pins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn metadata_pin_failure_surfaces_after_the_file_pin() {
        let pinning = CountingPinning {
            fail_json: true,
            ..CountingPinning::new()
        };
        let store = MemoryStore::default();
        let orchestrator = UploadOrchestrator::new(&pinning, &store);
        let connection = connected();

        let err = orchestrator
            .upload_only(&connection, &pdf(10), "Report_2024")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Pin(_)));
        assert_eq!(pinning.file_pins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mint_mode_name_with_space_fails_after_pinning() {
        // Upload names may contain spaces, token names may not: the
        // mismatch surfaces at the mint step, after the pins.
        let pinning = CountingPinning::new();
        let store = MemoryStore::default();
        let orchestrator = UploadOrchestrator::new(&pinning, &store);
        let connection = connected();
        let builder = RecordingBuilder {
            last_plan: Mutex::new(None),
        };
        let cfg = script();
        let mint = MintContext {
            builder: &builder,
            script: &cfg,
        };

        let err = orchestrator
            .upload_and_mint(&connection, &pdf(10), "Quarterly Report", &mint)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Token(_)));
        assert_eq!(pinning.file_pins.load(Ordering::SeqCst), 1);
    }
}
