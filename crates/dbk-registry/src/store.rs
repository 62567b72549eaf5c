use async_trait::async_trait;

use dbk_api_types::{DocumentRecord, DocumentStatus};

use crate::error::RegistryError;
use crate::SizeEntry;

/// A document row as handed to the store; id and created_at are assigned
/// on insert. Rows are never mutated in place.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_address: String,
    pub document_hash: String,
    pub document_uri: String,
    pub document_name: String,
    pub document_type: String,
    /// Size in bytes, stored as a string.
    pub document_size: String,
    pub status: DocumentStatus,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: NewDocument)
    -> Result<DocumentRecord, RegistryError>;

    /// Most recent documents for the owner, ordered by creation time
    /// descending.
    async fn recent_documents(
        &self,
        owner_address: &str,
        limit: u32,
    ) -> Result<Vec<DocumentRecord>, RegistryError>;

    async fn count_documents(&self, owner_address: &str) -> Result<u64, RegistryError>;

    /// (id, size) pairs for the owner's documents, feeding the rollup.
    async fn document_sizes(&self, owner_address: &str) -> Result<Vec<SizeEntry>, RegistryError>;
}
