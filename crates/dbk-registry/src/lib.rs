//! The document registry: a hosted Postgres table of pinned documents,
//! plus the read-only aggregations the dashboard renders.

mod error;
#[cfg(feature = "postgres")]
mod postgres;
mod stats;
mod store;

pub use error::RegistryError;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;
pub use stats::{SizeUnit, StorageUsage, storage_rollup};
pub use store::{DocumentStore, NewDocument};

use dbk_api_types::DocumentRecord;
use uuid::Uuid;

/// Storage-usage aggregation for one owner: all sizes de-duplicated by
/// record id, rolled up against the quota.
pub async fn storage_usage(
    store: &dyn DocumentStore,
    owner_address: &str,
    quota_gb: u64,
) -> Result<StorageUsage, RegistryError> {
    let sizes = store.document_sizes(owner_address).await?;
    Ok(storage_rollup(&sizes, quota_gb))
}

/// The owner's most recent documents, newest first.
pub async fn recent_documents(
    store: &dyn DocumentStore,
    owner_address: &str,
    limit: u32,
) -> Result<Vec<DocumentRecord>, RegistryError> {
    store.recent_documents(owner_address, limit).await
}

/// Total number of documents the owner has registered.
pub async fn count_documents(
    store: &dyn DocumentStore,
    owner_address: &str,
) -> Result<u64, RegistryError> {
    store.count_documents(owner_address).await
}

/// Size entry used by the rollup: record id plus the stored size string.
pub type SizeEntry = (Uuid, String);
