use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::{Client, NoTls};
use tracing::warn;
use uuid::Uuid;

use dbk_api_types::{DocumentRecord, DocumentStatus};

use crate::error::RegistryError;
use crate::store::{DocumentStore, NewDocument};
use crate::SizeEntry;

pub struct PostgresDocumentStore {
    client: Client,
}

fn status_from_str(value: &str) -> DocumentStatus {
    if value == "MINTED" {
        DocumentStatus::Minted
    } else {
        DocumentStatus::NotMinted
    }
}

impl PostgresDocumentStore {
    pub async fn connect(database_url: &str) -> Result<Self, RegistryError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|err| RegistryError::Connect(err.to_string()))?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                warn!("postgres connection error: {}", err);
            }
        });

        Ok(Self { client })
    }

    pub async fn run_migrations_from_dir(
        &self,
        migrations_dir: &str,
    ) -> Result<usize, RegistryError> {
        let mut files: Vec<PathBuf> = fs::read_dir(migrations_dir)
            .map_err(|err| {
                RegistryError::Migration(format!(
                    "failed to read migrations directory {migrations_dir}: {err}"
                ))
            })?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|value| value.to_str()) == Some("sql"))
            .collect();

        files.sort();

        for file_path in &files {
            let sql = fs::read_to_string(file_path).map_err(|err| {
                RegistryError::Migration(format!(
                    "failed to read migration file {}: {err}",
                    file_path.display()
                ))
            })?;
            self.client.batch_execute(&sql).await.map_err(|err| {
                RegistryError::Migration(format!(
                    "failed to execute migration file {}: {err}",
                    file_path.display()
                ))
            })?;
        }

        Ok(files.len())
    }

    fn record_from_row(row: &tokio_postgres::Row) -> DocumentRecord {
        DocumentRecord {
            id: row.get::<_, Uuid>(0),
            owner_address: row.get::<_, String>(1),
            document_hash: row.get::<_, String>(2),
            document_uri: row.get::<_, String>(3),
            document_name: row.get::<_, String>(4),
            document_type: row.get::<_, String>(5),
            document_size: row.get::<_, String>(6),
            status: status_from_str(&row.get::<_, String>(7)),
            created_at: row.get::<_, DateTime<Utc>>(8),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert_document(
        &self,
        document: NewDocument,
    ) -> Result<DocumentRecord, RegistryError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        self.client
            .execute(
                "INSERT INTO documents
                 (id, owner_address, document_hash, document_uri, document_name,
                  document_type, document_size, status, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                &[
                    &id,
                    &document.owner_address,
                    &document.document_hash,
                    &document.document_uri,
                    &document.document_name,
                    &document.document_type,
                    &document.document_size,
                    &document.status.to_string(),
                    &created_at,
                ],
            )
            .await?;

        Ok(DocumentRecord {
            id,
            owner_address: document.owner_address,
            document_hash: document.document_hash,
            document_uri: document.document_uri,
            document_name: document.document_name,
            document_type: document.document_type,
            document_size: document.document_size,
            status: document.status,
            created_at,
        })
    }

    async fn recent_documents(
        &self,
        owner_address: &str,
        limit: u32,
    ) -> Result<Vec<DocumentRecord>, RegistryError> {
        let rows = self
            .client
            .query(
                "SELECT id, owner_address, document_hash, document_uri, document_name,
                        document_type, document_size, status, created_at
                 FROM documents
                 WHERE owner_address = $1
                 ORDER BY created_at DESC
                 LIMIT $2",
                &[&owner_address, &i64::from(limit)],
            )
            .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    async fn count_documents(&self, owner_address: &str) -> Result<u64, RegistryError> {
        let row = self
            .client
            .query_one(
                "SELECT COUNT(*) FROM documents WHERE owner_address = $1",
                &[&owner_address],
            )
            .await?;

        Ok(row.get::<_, i64>(0).max(0) as u64)
    }

    async fn document_sizes(&self, owner_address: &str) -> Result<Vec<SizeEntry>, RegistryError> {
        let rows = self
            .client
            .query(
                "SELECT id, document_size FROM documents WHERE owner_address = $1",
                &[&owner_address],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<_, Uuid>(0), row.get::<_, String>(1)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn migrations_dir() -> String {
        if let Ok(path) = env::var("TEST_MIGRATIONS_DIR") {
            return path;
        }

        let candidates = ["./migrations/postgres", "../../migrations/postgres"];
        for path in candidates {
            if std::path::Path::new(path).exists() {
                return path.to_owned();
            }
        }

        "./migrations/postgres".to_owned()
    }

    async fn setup_store() -> Result<Option<PostgresDocumentStore>, RegistryError> {
        let database_url = match env::var("TEST_DATABASE_URL") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Ok(None),
        };

        let store = PostgresDocumentStore::connect(&database_url).await?;
        store.run_migrations_from_dir(&migrations_dir()).await?;
        Ok(Some(store))
    }

    fn new_document(owner: &str) -> NewDocument {
        NewDocument {
            owner_address: owner.to_owned(),
            document_hash: "QmFile".to_owned(),
            document_uri: "https://gw/ipfs/QmMeta".to_owned(),
            document_name: "Report_2024".to_owned(),
            document_type: "pdf".to_owned(),
            document_size: "2097152".to_owned(),
            status: DocumentStatus::NotMinted,
        }
    }

    #[tokio::test]
    async fn postgres_insert_and_recent_roundtrip() -> Result<(), RegistryError> {
        let Some(store) = setup_store().await? else {
            return Ok(());
        };

        let owner = format!("addr_test-{}", Uuid::new_v4());
        let inserted = store.insert_document(new_document(&owner)).await?;
        assert_eq!(inserted.status, DocumentStatus::NotMinted);

        let recent = store.recent_documents(&owner, 6).await?;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, inserted.id);
        assert_eq!(recent[0].document_type, "pdf");

        assert_eq!(store.count_documents(&owner).await?, 1);

        let sizes = store.document_sizes(&owner).await?;
        assert_eq!(sizes, vec![(inserted.id, "2097152".to_owned())]);

        Ok(())
    }

    #[tokio::test]
    async fn postgres_recent_orders_newest_first() -> Result<(), RegistryError> {
        let Some(store) = setup_store().await? else {
            return Ok(());
        };

        let owner = format!("addr_test-{}", Uuid::new_v4());
        let first = store.insert_document(new_document(&owner)).await?;
        let second = store.insert_document(new_document(&owner)).await?;

        let recent = store.recent_documents(&owner, 6).await?;
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at >= recent[1].created_at);
        assert_eq!(recent[0].id, second.id);
        assert_eq!(recent[1].id, first.id);

        Ok(())
    }
}
