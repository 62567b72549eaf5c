use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry connection failed: {0}")]
    Connect(String),

    #[cfg(feature = "postgres")]
    #[error("registry query failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("registry migration failed: {0}")]
    Migration(String),

    #[error("registry query failed: {0}")]
    Query(String),
}
