use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::info;

use dbk_api_types::ErrorResponse;
use dbk_chain_client::{ChainProvider, TxBuilder};
use dbk_chain_koios::{KoiosProvider, RemoteTxBuilder};
use dbk_pinning::{PinataClient, PinningClient};
use dbk_registry::{DocumentStore, PostgresDocumentStore};
use dbk_token::script::ScriptConfig;
use serde::Serialize;

mod chain;
mod config;
mod documents;
mod dto;
mod tokens;

use config::Config;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn DocumentStore>,
    pinning: Arc<dyn PinningClient>,
    chain: Arc<dyn ChainProvider>,
    builder: Arc<dyn TxBuilder>,
    script: ScriptConfig,
    storage_quota_gb: u64,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/documents", get(documents::list_documents))
        .route("/documents/count", get(documents::count_documents))
        .route("/documents/upload", post(documents::upload_document))
        .route("/stats/storage", get(documents::storage_stats))
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens/update", post(tokens::prepare_update))
        .route("/tokens/burn", post(tokens::prepare_burn))
        .route("/chain/submit", post(chain::submit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let store = PostgresDocumentStore::connect(&config.database_url).await?;
    if std::path::Path::new(&config.migrations_dir).exists() {
        let applied = store.run_migrations_from_dir(&config.migrations_dir).await?;
        info!(applied, "ran registry migrations");
    }

    let state = AppState {
        store: Arc::new(store),
        pinning: Arc::new(PinataClient::new(
            config.pinata_gateway.clone(),
            config.pinata_jwt.clone(),
        )),
        chain: Arc::new(KoiosProvider::new(config.koios_url.clone())),
        builder: Arc::new(RemoteTxBuilder::new(config.builder_url.clone())),
        script: config.script.clone(),
        storage_quota_gb: config.storage_quota_gb,
    };

    let app = router(state);

    info!("docbank-service listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "docbank-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "docbank-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn bad_request(message: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn epoch_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::documents::tests_support::mock_state;

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(mock_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn version_reports_package_version() {
        let app = router(mock_state());
        let response = app
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "docbank-service");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
