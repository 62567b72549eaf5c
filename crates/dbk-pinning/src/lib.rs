//! Client for a hosted content-addressed pinning service.
//!
//! The service stores content under a cryptographic content identifier and
//! serves it back over a public gateway. Only the HTTP surface lives here;
//! the storage protocol itself is the service's concern.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedContent {
    pub content_id: String,
}

#[derive(Debug, Error)]
pub enum PinError {
    #[error("pinning transport error: {0}")]
    Transport(String),

    #[error("pinning service rejected the request ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("pinning response could not be parsed: {0}")]
    Parse(String),
}

#[async_trait]
pub trait PinningClient: Send + Sync {
    /// Pin raw file bytes, returning the content identifier.
    async fn pin_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<PinnedContent, PinError>;

    /// Pin a JSON object, returning the content identifier.
    async fn pin_json(&self, value: &serde_json::Value) -> Result<PinnedContent, PinError>;

    /// Public retrieval URL for a pinned content identifier.
    fn gateway_url(&self, content_id: &str) -> String;
}

/// Pinata-style hosted pinning service.
///
/// Reads `DOCBANK_PINATA_GATEWAY` and `DOCBANK_PINATA_JWT` from the
/// environment when not passed explicitly.
pub struct PinataClient {
    api_url: String,
    gateway_host: String,
    jwt: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

const DEFAULT_API_URL: &str = "https://api.pinata.cloud";

impl PinataClient {
    pub fn new(gateway_host: Option<String>, jwt: Option<String>) -> Self {
        let gateway_host = gateway_host
            .or_else(|| std::env::var("DOCBANK_PINATA_GATEWAY").ok())
            .unwrap_or_else(|| "gateway.pinata.cloud".to_owned());
        let jwt = jwt
            .or_else(|| std::env::var("DOCBANK_PINATA_JWT").ok())
            .unwrap_or_default();
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            gateway_host,
            jwt,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn read_pin_response(response: reqwest::Response) -> Result<PinnedContent, PinError> {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(PinError::Service {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: PinResponse =
            serde_json::from_str(&text).map_err(|err| PinError::Parse(err.to_string()))?;
        Ok(PinnedContent {
            content_id: body.ipfs_hash,
        })
    }
}

#[async_trait]
impl PinningClient for PinataClient {
    async fn pin_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<PinnedContent, PinError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/pinning/pinFileToIPFS", self.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|err| PinError::Transport(err.to_string()))?;

        Self::read_pin_response(response).await
    }

    async fn pin_json(&self, value: &serde_json::Value) -> Result<PinnedContent, PinError> {
        let url = format!("{}/pinning/pinJSONToIPFS", self.api_url);
        let body = serde_json::json!({ "pinataContent": value });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.jwt)
            .json(&body)
            .send()
            .await
            .map_err(|err| PinError::Transport(err.to_string()))?;

        Self::read_pin_response(response).await
    }

    fn gateway_url(&self, content_id: &str) -> String {
        format!("https://{}/ipfs/{}", self.gateway_host, content_id)
    }
}
