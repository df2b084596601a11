//! Blob store client for archiving edit artifacts

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Where an uploaded artifact ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub pathname: String,
    pub url: String,
    pub download_url: String,
    pub content_type: String,
}

/// Object store that can accept named buffers
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, pathname: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob>;
}

/// Blob store reached over HTTP with a bearer token
pub struct HttpBlobStore {
    client: Client,
    endpoint: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutResponse {
    pathname: Option<String>,
    url: String,
    download_url: Option<String>,
    content_type: Option<String>,
}

impl HttpBlobStore {
    /// Create a store from configuration; `None` when persistence is inactive
    pub fn from_config(config: &StorageConfig) -> Result<Option<Self>> {
        if !config.is_active() {
            return Ok(None);
        }
        let token = config.token.clone().unwrap_or_default();

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
        }))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, pathname: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob> {
        let url = format!("{}/{}", self.endpoint, pathname);
        let size = bytes.len();

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "Blob store returned {} for {}: {}",
                status,
                pathname,
                body.chars().take(160).collect::<String>()
            )));
        }

        let stored: PutResponse = response.json().await?;
        debug!(pathname = %pathname, size, "Stored artifact");

        Ok(StoredBlob {
            pathname: stored.pathname.unwrap_or_else(|| pathname.to_string()),
            download_url: stored.download_url.unwrap_or_else(|| stored.url.clone()),
            url: stored.url,
            content_type: stored
                .content_type
                .unwrap_or_else(|| content_type.to_string()),
        })
    }
}
