//! HTTP client for the video catalog and playback manifest services.
//!
//! One client value holds both base URLs and the default playback quality.
//! Front-ends construct it once from configuration and pass it to whatever
//! needs it; there is no process-wide instance.

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vidstream_core::{CatalogError, Config, ManifestError};

/// Base URL used for both services when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Resolution key selected for playback when none is requested.
pub const DEFAULT_QUALITY: &str = "480p";

/// HTTP client for the catalog and streaming services.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    catalog_base_url: String,
    streaming_base_url: String,
    default_quality: String,
}

impl ApiClient {
    pub fn new(catalog_base_url: &str, streaming_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            catalog_base_url: catalog_base_url.trim_end_matches('/').to_string(),
            streaming_base_url: streaming_base_url.trim_end_matches('/').to_string(),
            default_quality: DEFAULT_QUALITY.to_string(),
        })
    }

    /// Create client from CATALOG_API_URL, STREAMING_API_URL, PLAYBACK_DEFAULT_QUALITY
    /// and HTTP_TIMEOUT_SECS.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            &config.catalog_base_url,
            &config.streaming_base_url,
            Duration::from_secs(config.http_timeout_secs),
        )?
        .with_default_quality(config.playback_default_quality.clone()))
    }

    pub fn with_default_quality(mut self, quality: impl Into<String>) -> Self {
        self.default_quality = quality.into();
        self
    }

    pub fn catalog_base_url(&self) -> &str {
        &self.catalog_base_url
    }

    pub fn streaming_base_url(&self) -> &str {
        &self.streaming_base_url
    }

    pub fn default_quality(&self) -> &str {
        &self.default_quality
    }

    /// GET a JSON document. Anything but `200 OK` is a failure.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Failure of one JSON GET, before it is attributed to a service
#[derive(Debug)]
pub(crate) enum FetchError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl From<FetchError> for CatalogError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(msg) => CatalogError::Transport(msg),
            FetchError::Status(code) => CatalogError::Status(code),
            FetchError::Decode(msg) => CatalogError::Decode(msg),
        }
    }
}

impl From<FetchError> for ManifestError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(msg) => ManifestError::Transport(msg),
            FetchError::Status(code) => ManifestError::Status(code),
            FetchError::Decode(msg) => ManifestError::Decode(msg),
        }
    }
}
