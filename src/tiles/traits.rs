//! Trait definition for the tile HTTP layer.
//!
//! The trait enables dependency injection and mocking for tests.
//! Production code uses the reqwest implementation, while tests
//! substitute mock implementations that count invocations or fail
//! on demand.

use std::time::Duration;

use async_trait::async_trait;

/// Errors from a single tile request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TileError {
    /// Connection failure or timeout
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Body received but not decodable as an image
    #[error("image decode failed: {0}")]
    Decode(String),
}

/// Trait for fetching one tile URL's raw bytes.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait TileApi: Send + Sync {
    /// Fetch the body at `url`, erroring on any non-success status.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TileError>;
}

/// User agent string - tile server usage policies require a descriptive one.
const USER_AGENT: &str = concat!(
    "TeeVee/",
    env!("CARGO_PKG_VERSION"),
    " (desktop companion; https://github.com/teevee)"
);

/// reqwest-backed tile fetcher with a short per-request timeout.
pub struct HttpTileApi {
    http_client: reqwest::Client,
}

impl HttpTileApi {
    pub fn new(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { http_client }
    }
}

#[async_trait]
impl TileApi for HttpTileApi {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TileError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TileError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TileError::Network(e.to_string()))
    }
}
