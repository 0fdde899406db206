//! HPC ACM HTTP Client
//!
//! A small, type-safe client for the ACM REST service: nodes, clusrun and
//! diagnostic jobs, their tasks, task results and task output streams.
//!
//! Every call is a plain `async fn`; the polling layer in `acm-ops` spawns
//! these onto the runtime and checks them for readiness without awaiting.
//!
//! # Example
//!
//! ```no_run
//! use acm_client::AcmClient;
//! use acm_core::dto::ListQuery;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), acm_client::ClientError> {
//!     let client = AcmClient::new("http://localhost:8080/v1");
//!
//!     for node in client.list_nodes(&ListQuery::first(10)).await? {
//!         println!("{}", node.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod nodes;
mod output;

pub use error::{ClientError, Result};
pub use output::LAST_PAGE_OFFSET;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::trace;

/// HTTP client for the ACM service
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AcmClient {
    /// Base URL of the service including the API version (e.g. "https://host/v1")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl AcmClient {
    /// Create a new ACM client
    ///
    /// # Arguments
    /// * `base_url` - The API end point (e.g., "http://localhost:8080/v1")
    ///
    /// # Example
    /// ```
    /// use acm_client::AcmClient;
    ///
    /// let client = AcmClient::new("http://localhost:8080/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status of a response and return it if successful
    ///
    /// 404 is reported as [`ClientError::NotFound`] so callers can tell
    /// "not created yet" apart from every other failure.
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        trace!(url = %response.url(), status = status.as_u16(), "response received");

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().path().to_string()));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is plain text
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let response = self.check_status(response).await?;

        response
            .text()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to read response body: {}", e)))
    }

    /// Handle an API response whose body is ignored
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await.map(|_| ())
    }
}
