//! Task output endpoints
//!
//! Output streams are addressed by the `result_key` of a task result.

use crate::AcmClient;
use crate::error::{ClientError, Result};
use acm_core::domain::task::OutputPage;

/// Offset value that asks the service for the last page of a stream
pub const LAST_PAGE_OFFSET: i64 = -1;

impl AcmClient {
    /// Get one page of a task's output
    ///
    /// # Arguments
    /// * `result_key` - Key taken from the task result
    /// * `offset` - Byte offset, or [`LAST_PAGE_OFFSET`] for the tail
    /// * `page_size` - Maximum bytes in the page
    pub async fn get_output_page(
        &self,
        result_key: &str,
        offset: i64,
        page_size: u32,
    ) -> Result<OutputPage> {
        if result_key.is_empty() {
            return Err(ClientError::InvalidRequest(
                "result key cannot be empty".to_string(),
            ));
        }

        let url = self.url(&format!("output/clusrun/{}/page", result_key));
        let response = self
            .client
            .get(&url)
            .query(&[("offset", offset), ("pageSize", i64::from(page_size))])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the whole output of a task as text
    pub async fn get_raw_output(&self, result_key: &str) -> Result<String> {
        if result_key.is_empty() {
            return Err(ClientError::InvalidRequest(
                "result key cannot be empty".to_string(),
            ));
        }

        let response = self.client.get(self.raw_output_url(result_key)).send().await?;

        self.handle_text_response(response).await
    }

    /// URL of the whole output of a task, as shown to users
    pub fn raw_output_url(&self, result_key: &str) -> String {
        self.url(&format!("output/clusrun/{}/raw", result_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_output_url() {
        let client = AcmClient::new("http://acm/v1");
        assert_eq!(
            client.raw_output_url("k1"),
            "http://acm/v1/output/clusrun/k1/raw"
        );
    }

    #[tokio::test]
    async fn test_empty_key_rejected_before_sending() {
        let client = AcmClient::new("http://127.0.0.1:9/v1");

        let page = client.get_output_page("", LAST_PAGE_OFFSET, 10).await;
        let raw = client.get_raw_output("").await;

        assert!(matches!(page, Err(ClientError::InvalidRequest(_))));
        assert!(matches!(raw, Err(ClientError::InvalidRequest(_))));
    }
}
