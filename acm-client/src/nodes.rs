//! Node endpoints

use crate::AcmClient;
use crate::error::Result;
use acm_core::domain::node::Node;
use acm_core::dto::ListQuery;

impl AcmClient {
    /// List nodes
    ///
    /// # Arguments
    /// * `query` - Paging parameters; `reverse` is ignored by the service here
    pub async fn list_nodes(&self, query: &ListQuery) -> Result<Vec<Node>> {
        let url = self.url("nodes");
        let response = self.client.get(&url).query(query).send().await?;

        self.handle_response(response).await
    }

    /// Get a node by ID
    pub async fn get_node(&self, node_id: &str) -> Result<Node> {
        let url = self.url(&format!("nodes/{}", node_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
