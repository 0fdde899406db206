//! Data Transfer Objects
//!
//! Request bodies and query parameters sent to the ACM service.

pub mod job;

use serde::Serialize;

/// Paging parameters shared by the list endpoints
///
/// The service pages by id: `last_id` is exclusive, `reverse` walks from the
/// newest record down.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
}

impl ListQuery {
    /// Query for at most `count` records
    pub fn first(count: u32) -> Self {
        Self {
            count: Some(count),
            ..Default::default()
        }
    }
}
