//! Node domain model
//!
//! Represents a compute node registered with the ACM service.

use serde::{Deserialize, Serialize};

/// A compute node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Service-assigned identifier
    pub id: String,

    /// Host name of the node
    pub name: String,

    /// Health reported by the last diagnostic run
    pub health: NodeHealth,

    /// Availability of the node
    pub state: NodeState,

    /// Number of jobs currently using this node
    #[serde(default)]
    pub running_job_count: i64,

    /// Hardware facts sent by the node agent, absent before first registration
    #[serde(default)]
    pub node_registration_info: Option<NodeRegistrationInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRegistrationInfo {
    #[serde(default)]
    pub core_count: i64,
    #[serde(default)]
    pub memory_megabytes: i64,
    #[serde(default)]
    pub distro_info: String,
}

/// Health of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeHealth {
    #[serde(rename = "OK")]
    Ok,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeHealth::Ok => write!(f, "OK"),
            NodeHealth::Warning => write!(f, "Warning"),
            NodeHealth::Error => write!(f, "Error"),
            NodeHealth::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Availability of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Online,
    Offline,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Online => write!(f, "Online"),
            NodeState::Offline => write!(f, "Offline"),
            NodeState::Unknown => write!(f, "Unknown"),
        }
    }
}
