//! Job DTOs

use serde::Serialize;

use crate::domain::job::{DiagnosticTest, TestArgument};

/// Request to create a clusrun job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusrunJob {
    pub name: String,
    pub target_nodes: Vec<String>,
    pub command_line: String,
}

/// Request to create a diagnostic job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiagnosticJob {
    pub name: String,
    pub target_nodes: Vec<String>,
    pub diagnostic_test: DiagnosticTest,
}

impl CreateDiagnosticJob {
    /// MPI ping-pong test in tournament mode across `target_nodes`
    pub fn mpi_pingpong(name: String, target_nodes: Vec<String>) -> Self {
        let arg = |name: &str, value: serde_json::Value| TestArgument {
            name: name.to_string(),
            value,
        };
        Self {
            name,
            target_nodes,
            diagnostic_test: DiagnosticTest {
                name: "pingpong".to_string(),
                category: "mpi".to_string(),
                arguments: vec![
                    arg("Aim", serde_json::json!("Default")),
                    arg("Packet size", serde_json::json!(0)),
                    arg("Mode", serde_json::json!("Tournament")),
                ],
            },
        }
    }
}

/// Body of the job PATCH request that asks the service to cancel a job
#[derive(Debug, Clone, Serialize)]
pub struct CancelJob {
    pub request: &'static str,
}

impl Default for CancelJob {
    fn default() -> Self {
        Self { request: "cancel" }
    }
}
