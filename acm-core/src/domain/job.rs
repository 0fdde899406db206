//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two job families the service runs
///
/// Both share the same resource shape; they differ in the URL segment
/// and in what the job's tasks do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    /// Ad-hoc command executed on every target node
    Clusrun,
    /// Diagnostic test with an aggregated verdict
    Diagnostics,
}

impl JobKind {
    /// URL path segment for this job family
    pub fn path_segment(&self) -> &'static str {
        match self {
            JobKind::Clusrun => "clusrun",
            JobKind::Diagnostics => "diagnostics",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Clusrun => write!(f, "clusrun"),
            JobKind::Diagnostics => write!(f, "diagnostic"),
        }
    }
}

/// A clusrun or diagnostic job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub state: JobState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub target_nodes: Vec<String>,
    #[serde(default)]
    pub command_line: Option<String>,
    #[serde(default)]
    pub diagnostic_test: Option<DiagnosticTest>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Finishing,
    Finished,
    Canceling,
    Canceled,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Whether the job has stopped and its tasks will not change any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed | JobState::Canceled)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "Queued",
            JobState::Running => "Running",
            JobState::Finishing => "Finishing",
            JobState::Finished => "Finished",
            JobState::Canceling => "Canceling",
            JobState::Canceled => "Canceled",
            JobState::Failed => "Failed",
            JobState::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Diagnostic test descriptor attached to a diagnostic job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub arguments: Vec<TestArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestArgument {
    pub name: String,
    pub value: serde_json::Value,
}

/// Aggregated verdict of a diagnostic job
///
/// The service sometimes returns this as a JSON object and sometimes as a
/// string containing JSON; [`AggregationResult::from_value`] accepts both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AggregationResult {
    #[serde(default)]
    pub good_nodes: Option<Vec<String>>,
    #[serde(default)]
    pub bad_nodes: Option<Vec<String>>,
}

impl AggregationResult {
    /// Decode an aggregation result from either an object or a JSON string
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        match value {
            serde_json::Value::String(s) => serde_json::from_str(&s),
            other => serde_json::from_value(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Finished.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Canceled.is_terminal());
        assert!(!JobState::Canceling.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Unknown.is_terminal());
    }

    #[test]
    fn test_job_decodes_camel_case_and_unknown_state() {
        let job: Job = serde_json::from_str(
            r#"{"id": 7, "state": "Paused", "targetNodes": ["n1", "n2"], "commandLine": "hostname"}"#,
        )
        .unwrap();

        assert_eq!(job.id, 7);
        assert_eq!(job.state, JobState::Unknown);
        assert_eq!(job.target_nodes, vec!["n1", "n2"]);
        assert_eq!(job.command_line.as_deref(), Some("hostname"));
        assert!(job.created_at.is_none());
    }

    #[test]
    fn test_aggregation_result_from_string_or_object() {
        let from_object = AggregationResult::from_value(serde_json::json!({
            "GoodNodes": ["a"],
            "BadNodes": ["b", "c"],
        }))
        .unwrap();
        let from_string = AggregationResult::from_value(serde_json::Value::String(
            r#"{"GoodNodes": ["a"], "BadNodes": ["b", "c"]}"#.to_string(),
        ))
        .unwrap();

        assert_eq!(from_object, from_string);
        assert_eq!(from_object.bad_nodes.map(|n| n.len()), Some(2));
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(JobKind::Clusrun.path_segment(), "clusrun");
        assert_eq!(JobKind::Diagnostics.path_segment(), "diagnostics");
    }
}
