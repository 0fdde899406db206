//! Task domain types
//!
//! A job fans out into one task per target node. Once a task has run, the
//! service writes a result record whose `result_key` names the task's output
//! stream. The output is served in pages; the last page carries an `eof`
//! flag once the node has finished writing.

use serde::{Deserialize, Serialize};

/// One task of a job, bound to a single node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub job_id: i64,
    pub node: String,
    pub state: TaskState,
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Queued,
    Dispatching,
    Running,
    Finished,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// The task ran to an end, so its result record is written or about to be
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Queued => "Queued",
            TaskState::Dispatching => "Dispatching",
            TaskState::Running => "Running",
            TaskState::Finished => "Finished",
            TaskState::Failed => "Failed",
            TaskState::Canceled => "Canceled",
            TaskState::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Result record of a finished task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub job_id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub node_name: Option<String>,
    /// Storage key of the task's output stream
    pub result_key: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

/// One page of a task's output stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPage {
    #[serde(default)]
    pub content: String,
    pub offset: i64,
    pub size: i64,
    /// Set once the node has finished writing the stream
    pub eof: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_result_decodes() {
        let result: TaskResult = serde_json::from_str(
            r#"{"jobId": 3, "taskId": 1, "nodeName": "n1", "resultKey": "abc", "exitCode": 0}"#,
        )
        .unwrap();

        assert_eq!(result.result_key, "abc");
        assert_eq!(result.exit_code, Some(0));
    }

    #[test]
    fn test_output_page_without_content() {
        let page: OutputPage =
            serde_json::from_str(r#"{"offset": 0, "size": 0, "eof": false}"#).unwrap();

        assert!(page.content.is_empty());
        assert!(!page.eof);
    }

    #[test]
    fn test_task_state_complete() {
        assert!(TaskState::Finished.is_complete());
        assert!(TaskState::Failed.is_complete());
        assert!(!TaskState::Canceled.is_complete());
        assert!(!TaskState::Running.is_complete());

        let state: TaskState = serde_json::from_str(r#""Rebooting""#).unwrap();
        assert_eq!(state, TaskState::Unknown);
    }
}
