//! Remote endpoints the operations are built from
//!
//! Operations only see this trait, so tests can script responses and the
//! CLI can plug in the HTTP client.

use acm_client::{AcmClient, LAST_PAGE_OFFSET, Result};
use acm_core::domain::job::{Job, JobKind};
use acm_core::domain::task::{OutputPage, TaskResult};
use async_trait::async_trait;

/// Identifies one task of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub kind: JobKind,
    pub job_id: i64,
    pub task_id: i64,
}

impl TaskKey {
    pub fn clusrun(job_id: i64, task_id: i64) -> Self {
        Self {
            kind: JobKind::Clusrun,
            job_id,
            task_id,
        }
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} job {} task {}", self.kind, self.job_id, self.task_id)
    }
}

/// Source of task results and task output
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    /// Fetch the result record of a task
    async fn task_result(&self, key: TaskKey) -> Result<TaskResult>;

    /// Fetch the last page of a task's output stream
    async fn last_output_page(&self, result_key: &str, page_size: u32) -> Result<OutputPage>;

    /// Fetch a task's complete output
    async fn whole_output(&self, result_key: &str) -> Result<String>;

    /// Fetch a job
    async fn job(&self, kind: JobKind, job_id: i64) -> Result<Job>;
}

#[async_trait]
impl TaskSource for AcmClient {
    async fn task_result(&self, key: TaskKey) -> Result<TaskResult> {
        self.get_task_result(key.kind, key.job_id, key.task_id).await
    }

    async fn last_output_page(&self, result_key: &str, page_size: u32) -> Result<OutputPage> {
        self.get_output_page(result_key, LAST_PAGE_OFFSET, page_size).await
    }

    async fn whole_output(&self, result_key: &str) -> Result<String> {
        self.get_raw_output(result_key).await
    }

    async fn job(&self, kind: JobKind, job_id: i64) -> Result<Job> {
        self.get_job(kind, job_id).await
    }
}
