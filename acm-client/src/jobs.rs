//! Job and task endpoints
//!
//! Clusrun and diagnostic jobs share one resource layout under different
//! path segments, so every call takes a [`JobKind`].

use crate::AcmClient;
use crate::error::Result;
use acm_core::domain::job::{AggregationResult, Job, JobKind};
use acm_core::domain::task::{Task, TaskResult};
use acm_core::dto::ListQuery;
use acm_core::dto::job::{CancelJob, CreateClusrunJob, CreateDiagnosticJob};
use tracing::debug;

impl AcmClient {
    // =============================================================================
    // Jobs
    // =============================================================================

    /// List jobs of one kind
    ///
    /// # Arguments
    /// * `kind` - Clusrun or diagnostic jobs
    /// * `query` - Paging parameters
    pub async fn list_jobs(&self, kind: JobKind, query: &ListQuery) -> Result<Vec<Job>> {
        let url = self.url(kind.path_segment());
        let response = self.client.get(&url).query(query).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, kind: JobKind, job_id: i64) -> Result<Job> {
        let url = self.url(&format!("{}/{}", kind.path_segment(), job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Create a clusrun job
    ///
    /// # Returns
    /// The created job as echoed by the service
    pub async fn create_clusrun_job(&self, req: &CreateClusrunJob) -> Result<Job> {
        let url = self.url(JobKind::Clusrun.path_segment());
        debug!(nodes = req.target_nodes.len(), "creating clusrun job");
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Create a diagnostic job
    pub async fn create_diagnostic_job(&self, req: &CreateDiagnosticJob) -> Result<Job> {
        let url = self.url(JobKind::Diagnostics.path_segment());
        debug!(nodes = req.target_nodes.len(), "creating diagnostic job");
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Ask the service to cancel a job
    pub async fn cancel_job(&self, kind: JobKind, job_id: i64) -> Result<()> {
        let url = self.url(&format!("{}/{}", kind.path_segment(), job_id));
        let response = self
            .client
            .patch(&url)
            .json(&CancelJob::default())
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Get the aggregated verdict of a diagnostic job
    ///
    /// The service answers 404 until the job has aggregated its tasks.
    pub async fn get_aggregation_result(&self, job_id: i64) -> Result<AggregationResult> {
        let url = self.url(&format!(
            "{}/{}/aggregationResult",
            JobKind::Diagnostics.path_segment(),
            job_id
        ));
        let response = self.client.get(&url).send().await?;
        let value: serde_json::Value = self.handle_response(response).await?;

        AggregationResult::from_value(value).map_err(|e| {
            crate::ClientError::ParseError(format!("Failed to parse aggregation result: {}", e))
        })
    }

    // =============================================================================
    // Tasks
    // =============================================================================

    /// List the tasks of a job
    pub async fn list_tasks(&self, kind: JobKind, job_id: i64) -> Result<Vec<Task>> {
        let url = self.url(&format!("{}/{}/tasks", kind.path_segment(), job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the result record of a task
    ///
    /// The record appears only after the task has run, so a 404 here often
    /// means "not yet" rather than "never".
    pub async fn get_task_result(
        &self,
        kind: JobKind,
        job_id: i64,
        task_id: i64,
    ) -> Result<TaskResult> {
        let url = self.url(&format!(
            "{}/{}/tasks/{}/result",
            kind.path_segment(),
            job_id,
            task_id
        ));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
