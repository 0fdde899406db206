//! Scripted remote side for operation and scheduler tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use acm_client::{ClientError, Result};
use acm_core::domain::job::{Job, JobKind, JobState};
use acm_core::domain::task::{OutputPage, TaskResult};
use async_trait::async_trait;

use crate::source::{TaskKey, TaskSource};

/// One scripted response
pub(crate) enum Reply<T> {
    Value(T),
    NotFound,
    Error(u16),
    /// Never answers
    Pending,
}

impl<T> Reply<T> {
    async fn resolve(self, what: &str) -> Result<T> {
        match self {
            Reply::Value(value) => Ok(value),
            Reply::NotFound => Err(ClientError::NotFound(what.to_string())),
            Reply::Error(status) => Err(ClientError::api_error(status, "scripted failure")),
            Reply::Pending => std::future::pending().await,
        }
    }
}

/// Responses are consumed in order per task id or result key; running off
/// the end of a script answers 599 so a test notices the extra call.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    results: Mutex<HashMap<i64, VecDeque<Reply<TaskResult>>>>,
    pages: Mutex<HashMap<String, VecDeque<Reply<OutputPage>>>>,
    outputs: Mutex<HashMap<String, VecDeque<Reply<String>>>>,
    jobs: Mutex<VecDeque<Reply<Job>>>,
    pub result_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub output_calls: AtomicUsize,
    pub job_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(self, task_id: i64, replies: Vec<Reply<TaskResult>>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(task_id, replies.into());
        self
    }

    pub fn pages(self, result_key: &str, replies: Vec<Reply<OutputPage>>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(result_key.to_string(), replies.into());
        self
    }

    pub fn outputs(self, result_key: &str, replies: Vec<Reply<String>>) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .insert(result_key.to_string(), replies.into());
        self
    }

    pub fn jobs(self, replies: Vec<Reply<Job>>) -> Self {
        *self.jobs.lock().unwrap() = replies.into();
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn next<K, T>(map: &Mutex<HashMap<K, VecDeque<Reply<T>>>>, key: &K) -> Reply<T>
where
    K: std::hash::Hash + Eq,
{
    map.lock()
        .unwrap()
        .get_mut(key)
        .and_then(|queue| queue.pop_front())
        .unwrap_or(Reply::Error(599))
}

#[async_trait]
impl TaskSource for ScriptedSource {
    async fn task_result(&self, key: TaskKey) -> Result<TaskResult> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        let reply = next(&self.results, &key.task_id);
        reply.resolve("task result").await
    }

    async fn last_output_page(&self, result_key: &str, _page_size: u32) -> Result<OutputPage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let reply = next(&self.pages, &result_key.to_string());
        reply.resolve("output page").await
    }

    async fn whole_output(&self, result_key: &str) -> Result<String> {
        self.output_calls.fetch_add(1, Ordering::SeqCst);
        let reply = next(&self.outputs, &result_key.to_string());
        reply.resolve("output").await
    }

    async fn job(&self, _kind: JobKind, _job_id: i64) -> Result<Job> {
        self.job_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.jobs.lock().unwrap().pop_front().unwrap_or(Reply::Error(599));
        reply.resolve("job").await
    }
}

/// Let spawned request tasks run to completion on the current-thread runtime
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub(crate) fn task_result(task_id: i64, result_key: &str) -> TaskResult {
    TaskResult {
        job_id: 1,
        task_id,
        node_name: Some(format!("node-{}", task_id)),
        result_key: result_key.to_string(),
        exit_code: Some(0),
    }
}

pub(crate) fn page(content: &str, eof: bool) -> OutputPage {
    OutputPage {
        content: content.to_string(),
        offset: 0,
        size: content.len() as i64,
        eof,
    }
}

pub(crate) fn job(state: JobState) -> Job {
    Job {
        id: 1,
        name: Some("test".to_string()),
        state,
        progress: None,
        target_nodes: vec!["node-1".to_string()],
        command_line: Some("hostname".to_string()),
        diagnostic_test: None,
        created_at: None,
        updated_at: None,
    }
}
