//! Per-task operations
//!
//! Each operation is a forward-only state machine over phases. A phase owns
//! exactly one in-flight [`RemoteCall`]; when that call finishes the phase
//! either advances (issuing the next phase's call right away), re-issues its
//! own call, or finishes the operation with a failure marker.
//!
//! The operations are a closed set. [`TaskOperation`] unifies the two
//! per-task pipelines so a heterogeneous batch can go through one
//! scheduler run.

mod job_watch;
mod output_fetch;
mod result_fetch;

pub use job_watch::JobWatch;
pub use output_fetch::{OutputFetch, OutputPhase, TaskOutput};
pub use result_fetch::ResultFetch;

use std::sync::Arc;

use acm_core::domain::task::{OutputPage, TaskResult};

use crate::outcome::Outcome;
use crate::policy::{MissVerdict, MissingPolicy};
use crate::pollable::{Pollable, Readiness};
use crate::remote::{CallOutcome, RemoteCall};
use crate::source::{TaskKey, TaskSource};

/// What a phase should do after polling its call
pub(crate) enum Step<V> {
    /// Call still in flight
    Wait,
    /// Resource missing and the policy wants another attempt
    Reissue,
    /// Usable value
    Advance(V),
    /// Operation is over
    Stop(Terminal),
}

/// Failure markers that end an operation regardless of its output type
#[derive(Debug)]
pub(crate) enum Terminal {
    Absent,
    GaveUp { attempts: u32 },
    Failed(String),
}

impl Terminal {
    pub(crate) fn into_outcome<T>(self) -> Outcome<T> {
        match self {
            Terminal::Absent => Outcome::Absent,
            Terminal::GaveUp { attempts } => Outcome::GaveUp { attempts },
            Terminal::Failed(message) => Outcome::Failed(message),
        }
    }
}

/// Poll a phase's call and classify the answer
///
/// `misses` counts the 404s this phase has seen and is bumped here.
pub(crate) fn step<V>(call: &mut RemoteCall<V>, policy: MissingPolicy, misses: &mut u32) -> Step<V> {
    match call.poll() {
        Readiness::NotReady => Step::Wait,
        Readiness::Ready(CallOutcome::Value(value)) => Step::Advance(value),
        Readiness::Ready(CallOutcome::Failed(message)) => Step::Stop(Terminal::Failed(message)),
        Readiness::Ready(CallOutcome::NotFound) => {
            *misses += 1;
            match policy.on_missing(*misses) {
                MissVerdict::Retry => Step::Reissue,
                MissVerdict::Absent => Step::Stop(Terminal::Absent),
                MissVerdict::GaveUp { attempts } => Step::Stop(Terminal::GaveUp { attempts }),
            }
        }
    }
}

pub(crate) fn issue_result<S: TaskSource>(source: &Arc<S>, key: TaskKey) -> RemoteCall<TaskResult> {
    let source = Arc::clone(source);
    RemoteCall::spawn(async move { source.task_result(key).await })
}

pub(crate) fn issue_last_page<S: TaskSource>(
    source: &Arc<S>,
    result_key: &str,
    page_size: u32,
) -> RemoteCall<OutputPage> {
    let source = Arc::clone(source);
    let result_key = result_key.to_string();
    RemoteCall::spawn(async move { source.last_output_page(&result_key, page_size).await })
}

pub(crate) fn issue_whole_output<S: TaskSource>(source: &Arc<S>, result_key: &str) -> RemoteCall<String> {
    let source = Arc::clone(source);
    let result_key = result_key.to_string();
    RemoteCall::spawn(async move { source.whole_output(&result_key).await })
}

/// Any per-task operation
pub enum TaskOperation<S: TaskSource> {
    /// Result record only
    Result(ResultFetch<S>),
    /// Result record followed by the task's full output
    Output(OutputFetch<S>),
}

impl<S: TaskSource> TaskOperation<S> {
    /// See [`ResultFetch::new`]
    pub fn result(source: Arc<S>, key: Option<TaskKey>, on_missing: MissingPolicy) -> Self {
        TaskOperation::Result(ResultFetch::new(source, key, on_missing))
    }

    /// See [`OutputFetch::new`]
    pub fn output(
        source: Arc<S>,
        key: Option<TaskKey>,
        on_missing: MissingPolicy,
        page_size: u32,
    ) -> Self {
        TaskOperation::Output(OutputFetch::new(source, key, on_missing, page_size))
    }
}

impl<S: TaskSource> Pollable for TaskOperation<S> {
    type Output = Outcome<TaskOutput>;

    // `Self::Output` would be ambiguous with the `Output` variant
    fn poll(&mut self) -> Readiness<Outcome<TaskOutput>> {
        match self {
            TaskOperation::Result(op) => op.poll().map(|outcome| {
                outcome.map(|result| TaskOutput {
                    result,
                    content: None,
                })
            }),
            TaskOperation::Output(op) => op.poll(),
        }
    }
}
