//! Three-phase fetch of a task's full output
//!
//! 1. fetch the task result, which names the output stream
//! 2. poll the stream's last page until it reports EOF
//! 3. fetch the whole stream once
//!
//! Phase 2 is a loop inside a phase: every page without EOF re-issues the
//! same call, exactly like a retried 404, and the phase does not move on
//! until a page says the stream is closed.

use std::sync::Arc;

use acm_core::domain::task::{OutputPage, TaskResult};
use tracing::{debug, warn};

use super::{Step, Terminal, issue_last_page, issue_result, issue_whole_output, step};
use crate::outcome::Outcome;
use crate::policy::MissingPolicy;
use crate::pollable::{Pollable, Readiness};
use crate::remote::RemoteCall;
use crate::source::{TaskKey, TaskSource};

/// A task's result record and, when fetched, its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub result: TaskResult,
    pub content: Option<String>,
}

/// Stage an [`OutputFetch`] is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPhase {
    FetchResult,
    PollTail,
    FetchWhole,
    Done,
}

/// Fetches a task's complete output once the node has finished writing it
pub struct OutputFetch<S: TaskSource> {
    source: Arc<S>,
    on_missing: MissingPolicy,
    page_size: u32,
    phase: Phase,
}

enum Phase {
    FetchResult {
        key: TaskKey,
        call: RemoteCall<TaskResult>,
        misses: u32,
    },
    PollTail {
        result: TaskResult,
        call: RemoteCall<OutputPage>,
        misses: u32,
        pages: u32,
    },
    FetchWhole {
        result: TaskResult,
        call: RemoteCall<String>,
        misses: u32,
    },
    Done(Outcome<TaskOutput>),
}

impl<S: TaskSource> OutputFetch<S> {
    /// Build the operation and issue the result fetch
    ///
    /// `on_missing` applies to every phase: a result record, an output
    /// stream or its raw content that is not there yet. A `None` key finishes
    /// the operation immediately as [`Outcome::Absent`].
    ///
    /// # Panics
    /// Panics outside a tokio runtime when `key` is `Some`.
    pub fn new(
        source: Arc<S>,
        key: Option<TaskKey>,
        on_missing: MissingPolicy,
        page_size: u32,
    ) -> Self {
        let phase = match key {
            Some(key) => Phase::FetchResult {
                key,
                call: issue_result(&source, key),
                misses: 0,
            },
            None => Phase::Done(Outcome::Absent),
        };

        Self {
            source,
            on_missing,
            page_size,
            phase,
        }
    }

    pub fn phase(&self) -> OutputPhase {
        match self.phase {
            Phase::FetchResult { .. } => OutputPhase::FetchResult,
            Phase::PollTail { .. } => OutputPhase::PollTail,
            Phase::FetchWhole { .. } => OutputPhase::FetchWhole,
            Phase::Done(_) => OutputPhase::Done,
        }
    }

    fn stop(terminal: Terminal) -> Option<Phase> {
        if let Terminal::Failed(message) = &terminal {
            warn!(error = %message, "output fetch failed");
        }
        Some(Phase::Done(terminal.into_outcome()))
    }

    /// Returns the next phase when the current one is over
    fn advance(&mut self) -> Option<Phase> {
        let policy = self.on_missing;

        match &mut self.phase {
            Phase::FetchResult { key, call, misses } => match step(call, policy, misses) {
                Step::Wait => None,
                Step::Reissue => {
                    *call = issue_result(&self.source, *key);
                    None
                }
                Step::Advance(result) => {
                    debug!(task = %key, result_key = %result.result_key, "result ready, polling output tail");
                    Some(Phase::PollTail {
                        call: issue_last_page(&self.source, &result.result_key, self.page_size),
                        result,
                        misses: 0,
                        pages: 0,
                    })
                }
                Step::Stop(terminal) => Self::stop(terminal),
            },
            Phase::PollTail {
                result,
                call,
                misses,
                pages,
            } => match step(call, policy, misses) {
                Step::Wait => None,
                Step::Reissue => {
                    *call = issue_last_page(&self.source, &result.result_key, self.page_size);
                    None
                }
                Step::Advance(page) if !page.eof => {
                    *pages += 1;
                    *call = issue_last_page(&self.source, &result.result_key, self.page_size);
                    None
                }
                Step::Advance(_) => {
                    debug!(result_key = %result.result_key, pages = *pages + 1, "output closed, fetching content");
                    Some(Phase::FetchWhole {
                        call: issue_whole_output(&self.source, &result.result_key),
                        result: result.clone(),
                        misses: 0,
                    })
                }
                Step::Stop(terminal) => Self::stop(terminal),
            },
            Phase::FetchWhole {
                result,
                call,
                misses,
            } => match step(call, policy, misses) {
                Step::Wait => None,
                Step::Reissue => {
                    *call = issue_whole_output(&self.source, &result.result_key);
                    None
                }
                Step::Advance(content) => Some(Phase::Done(Outcome::Value(TaskOutput {
                    result: result.clone(),
                    content: Some(content),
                }))),
                Step::Stop(terminal) => Self::stop(terminal),
            },
            Phase::Done(_) => None,
        }
    }
}

impl<S: TaskSource> Pollable for OutputFetch<S> {
    type Output = Outcome<TaskOutput>;

    fn poll(&mut self) -> Readiness<Self::Output> {
        if let Some(next) = self.advance() {
            self.phase = next;
        }

        match &self.phase {
            Phase::Done(outcome) => Readiness::Ready(outcome.clone()),
            _ => Readiness::NotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedSource, page, settle, task_result};

    fn key() -> Option<TaskKey> {
        Some(TaskKey::clusrun(1, 1))
    }

    async fn poll_once<S: TaskSource>(op: &mut OutputFetch<S>) -> Readiness<Outcome<TaskOutput>> {
        settle().await;
        op.poll()
    }

    #[tokio::test]
    async fn test_waits_for_eof_before_fetching_content() {
        let source = Arc::new(
            ScriptedSource::new()
                .results(1, vec![Reply::Value(task_result(1, "k1"))])
                .pages(
                    "k1",
                    vec![
                        Reply::Value(page("a", false)),
                        Reply::Value(page("ab", false)),
                        Reply::Value(page("abc", true)),
                    ],
                )
                .outputs("k1", vec![Reply::Value("abc".to_string())]),
        );
        let mut op = OutputFetch::new(Arc::clone(&source), key(), MissingPolicy::Fail, 16);

        // result record arrives, first tail request goes out
        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert_eq!(op.phase(), OutputPhase::PollTail);

        // two pages without EOF keep the phase where it is
        for expected_calls in [2, 3] {
            assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
            assert_eq!(op.phase(), OutputPhase::PollTail);
            settle().await;
            assert_eq!(ScriptedSource::calls(&source.page_calls), expected_calls);
        }
        assert_eq!(ScriptedSource::calls(&source.output_calls), 0);

        // the EOF page moves on to the content fetch
        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert_eq!(op.phase(), OutputPhase::FetchWhole);
        settle().await;
        assert_eq!(ScriptedSource::calls(&source.output_calls), 1);

        let ready = poll_once(&mut op).await;
        assert_eq!(
            ready,
            Readiness::Ready(Outcome::Value(TaskOutput {
                result: task_result(1, "k1"),
                content: Some("abc".to_string()),
            }))
        );
        assert_eq!(ScriptedSource::calls(&source.page_calls), 3);
    }

    #[tokio::test]
    async fn test_missing_result_never_leaves_first_phase() {
        let source = Arc::new(ScriptedSource::new().results(1, vec![Reply::NotFound]));
        let mut op = OutputFetch::new(Arc::clone(&source), key(), MissingPolicy::Fail, 16);

        assert_eq!(poll_once(&mut op).await, Readiness::Ready(Outcome::Absent));
        assert_eq!(ScriptedSource::calls(&source.page_calls), 0);
        assert_eq!(ScriptedSource::calls(&source.output_calls), 0);
    }

    #[tokio::test]
    async fn test_result_retried_until_written() {
        let source = Arc::new(
            ScriptedSource::new()
                .results(
                    1,
                    vec![Reply::NotFound, Reply::NotFound, Reply::Value(task_result(1, "k1"))],
                )
                .pages("k1", vec![Reply::Value(page("", true))])
                .outputs("k1", vec![Reply::Value(String::new())]),
        );
        let mut op =
            OutputFetch::new(Arc::clone(&source), key(), MissingPolicy::retry_forever(), 16);

        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert_eq!(op.phase(), OutputPhase::FetchResult);
        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert_eq!(op.phase(), OutputPhase::FetchResult);
        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert_eq!(op.phase(), OutputPhase::PollTail);
    }

    #[tokio::test]
    async fn test_tail_failure_is_terminal() {
        let source = Arc::new(
            ScriptedSource::new()
                .results(1, vec![Reply::Value(task_result(1, "k1"))])
                .pages("k1", vec![Reply::Value(page("a", false)), Reply::Error(500)]),
        );
        let mut op =
            OutputFetch::new(Arc::clone(&source), key(), MissingPolicy::retry_forever(), 16);

        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert_eq!(poll_once(&mut op).await, Readiness::NotReady);
        assert!(matches!(
            poll_once(&mut op).await,
            Readiness::Ready(Outcome::Failed(_))
        ));
        assert_eq!(op.phase(), OutputPhase::Done);
        assert_eq!(ScriptedSource::calls(&source.output_calls), 0);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let source = Arc::new(ScriptedSource::new());
        let mut op = OutputFetch::new(Arc::clone(&source), None, MissingPolicy::Fail, 16);

        assert_eq!(op.phase(), OutputPhase::Done);
        assert_eq!(poll_once(&mut op).await, Readiness::Ready(Outcome::Absent));
        assert_eq!(ScriptedSource::calls(&source.result_calls), 0);
    }

    #[tokio::test]
    async fn test_done_is_memoized() {
        let source = Arc::new(
            ScriptedSource::new()
                .results(1, vec![Reply::Value(task_result(1, "k1"))])
                .pages("k1", vec![Reply::Value(page("x", true))])
                .outputs("k1", vec![Reply::Value("x".to_string())]),
        );
        let mut op = OutputFetch::new(Arc::clone(&source), key(), MissingPolicy::Fail, 16);

        let mut first = Readiness::NotReady;
        for _ in 0..5 {
            first = poll_once(&mut op).await;
            if first.is_ready() {
                break;
            }
        }
        assert!(first.is_ready());

        for _ in 0..3 {
            assert_eq!(poll_once(&mut op).await, first);
        }
        assert_eq!(ScriptedSource::calls(&source.result_calls), 1);
        assert_eq!(ScriptedSource::calls(&source.page_calls), 1);
        assert_eq!(ScriptedSource::calls(&source.output_calls), 1);
    }
}
