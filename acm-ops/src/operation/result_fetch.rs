//! Single-phase fetch of a task's result record

use std::sync::Arc;

use acm_core::domain::task::TaskResult;
use tracing::{debug, warn};

use super::{Step, Terminal, issue_result, step};
use crate::outcome::Outcome;
use crate::policy::MissingPolicy;
use crate::pollable::{Pollable, Readiness};
use crate::remote::RemoteCall;
use crate::source::{TaskKey, TaskSource};

/// Fetches the result record of one task
///
/// A task that has not run yet has no result record, so with
/// [`MissingPolicy::Retry`] a 404 means "ask again".
pub struct ResultFetch<S: TaskSource> {
    source: Arc<S>,
    on_missing: MissingPolicy,
    phase: Phase,
}

enum Phase {
    Fetching {
        key: TaskKey,
        call: RemoteCall<TaskResult>,
        misses: u32,
    },
    Done(Outcome<TaskResult>),
}

impl<S: TaskSource> ResultFetch<S> {
    /// Build the operation and issue its first call
    ///
    /// A `None` key means the task has nothing to look up; the operation is
    /// born finished as [`Outcome::Absent`] and never calls the service.
    ///
    /// # Panics
    /// Panics outside a tokio runtime when `key` is `Some`.
    pub fn new(source: Arc<S>, key: Option<TaskKey>, on_missing: MissingPolicy) -> Self {
        let phase = match key {
            Some(key) => Phase::Fetching {
                key,
                call: issue_result(&source, key),
                misses: 0,
            },
            None => Phase::Done(Outcome::Absent),
        };

        Self {
            source,
            on_missing,
            phase,
        }
    }

    /// Returns the next phase when the current one is over
    fn advance(&mut self) -> Option<Phase> {
        let Phase::Fetching { key, call, misses } = &mut self.phase else {
            return None;
        };

        match step(call, self.on_missing, misses) {
            Step::Wait => None,
            Step::Reissue => {
                debug!(task = %key, misses = *misses, "task result not written yet, asking again");
                *call = issue_result(&self.source, *key);
                None
            }
            Step::Advance(result) => Some(Phase::Done(Outcome::Value(result))),
            Step::Stop(terminal) => {
                match &terminal {
                    Terminal::Failed(message) => {
                        warn!(task = %key, error = %message, "task result fetch failed")
                    }
                    _ => debug!(task = %key, ?terminal, "task result fetch ended without a result"),
                }
                Some(Phase::Done(terminal.into_outcome()))
            }
        }
    }
}

impl<S: TaskSource> Pollable for ResultFetch<S> {
    type Output = Outcome<TaskResult>;

    fn poll(&mut self) -> Readiness<Self::Output> {
        if let Some(next) = self.advance() {
            self.phase = next;
        }

        match &self.phase {
            Phase::Done(outcome) => Readiness::Ready(outcome.clone()),
            Phase::Fetching { .. } => Readiness::NotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedSource, settle, task_result};

    fn key() -> Option<TaskKey> {
        Some(TaskKey::clusrun(1, 1))
    }

    #[tokio::test]
    async fn test_advances_on_fourth_poll_after_three_misses() {
        let source = Arc::new(ScriptedSource::new().results(
            1,
            vec![
                Reply::NotFound,
                Reply::NotFound,
                Reply::NotFound,
                Reply::Value(task_result(1, "k1")),
            ],
        ));
        let mut op = ResultFetch::new(Arc::clone(&source), key(), MissingPolicy::retry_forever());

        for poll in 1..=3 {
            settle().await;
            assert_eq!(ScriptedSource::calls(&source.result_calls), poll);
            assert_eq!(op.poll(), Readiness::NotReady, "poll {}", poll);
        }

        settle().await;
        assert_eq!(ScriptedSource::calls(&source.result_calls), 4);
        assert_eq!(
            op.poll(),
            Readiness::Ready(Outcome::Value(task_result(1, "k1")))
        );
        assert_eq!(ScriptedSource::calls(&source.result_calls), 4);
    }

    #[tokio::test]
    async fn test_give_up_policy_finishes_absent() {
        let source = Arc::new(ScriptedSource::new().results(1, vec![Reply::NotFound]));
        let mut op = ResultFetch::new(Arc::clone(&source), key(), MissingPolicy::Fail);

        settle().await;
        assert_eq!(op.poll(), Readiness::Ready(Outcome::Absent));
        assert_eq!(ScriptedSource::calls(&source.result_calls), 1);
    }

    #[tokio::test]
    async fn test_bounded_retry_reports_gave_up() {
        let source = Arc::new(
            ScriptedSource::new().results(1, vec![Reply::NotFound, Reply::NotFound]),
        );
        let mut op = ResultFetch::new(Arc::clone(&source), key(), MissingPolicy::retry_up_to(2));

        settle().await;
        assert_eq!(op.poll(), Readiness::NotReady);
        settle().await;
        assert_eq!(op.poll(), Readiness::Ready(Outcome::GaveUp { attempts: 2 }));
        assert_eq!(ScriptedSource::calls(&source.result_calls), 2);
    }

    #[tokio::test]
    async fn test_hard_failure_is_never_retried() {
        let source = Arc::new(ScriptedSource::new().results(1, vec![Reply::Error(503)]));
        let mut op = ResultFetch::new(Arc::clone(&source), key(), MissingPolicy::retry_forever());

        settle().await;
        assert!(matches!(op.poll(), Readiness::Ready(Outcome::Failed(_))));
        assert_eq!(ScriptedSource::calls(&source.result_calls), 1);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let source = Arc::new(ScriptedSource::new());
        let mut op = ResultFetch::new(Arc::clone(&source), None, MissingPolicy::retry_forever());

        assert!(matches!(op.phase, Phase::Done(_)));
        assert_eq!(op.poll(), Readiness::Ready(Outcome::Absent));
        settle().await;
        assert_eq!(ScriptedSource::calls(&source.result_calls), 0);
    }

    #[tokio::test]
    async fn test_ready_is_memoized() {
        let source = Arc::new(
            ScriptedSource::new().results(1, vec![Reply::Value(task_result(1, "k1"))]),
        );
        let mut op = ResultFetch::new(Arc::clone(&source), key(), MissingPolicy::Fail);

        settle().await;
        let first = op.poll();
        for _ in 0..5 {
            settle().await;
            assert_eq!(op.poll(), first);
        }
        assert_eq!(ScriptedSource::calls(&source.result_calls), 1);
    }

    #[tokio::test]
    async fn test_pending_call_stays_not_ready() {
        let source = Arc::new(ScriptedSource::new().results(1, vec![Reply::Pending]));
        let mut op = ResultFetch::new(Arc::clone(&source), key(), MissingPolicy::Fail);

        for _ in 0..5 {
            settle().await;
            assert_eq!(op.poll(), Readiness::NotReady);
        }
        assert_eq!(ScriptedSource::calls(&source.result_calls), 1);
    }
}
