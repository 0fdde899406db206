//! Cooperative scheduler for pollable operations
//!
//! One loop, one thread of control. Each pass polls every unfinished
//! operation once in input order. A pass that finishes nothing is followed
//! by a fixed idle backoff; that sleep is the only place the loop suspends,
//! because the service offers no push notification to wait on instead.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::pollable::{Pollable, Readiness};
use crate::progress::{NoProgress, Progress};

/// Delay after a pass in which no operation finished
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(100);

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Sleep between passes that made no progress
    pub idle_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_backoff: DEFAULT_IDLE_BACKOFF,
        }
    }
}

/// Bookkeeping of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitSummary {
    pub total: usize,
    pub completed: usize,
    /// Number of polling passes made
    pub passes: usize,
    /// Run stopped by the cancellation token before every operation finished
    pub cancelled: bool,
}

/// Values collected by [`Scheduler::wait_all`]
#[derive(Debug)]
pub enum WaitOutcome<T> {
    /// Every operation finished; `results[i]` belongs to `operations[i]`
    Complete { results: Vec<T>, summary: WaitSummary },
    /// Cancelled; finished operations are `Some` at their input position
    Cancelled {
        partial: Vec<Option<T>>,
        summary: WaitSummary,
    },
}

impl<T> WaitOutcome<T> {
    pub fn summary(&self) -> &WaitSummary {
        match self {
            WaitOutcome::Complete { summary, .. } | WaitOutcome::Cancelled { summary, .. } => {
                summary
            }
        }
    }

    /// Results when the run completed, `None` when it was cancelled
    pub fn into_results(self) -> Option<Vec<T>> {
        match self {
            WaitOutcome::Complete { results, .. } => Some(results),
            WaitOutcome::Cancelled { .. } => None,
        }
    }
}

/// Run-local state, owned by the loop alone
///
/// A finished operation's slot is emptied, which both marks it done and
/// drops it, so it can never be polled again.
struct RunState<O> {
    slots: Vec<Option<O>>,
    done_count: usize,
    passes: usize,
}

impl<O: Pollable> RunState<O> {
    fn new(operations: Vec<O>) -> Self {
        Self {
            slots: operations.into_iter().map(Some).collect(),
            done_count: 0,
            passes: 0,
        }
    }

    fn total(&self) -> usize {
        self.slots.len()
    }

    fn is_finished(&self) -> bool {
        self.done_count == self.total()
    }

    /// Poll every unfinished operation once; returns how many finished
    fn pass<P, F>(&mut self, progress: &mut P, on_complete: &mut F) -> usize
    where
        P: Progress,
        F: FnMut(usize, O::Output),
    {
        self.passes += 1;
        let mut finished = 0;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(operation) = slot else {
                continue;
            };

            if let Readiness::Ready(value) = operation.poll() {
                *slot = None;
                finished += 1;
                on_complete(index, value);
                progress.advance(1);
            }
        }

        self.done_count += finished;
        finished
    }

    fn summary(&self, cancelled: bool) -> WaitSummary {
        WaitSummary {
            total: self.total(),
            completed: self.done_count,
            passes: self.passes,
            cancelled,
        }
    }
}

/// Drives batches of operations to completion
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use acm_ops::{MissingPolicy, ResultFetch, Scheduler, SchedulerConfig, TaskKey};
/// # async fn example(client: Arc<acm_client::AcmClient>) {
/// let operations: Vec<_> = (1..=3)
///     .map(|task| {
///         let key = Some(TaskKey::clusrun(42, task));
///         ResultFetch::new(Arc::clone(&client), key, MissingPolicy::retry_up_to(20))
///     })
///     .collect();
///
/// let mut scheduler = Scheduler::new(SchedulerConfig::default());
/// let outcome = scheduler.wait_all(operations).await;
/// println!("{} passes", outcome.summary().passes);
/// # }
/// ```
pub struct Scheduler<P = NoProgress> {
    config: SchedulerConfig,
    progress: P,
    cancel: CancellationToken,
}

impl Scheduler<NoProgress> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            progress: NoProgress,
            cancel: CancellationToken::new(),
        }
    }
}

impl<P: Progress> Scheduler<P> {
    /// Replace the progress sink
    pub fn with_progress<Q: Progress>(self, progress: Q) -> Scheduler<Q> {
        Scheduler {
            config: self.config,
            progress,
            cancel: self.cancel,
        }
    }

    /// Stop runs when `cancel` fires
    ///
    /// Checked before every pass and during the idle backoff. Unfinished
    /// operations are dropped, which aborts their in-flight requests.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every operation to completion and collect the values in input
    /// order
    pub async fn wait_all<O: Pollable>(&mut self, operations: Vec<O>) -> WaitOutcome<O::Output> {
        let mut buffer: Vec<Option<O::Output>> = operations.iter().map(|_| None).collect();

        let summary = self
            .run(operations, |index, value| buffer[index] = Some(value))
            .await;

        if summary.cancelled {
            return WaitOutcome::Cancelled {
                partial: buffer,
                summary,
            };
        }

        // a run that was not cancelled filled every slot
        debug_assert_eq!(summary.completed, summary.total);
        WaitOutcome::Complete {
            results: buffer.into_iter().flatten().collect(),
            summary,
        }
    }

    /// Run every operation to completion, handing each value to
    /// `on_complete` in the pass where it finished
    ///
    /// Within a pass, handlers fire in input order.
    pub async fn wait_each<O, F>(&mut self, operations: Vec<O>, on_complete: F) -> WaitSummary
    where
        O: Pollable,
        F: FnMut(usize, O::Output),
    {
        self.run(operations, on_complete).await
    }

    async fn run<O, F>(&mut self, operations: Vec<O>, mut on_complete: F) -> WaitSummary
    where
        O: Pollable,
        F: FnMut(usize, O::Output),
    {
        let mut state = RunState::new(operations);
        debug!(total = state.total(), "waiting for operations");

        let mut cancelled = false;
        while !state.is_finished() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let finished = state.pass(&mut self.progress, &mut on_complete);
            trace!(
                pass = state.passes,
                finished,
                remaining = state.total() - state.done_count,
                "pass complete"
            );

            if finished == 0 && !state.is_finished() {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.config.idle_backoff) => {}
                }
            }
        }

        self.progress.finish();

        let summary = state.summary(cancelled);
        if cancelled {
            info!(
                completed = summary.completed,
                total = summary.total,
                "wait cancelled"
            );
        } else {
            debug!(passes = summary.passes, total = summary.total, "all operations finished");
        }
        summary
    }
}
