//! Waits for a job to reach a terminal state

use std::sync::Arc;

use acm_core::domain::job::{Job, JobKind, JobState};
use tracing::{debug, warn};

use super::{Step, Terminal, step};
use crate::outcome::Outcome;
use crate::policy::MissingPolicy;
use crate::pollable::{Pollable, Readiness};
use crate::remote::RemoteCall;
use crate::source::TaskSource;

/// Re-fetches a job until it is Finished, Failed or Canceled
///
/// A fetched job that is still running counts as "not yet", the same way
/// an output page without EOF does.
pub struct JobWatch<S: TaskSource> {
    source: Arc<S>,
    kind: JobKind,
    job_id: i64,
    on_missing: MissingPolicy,
    last_state: Option<JobState>,
    phase: Phase,
}

enum Phase {
    Watching { call: RemoteCall<Job>, misses: u32 },
    Done(Outcome<Job>),
}

fn issue_job<S: TaskSource>(source: &Arc<S>, kind: JobKind, job_id: i64) -> RemoteCall<Job> {
    let source = Arc::clone(source);
    RemoteCall::spawn(async move { source.job(kind, job_id).await })
}

impl<S: TaskSource> JobWatch<S> {
    /// Start watching a job
    ///
    /// # Panics
    /// Panics outside a tokio runtime.
    pub fn new(source: Arc<S>, kind: JobKind, job_id: i64, on_missing: MissingPolicy) -> Self {
        let call = issue_job(&source, kind, job_id);
        Self {
            source,
            kind,
            job_id,
            on_missing,
            last_state: None,
            phase: Phase::Watching { call, misses: 0 },
        }
    }

    /// State seen on the most recent fetch
    pub fn last_state(&self) -> Option<JobState> {
        self.last_state
    }

    fn advance(&mut self) -> Option<Phase> {
        let Phase::Watching { call, misses } = &mut self.phase else {
            return None;
        };

        match step(call, self.on_missing, misses) {
            Step::Wait => None,
            Step::Reissue => {
                *call = issue_job(&self.source, self.kind, self.job_id);
                None
            }
            Step::Advance(job) => {
                if self.last_state != Some(job.state) {
                    debug!(job_id = self.job_id, state = %job.state, "job state changed");
                    self.last_state = Some(job.state);
                }

                if job.state.is_terminal() {
                    Some(Phase::Done(Outcome::Value(job)))
                } else {
                    *call = issue_job(&self.source, self.kind, self.job_id);
                    None
                }
            }
            Step::Stop(terminal) => {
                if let Terminal::Failed(message) = &terminal {
                    warn!(job_id = self.job_id, error = %message, "job watch failed");
                }
                Some(Phase::Done(terminal.into_outcome()))
            }
        }
    }
}

impl<S: TaskSource> Pollable for JobWatch<S> {
    type Output = Outcome<Job>;

    fn poll(&mut self) -> Readiness<Self::Output> {
        if let Some(next) = self.advance() {
            self.phase = next;
        }

        match &self.phase {
            Phase::Done(outcome) => Readiness::Ready(outcome.clone()),
            Phase::Watching { .. } => Readiness::NotReady,
        }
    }
}
