//! HPC ACM operation polling
//!
//! Drives many dependent-phase remote operations to completion from a single
//! cooperative loop, without blocking on any of them.
//!
//! Layers, leaf-first:
//! - Remote calls: requests spawned onto the tokio runtime and checked for
//!   readiness without awaiting ([`RemoteCall`])
//! - Pollable: the `NotReady | Ready(value)` contract every operation exposes
//! - Operations: per-task state machines that chain remote calls through
//!   ordered phases and apply a [`MissingPolicy`] to 404 responses
//! - Scheduler: round-robin passes over unfinished operations with an idle
//!   backoff, progress reporting and cancellation
//!
//! Operation failures are values ([`Outcome`]); nothing here returns an error
//! to the caller, so one bad task never sinks the batch.

pub mod operation;
pub mod outcome;
pub mod policy;
pub mod pollable;
pub mod progress;
pub mod remote;
pub mod scheduler;
pub mod source;

#[cfg(test)]
mod testing;

pub use operation::{JobWatch, OutputFetch, ResultFetch, TaskOperation, TaskOutput};
pub use outcome::Outcome;
pub use policy::MissingPolicy;
pub use pollable::{Pollable, Readiness};
pub use progress::{LogProgress, NoProgress, Progress, TerminalProgress};
pub use remote::{CallOutcome, RemoteCall};
pub use scheduler::{Scheduler, SchedulerConfig, WaitOutcome, WaitSummary};
pub use source::{TaskKey, TaskSource};
