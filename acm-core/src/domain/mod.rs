//! Core domain types
//!
//! These types mirror the resources exposed by the ACM REST service. They are
//! decoded by the client and rendered by the CLI; the polling machinery only
//! cares about a few of their fields (result keys, page EOF markers, job state).

pub mod job;
pub mod node;
pub mod task;
