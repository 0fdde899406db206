//! HPC ACM Core
//!
//! Core types for the HPC ACM command-line client.
//!
//! This crate contains:
//! - Domain types: entities returned by the ACM service (Node, Job, Task, etc.)
//! - DTOs: request bodies and query parameters sent to the service

pub mod domain;
pub mod dto;
