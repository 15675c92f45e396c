//! Service Module
//!
//! Business logic layer for the server.
//! Services sit between the HTTP API and the job registry and runner.

pub mod job;

pub use job::{JobError, JobService};
