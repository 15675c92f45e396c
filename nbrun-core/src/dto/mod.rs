//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies exchanged between the server and its clients.

pub mod job;
