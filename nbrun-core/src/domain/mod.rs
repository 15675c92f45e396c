//! Core domain types
//!
//! These types represent the background job entity. The server owns and
//! mutates them; the client and CLI only read them back from the API.

pub mod job;
