//! Repository Module
//!
//! State layer for the server.
//! Jobs live in memory only and are lost on restart.

pub mod job;

// Re-export for convenience
pub use job::{JobRegistry, RegistryError};
