//! nbrun Core
//!
//! Core types shared by the nbrun server, client, and CLI.
//!
//! This crate contains:
//! - Domain types: the job record and its state machine
//! - DTOs: request/response shapes for the HTTP API

pub mod domain;
pub mod dto;
