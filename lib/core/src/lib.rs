//! Core types and utilities for the smile-portal dashboard client.
//!
//! This crate provides the foundational types and error handling shared by
//! the HTTP client, the session layer, and the command-line front end.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, RecordId};
