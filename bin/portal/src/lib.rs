//! Command-line front end for the smile-portal dashboard.
//!
//! The binary drives the same session lifecycle a browser front end would:
//! it restores the session from stored credentials, evaluates route guards,
//! and performs CRUD calls through the refreshing API client.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod navigator;
