//! Shared types for SwarmCall.
//!
//! Error and configuration types used by the wire protocol crate and the
//! CLI. It contains no protocol logic.

pub mod config;
pub mod error;
