//! Core building blocks shared by every cargo-quay command
//!
//! - **config**: quay.toml parsing, validation and resolution into a `PipelineConfig`
//! - **context**: Project root and configuration, built once in main.rs
//! - **error**: Error types, exit codes and contextual help messages
//! - **secret**: Redacted wrapper for credentials

pub mod config;
pub mod context;
pub mod error;
pub mod secret;
