//! Cargo workspace integration
//!
//! - **metadata**: Resolved dependency graph and package version via cargo_metadata

pub mod metadata;
