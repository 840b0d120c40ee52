//! CLI commands for cargo-quay
//!
//! - **release**: Run the full pipeline and publish
//! - **lock**: Verify the lock snapshot, or re-lock with `--write`
//! - **quality**: Run the quality gate on its own
//! - **channel**: Show which channel and target a version routes to
//! - **metadata**: Show the release metadata, or fetch the published copy
//!
//! All commands accept `&ReleaseContext` to avoid redundant loads.

pub mod channel;
pub mod lock;
pub mod metadata;
pub mod quality;
pub mod release;

pub use channel::run_channel;
pub use lock::run_lock;
pub use metadata::run_metadata;
pub use quality::run_quality;
pub use release::run_release;
