//! What gets released: version identifier, descriptive metadata, and the
//! artifact set of build outputs

pub mod artifacts;
pub mod metadata;
pub mod version;

pub use artifacts::{Artifact, ArtifactKind, ArtifactSet};
pub use metadata::ReleaseMetadata;
pub use version::Version;
