//! Quality gate (stage 2 of the release pipeline)
//!
//! A fixed, versioned rule set runs over the whole source tree. Only the
//! rule-set identity, rule properties and suppressions are configurable; any
//! violation blocks the release.

pub mod engine;
pub mod gate;
pub mod rules;

pub use engine::{QualityReport, Severity, Violation};
pub use gate::QualityGate;
