//! Fusion candidate generation
//!
//! [`FusionEngine`] walks a decoded instruction sequence once per pass and
//! proposes chains that fit a [`Format`]; [`merge`] reduces them to one
//! candidate per template.

pub mod candidate;
pub mod engine;
pub mod format;
pub mod merge;

pub use candidate::{CandidateSignature, FusionCandidate};
pub use engine::{FusionConfig, FusionEngine};
pub use format::{Format, Width};
pub use merge::{merge, CandidateSet};
