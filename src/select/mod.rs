//! Candidate scoring and selection

pub mod matcher;
pub mod metric;
pub mod selector;

pub use matcher::{match_at, MatchOutcome};
pub use metric::{relative_improvement, FrequencyAveraging, Objective, ScoringConfig};
pub use selector::{ScoredCandidate, Selector};
