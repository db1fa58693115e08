//! Improvement metrics and dynamic frequency weighting

use serde::{Deserialize, Serialize};

use crate::disasm::FrequencyMap;
use crate::fusion::FusionCandidate;
use crate::model::Program;

use super::matcher::MatchOutcome;

/// What a fused instruction is meant to save
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    /// Bytes of code
    #[default]
    Size,
    /// Executed (or static) instructions
    Count,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Size => "size",
            Objective::Count => "count",
        }
    }

    /// Unit of the improvement figures
    pub fn unit(&self) -> &'static str {
        match self {
            Objective::Size => "bytes",
            Objective::Count => "instructions",
        }
    }

    /// Raw improvement of replacing `outcome` with one `candidate` instruction
    pub fn improvement(&self, candidate: &FusionCandidate, outcome: &MatchOutcome<'_>) -> f64 {
        match self {
            Objective::Size => outcome.byte_count() as f64 - candidate.format().width().bytes() as f64,
            Objective::Count => outcome.matched.len() as f64 - 1.0,
        }
    }

    /// Quantity improvements are measured against
    ///
    /// Statically this is the program's bytes or instructions; with a
    /// non-empty profile it is the executed bytes or instructions.
    pub fn baseline(&self, program: &Program, frequencies: Option<&FrequencyMap>) -> f64 {
        match (self, frequencies.filter(|f| !f.is_empty())) {
            (Objective::Size, None) => program.byte_count() as f64,
            (Objective::Count, None) => program.len() as f64,
            (Objective::Size, Some(profile)) => profile.dynamic_bytes(program) as f64,
            (Objective::Count, Some(profile)) => profile.total() as f64,
        }
    }
}

/// `improvement` as a percentage of `baseline` (0 for an empty baseline)
pub fn relative_improvement(improvement: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    improvement / baseline * 100.0
}

/// Divisor used when averaging execution counts over a match
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyAveraging {
    /// Divide by every matched instruction, profiled or not
    ///
    /// Sequences with partial profiling coverage are underweighted. This is
    /// the historical behavior and stays the default so results remain
    /// comparable with earlier runs.
    #[default]
    AllMatched,
    /// Divide only by the matched instructions present in the profile
    ProfiledOnly,
}

/// Scoring configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub averaging: FrequencyAveraging,
}

/// Average execution count of the matched instructions
pub fn average_count(outcome: &MatchOutcome<'_>, frequencies: &FrequencyMap, averaging: FrequencyAveraging) -> f64 {
    let mut total = 0u64;
    let mut profiled = 0usize;
    for instruction in &outcome.matched {
        if let Some(count) = frequencies.count(instruction.address()) {
            total += count;
            profiled += 1;
        }
    }

    let divisor = match averaging {
        FrequencyAveraging::AllMatched => outcome.matched.len(),
        FrequencyAveraging::ProfiledOnly => profiled,
    };
    if divisor == 0 {
        return 0.0;
    }
    total as f64 / divisor as f64
}
