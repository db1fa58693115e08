//! Report persistence for saving and loading synthesis results

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fusion::Width;
use crate::pipeline::{SynthesisConfig, SynthesisOutcome, WidthOutcome};
use crate::select::Objective;

/// Metadata about one synthesis run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Input the program was decoded from
    pub input: String,
    /// Trace the execution counts came from, if any
    pub trace: Option<String>,
    /// Run timestamp
    pub timestamp: DateTime<Utc>,
    pub objective: Objective,
    /// Scores weighted by execution counts
    pub dynamic: bool,
    /// Decoded instructions
    pub instruction_count: usize,
    /// Quantity the improvements are relative to
    pub baseline: f64,
}

/// One selected instruction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Position in the ranking, starting at 0
    pub rank: usize,
    pub name: String,
    pub template: Vec<String>,
    pub score: f64,
    /// Score as a percentage of the baseline
    pub relative: f64,
    pub encoding: String,
    pub assembly: String,
    pub behavior: String,
}

/// Selected instructions of one width
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidthReport {
    pub width: Width,
    pub entries: Vec<ReportEntry>,
    /// Candidates that did not get an opcode
    pub dropped: usize,
}

impl WidthReport {
    fn from_outcome(outcome: &WidthOutcome, baseline: f64) -> Self {
        let entries = outcome
            .selected
            .iter()
            .zip(&outcome.encoded)
            .enumerate()
            .map(|(rank, (scored, encoded))| ReportEntry {
                rank,
                name: scored.candidate.name(),
                template: scored.candidate.template().to_vec(),
                score: scored.score,
                relative: crate::select::relative_improvement(scored.score, baseline),
                encoding: encoded.encoding(),
                assembly: encoded.assembly(),
                behavior: encoded.behavior.clone(),
            })
            .collect();

        Self {
            width: outcome.width,
            entries,
            dropped: outcome.dropped,
        }
    }

    /// Sum of the entry scores
    pub fn total_improvement(&self) -> f64 {
        self.entries.iter().map(|e| e.score).sum()
    }
}

/// Results for one input
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub widths: Vec<WidthReport>,
}

impl RunReport {
    /// Summarize `outcome` for `input`
    pub fn from_outcome(input: &str, trace: Option<&str>, outcome: &SynthesisOutcome) -> Self {
        Self {
            metadata: RunMetadata {
                input: input.to_string(),
                trace: trace.map(str::to_string),
                timestamp: Utc::now(),
                objective: outcome.objective,
                dynamic: outcome.dynamic,
                instruction_count: outcome.instruction_count,
                baseline: outcome.baseline,
            },
            widths: outcome
                .widths
                .iter()
                .map(|w| WidthReport::from_outcome(w, outcome.baseline))
                .collect(),
        }
    }

    /// Total improvement of `width` relative to the baseline, in percent
    pub fn relative(&self, width: &WidthReport) -> f64 {
        crate::select::relative_improvement(width.total_improvement(), self.metadata.baseline)
    }
}

/// Synthesis results that can be saved and loaded
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisReport {
    /// Report version for compatibility checking
    pub version: String,
    /// Configuration the runs used
    pub config: SynthesisConfig,
    pub runs: Vec<RunReport>,
}

impl SynthesisReport {
    /// Create a new report
    pub fn new(config: SynthesisConfig, runs: Vec<RunReport>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            runs,
        }
    }

    /// Save the report to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let writer = std::io::BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Load a report from a file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        let report = bincode::deserialize_from(reader)?;
        Ok(report)
    }

    /// Save the report as JSON (human-readable)
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load a report from JSON
    pub fn load_json(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        let report = serde_json::from_reader(reader)?;
        Ok(report)
    }

    /// Load either format, choosing by the `.json` extension
    pub fn load_any(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load(path),
        }
    }

    /// Save either format, choosing by the `.json` extension
    pub fn save_any(&self, path: &Path) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.save_json(path),
            _ => self.save(path),
        }
    }

    /// Number of selected instructions across all runs and widths
    pub fn num_instructions(&self) -> usize {
        self.runs
            .iter()
            .flat_map(|r| &r.widths)
            .map(|w| w.entries.len())
            .sum()
    }
}
