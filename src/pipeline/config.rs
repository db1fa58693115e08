//! Synthesis run configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::disasm::DecodeConfig;
use crate::encoding::IsaConfig;
use crate::fusion::{FusionConfig, Width};
use crate::select::{Objective, ScoringConfig};

/// Configuration for a whole synthesis run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Target encoding widths, one instruction set each
    pub widths: Vec<Width>,
    /// What the selection optimizes
    pub objective: Objective,
    /// Chain building
    pub fusion: FusionConfig,
    /// Candidate scoring
    pub scoring: ScoringConfig,
    /// Naming of the generated instruction sets
    pub isa: IsaConfig,
    /// Input decoding and filtering
    pub decode: DecodeConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            widths: vec![Width::Full, Width::Extended],
            objective: Objective::default(),
            fusion: FusionConfig::default(),
            scoring: ScoringConfig::default(),
            isa: IsaConfig::default(),
            decode: DecodeConfig::default(),
        }
    }
}

impl SynthesisConfig {
    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).with_context(|| format!("Failed to open config {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader).with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
