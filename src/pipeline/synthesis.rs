//! End-to-end synthesis: fuse, merge, select and encode per target width

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::disasm::FrequencyMap;
use crate::encoding::{Document, EncodedInstruction, Encoder};
use crate::error::Result;
use crate::fusion::{merge, Format, FusionEngine, Width};
use crate::model::Program;
use crate::select::{relative_improvement, Objective, ScoredCandidate, Selector};

use super::config::SynthesisConfig;

/// Selected and encoded instructions for one width
#[derive(Clone, Debug)]
pub struct WidthOutcome {
    pub width: Width,
    /// Ranked candidates that received an opcode
    pub selected: Vec<ScoredCandidate>,
    /// Encodings of `selected`, same order
    pub encoded: Vec<EncodedInstruction>,
    /// Ranked candidates left over once the opcode space ran out
    pub dropped: usize,
    /// Rendered instruction-set description
    pub document: String,
}

impl WidthOutcome {
    /// Sum of the selected candidates' scores
    pub fn total_improvement(&self) -> f64 {
        self.selected.iter().map(|s| s.score).sum()
    }
}

/// Result of a synthesis run over one program
#[derive(Clone, Debug)]
pub struct SynthesisOutcome {
    pub objective: Objective,
    /// Scores were weighted by execution counts
    pub dynamic: bool,
    pub instruction_count: usize,
    /// Quantity the improvements are relative to
    pub baseline: f64,
    pub widths: Vec<WidthOutcome>,
}

impl SynthesisOutcome {
    /// `improvement` as a percentage of the baseline
    pub fn relative(&self, improvement: f64) -> f64 {
        relative_improvement(improvement, self.baseline)
    }

    /// Whether nothing was generated
    pub fn is_empty(&self) -> bool {
        self.widths.iter().all(|w| w.selected.is_empty())
    }

    pub fn width(&self, width: Width) -> Option<&WidthOutcome> {
        self.widths.iter().find(|w| w.width == width)
    }
}

/// Runs the synthesis stages for every configured width
pub struct SynthesisPipeline {
    config: SynthesisConfig,
}

impl SynthesisPipeline {
    /// Create a pipeline with default configuration
    pub fn new() -> Self {
        Self::with_config(SynthesisConfig::default())
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesize instruction sets for `program`
    ///
    /// # Arguments
    ///
    /// * `program` - Decoded instructions in program order
    /// * `frequencies` - Execution counts; `None` or empty scores statically
    ///
    /// # Returns
    ///
    /// One [`WidthOutcome`] per configured width. An empty program yields an
    /// outcome without widths.
    pub fn run(&self, program: &Program, frequencies: Option<&FrequencyMap>) -> Result<SynthesisOutcome> {
        let selector = Selector::new(self.config.objective, &self.config.scoring, frequencies);
        let mut outcome = SynthesisOutcome {
            objective: self.config.objective,
            dynamic: selector.is_dynamic(),
            instruction_count: program.len(),
            baseline: self.config.objective.baseline(program, frequencies),
            widths: Vec::new(),
        };

        if program.is_empty() {
            warn!("no instructions to synthesize from");
            return Ok(outcome);
        }

        for &width in &self.config.widths {
            let result = self.run_width(program, &selector, width)?;
            info!(
                width = width.bits(),
                selected = result.selected.len(),
                dropped = result.dropped,
                improvement = result.total_improvement(),
                relative = outcome.relative(result.total_improvement()),
                "instruction set synthesized"
            );
            outcome.widths.push(result);
        }
        Ok(outcome)
    }

    /// All stages for a single width
    pub fn run_width(&self, program: &Program, selector: &Selector<'_>, width: Width) -> Result<WidthOutcome> {
        let instructions = program.instructions();
        let engine = FusionEngine::new(&self.config.fusion, width)?;
        let encoder = Encoder::new(&self.config.isa, width, self.config.fusion.opcode_len)?;
        let slots = Format::new(width, self.config.fusion.opcode_len)?.available_slots();

        let start = Instant::now();
        let generated = engine.generate_all(instructions)?;
        debug!(
            width = width.bits(),
            candidates = generated.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "generation finished"
        );

        let start = Instant::now();
        let merged = merge(generated);
        debug!(
            width = width.bits(),
            candidates = merged.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "merge finished"
        );

        let start = Instant::now();
        let capacity = usize::try_from(slots).unwrap_or(usize::MAX);
        let mut selected = selector.select(instructions, merged, capacity);
        debug!(
            width = width.bits(),
            selected = selected.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "selection finished"
        );

        let dropped = selected.len().saturating_sub(encoder.capacity());
        if dropped > 0 {
            warn!(
                width = width.bits(),
                dropped,
                opcodes = encoder.capacity(),
                "opcode space exhausted, dropping lowest-ranked candidates"
            );
            selected.truncate(encoder.capacity());
        }

        let start = Instant::now();
        let encoded = encoder.encode_all(selected.iter().map(|s| &s.candidate))?;
        let document = Document::new(&self.config.isa, &encoded).to_string();
        debug!(
            width = width.bits(),
            encoded = encoded.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "encoding finished"
        );

        Ok(WidthOutcome {
            width,
            selected,
            encoded,
            dropped,
            document,
        })
    }
}

impl Default for SynthesisPipeline {
    fn default() -> Self {
        Self::new()
    }
}
