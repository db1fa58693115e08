//! Greedy chain builder

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SynthesisError};
use crate::model::{Instruction, Register};

use super::candidate::FusionCandidate;
use super::format::{Format, Width};
use super::merge::CandidateSet;

/// Base opcode bits every custom instruction spends
pub const BASE_OPCODE_LEN: u32 = 7;
/// Extra opcode bits selecting among custom instructions
pub const CUSTOM_OPCODE_LEN: u32 = 2;

/// Mnemonics that never take part in a fused instruction
pub const DEFAULT_IGNORED: &[&str] = &[
    "auipc", "mv", "nop", "addi4spn", "c.addi4spn", "addi4n", "c.addi4n", "addi16sp",
    "c.addi16sp", "addi16", "c.addi16", "beqz", "bnez", "blez", "bgez", "bltz", "bgtz", "bltu",
    "bgt", "ble", "blt", "bge", "bgtu", "bleu", "beq", "bne", "bgeu", "j", "jal", "jr", "jalr",
    "ret", "call", "tail", "fence", "mulh", "mulhu", "mulw",
];

/// Mnemonics that may start a chain but never be its second member
pub const DEFAULT_FORBIDDEN_SECOND: &[&str] = &["mv", "nop", "li", "lui"];

/// Chain-building configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Opcode field length of the fused instructions
    pub opcode_len: u32,
    /// Skip loads and stores
    pub ignore_memory_ops: bool,
    /// Base mnemonics skipped entirely
    pub ignored_mnemonics: Vec<String>,
    /// Base mnemonics forbidden as the second chain member
    pub forbidden_second: Vec<String>,
    /// One engine pass per entry, with `single_immediate_only` set to it
    pub single_immediate_passes: Vec<bool>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            opcode_len: BASE_OPCODE_LEN + CUSTOM_OPCODE_LEN,
            ignore_memory_ops: true,
            ignored_mnemonics: DEFAULT_IGNORED.iter().map(|m| m.to_string()).collect(),
            forbidden_second: DEFAULT_FORBIDDEN_SECOND.iter().map(|m| m.to_string()).collect(),
            single_immediate_passes: vec![true, false],
        }
    }
}

/// Builds fusion candidates for one target width
///
/// A single left-to-right pass keeps one open chain. Each instruction either
/// extends the chain (when it consumes the chain's live output and still fits
/// the bit budget) or closes it. Closed chains are collected by signature.
pub struct FusionEngine<'a> {
    config: &'a FusionConfig,
    /// Empty format every new chain starts from
    blank: Format,
}

impl<'a> FusionEngine<'a> {
    /// Create an engine, validating that the opcode fits the width
    pub fn new(config: &'a FusionConfig, width: Width) -> Result<Self> {
        Ok(Self {
            config,
            blank: Format::new(width, config.opcode_len)?,
        })
    }

    pub fn width(&self) -> Width {
        self.blank.width()
    }

    /// Run every configured pass and union the results
    pub fn generate_all(&self, instructions: &[Instruction]) -> Result<CandidateSet> {
        let mut all = CandidateSet::new();
        for &single_immediate_only in &self.config.single_immediate_passes {
            let found = self.generate(instructions, single_immediate_only)?;
            debug!(
                width = self.width().bits(),
                single_immediate_only,
                candidates = found.len(),
                "fusion pass finished"
            );
            all.extend(found);
        }
        Ok(all)
    }

    /// One greedy pass over `instructions`
    ///
    /// # Arguments
    ///
    /// * `instructions` - Decoded instructions in program order
    /// * `single_immediate_only` - Allow at most one immediate per chain
    pub fn generate(&self, instructions: &[Instruction], single_immediate_only: bool) -> Result<CandidateSet> {
        let mut found = CandidateSet::new();
        let mut chain = self.open_chain();
        let mut retired: Option<Register> = None;

        for instruction in instructions {
            if instruction.is_branch_class() {
                self.close_chain(&mut chain, &mut found, &mut retired)?;
                continue;
            }

            let eligible = !self.is_ignored(instruction) && !self.is_forbidden_second(&chain, instruction);

            if chain.is_empty() {
                if eligible {
                    chain.push(instruction);
                }
                continue;
            }

            let reads_retired = retired.is_some_and(|out| instruction.sources().contains(&out));
            if eligible && !reads_retired && self.can_extend(&chain, instruction, single_immediate_only) {
                chain.push(instruction);
            } else {
                self.close_chain(&mut chain, &mut found, &mut retired)?;
            }
        }

        self.close_chain(&mut chain, &mut found, &mut retired)?;
        Ok(found)
    }

    fn open_chain(&self) -> FusionCandidate {
        FusionCandidate::new(self.blank.clone())
    }

    /// Finalize the open chain and start an empty one
    fn close_chain(
        &self,
        chain: &mut FusionCandidate,
        found: &mut CandidateSet,
        retired: &mut Option<Register>,
    ) -> Result<()> {
        let mut closed = std::mem::replace(chain, self.open_chain());
        if closed.is_empty() {
            return Ok(());
        }

        let coded = closed.coded_registers();
        let remaining = closed.format_mut().absorb_remaining(coded);
        // A lone first member is never budget-checked; longer chains were
        if remaining < 0 && closed.len() > 1 {
            return Err(SynthesisError::BitBudget {
                width: closed.format().width().bits(),
                remaining,
            });
        }

        *retired = closed.out_reg();
        found.insert(closed);
        Ok(())
    }

    /// Instructions dropped from consideration altogether
    fn is_ignored(&self, instruction: &Instruction) -> bool {
        let base = instruction.base_mnemonic();
        self.config.ignored_mnemonics.iter().any(|m| m == base)
            || (self.config.ignore_memory_ops && instruction.is_memory_access())
            || instruction.is_floating_point()
    }

    fn is_forbidden_second(&self, chain: &FusionCandidate, instruction: &Instruction) -> bool {
        let Some(first) = chain.instructions().first() else {
            return false;
        };
        let base = instruction.base_mnemonic();
        self.config.forbidden_second.iter().any(|m| m == base)
            || (first.is_load_immediate() && (instruction.has_immediate() || !instruction.is_mul_div()))
    }

    /// Whether `instruction` continues the chain's dataflow within budget
    fn can_extend(&self, chain: &FusionCandidate, instruction: &Instruction, single_immediate_only: bool) -> bool {
        if !instruction.has_destination() {
            return false;
        }
        if single_immediate_only && instruction.has_immediate() && !chain.immediates().is_empty() {
            return false;
        }

        let captured = chain.captured_output(instruction);
        if captured.is_empty() {
            return false;
        }
        let fresh = FusionCandidate::new_inputs(instruction, &captured);
        let register_count = chain.coded_registers() + fresh.len() - captured.len() + 1;

        let format = chain.format();
        let mut remaining =
            format.remaining_bits(0, register_count, format.width().uses_compressed_registers());
        if let Some(imm) = instruction.immediate() {
            remaining -= imm.needed_bits() as i64;
        }
        remaining >= 0
    }
}
