//! CoreDSL instruction-set descriptions of the selected candidates

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::fusion::{FusionCandidate, Width};

use super::behavior;
use super::layout::{immediate_field, source_field, Layout};
use super::opcode::OpcodeSpace;

/// Naming of the generated instruction set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsaConfig {
    /// Instruction-set name
    pub name: String,
    /// Base instruction set it extends
    pub base: String,
    /// Description of the base instruction set to import
    pub import_path: String,
    /// Assembly mnemonics are `<prefix><width>.<template>`
    pub mnemonic_prefix: String,
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self {
            name: "ARISE".to_string(),
            base: "RV32I".to_string(),
            import_path: "../../common/cdsl/rv_base/RV32I.core_desc".to_string(),
            mnemonic_prefix: "arise".to_string(),
        }
    }
}

/// A fused instruction ready to be written out
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedInstruction {
    /// Upper-case instruction name, e.g. `ADDI_ADD`
    pub name: String,
    /// Assembly mnemonic, e.g. `arise32.addi_add`
    pub mnemonic: String,
    /// Assembly operand template
    pub operands: String,
    pub layout: Layout,
    pub behavior: String,
}

impl EncodedInstruction {
    /// `{"<mnemonic>", "<operands>"}`
    pub fn assembly(&self) -> String {
        format!("{{\"{}\", \"{}\"}}", self.mnemonic, self.operands)
    }

    pub fn encoding(&self) -> String {
        self.layout.to_string()
    }
}

impl fmt::Display for EncodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    {} {{", self.name)?;
        writeln!(f, "      encoding: {};", self.layout)?;
        writeln!(f, "      assembly: {};", self.assembly())?;
        writeln!(f, "      behavior: {{")?;
        writeln!(f, "        {};", self.behavior)?;
        writeln!(f, "      }}")?;
        writeln!(f, "    }}")
    }
}

/// Assembly operand template: destination, sources, then immediates
fn operand_template(candidate: &FusionCandidate) -> String {
    let mut operands = Vec::new();
    if candidate.out_reg().is_some() {
        operands.push("{name(rd)}".to_string());
    }
    for index in 0..candidate.in_regs().len() {
        operands.push(format!("{{name({})}}", source_field(index)));
    }
    for index in 0..candidate.format().immediate_widths().len() {
        operands.push(format!("{{{}}}", immediate_field(index)));
    }
    operands.join(", ")
}

/// Turns ranked candidates of one width into encoded instructions
pub struct Encoder<'a> {
    isa: &'a IsaConfig,
    space: OpcodeSpace,
}

impl<'a> Encoder<'a> {
    pub fn new(isa: &'a IsaConfig, width: Width, opcode_len: u32) -> Result<Self> {
        Ok(Self {
            isa,
            space: OpcodeSpace::new(width, opcode_len)?,
        })
    }

    pub fn width(&self) -> Width {
        self.space.width()
    }

    /// Opcodes available to this width
    pub fn capacity(&self) -> usize {
        self.space.capacity()
    }

    /// Encode `candidate` as the `index`-th instruction of the set
    pub fn encode(&self, candidate: &FusionCandidate, index: usize) -> Result<EncodedInstruction> {
        let width = candidate.format().width();
        if width != self.width() {
            return Err(SynthesisError::WidthMismatch {
                name: candidate.name(),
                assigned: width.bits(),
                expected: self.width().bits(),
            });
        }

        let assignment = self.space.assign(index)?;
        Ok(EncodedInstruction {
            name: candidate.name().to_uppercase(),
            mnemonic: format!("{}{}.{}", self.isa.mnemonic_prefix, width.bits(), candidate.name()),
            operands: operand_template(candidate),
            layout: Layout::build(candidate, &assignment)?,
            behavior: behavior::render(candidate)?,
        })
    }

    /// Encode candidates in rank order, assigning opcodes from index 0
    pub fn encode_all<'c, I>(&self, candidates: I) -> Result<Vec<EncodedInstruction>>
    where
        I: IntoIterator<Item = &'c FusionCandidate>,
    {
        candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| self.encode(candidate, index))
            .collect()
    }
}

/// A complete instruction-set description
pub struct Document<'a> {
    pub isa: &'a IsaConfig,
    pub instructions: &'a [EncodedInstruction],
}

impl<'a> Document<'a> {
    pub fn new(isa: &'a IsaConfig, instructions: &'a [EncodedInstruction]) -> Self {
        Self { isa, instructions }
    }
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "import \"{}\"", self.isa.import_path)?;
        writeln!(f)?;
        writeln!(f, "InstructionSet {} extends {} {{", self.isa.name, self.isa.base)?;
        writeln!(f, "  instructions {{")?;
        for instruction in self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        writeln!(f, "  }}")?;
        write!(f, "}}")
    }
}
