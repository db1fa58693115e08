//! Bitfield layout of a fused instruction

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::fusion::FusionCandidate;
use crate::model::RegisterCatalog;

use super::opcode::OpcodeAssignment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Major,
    Destination,
    Source,
    Immediate,
    Padding,
    Opcode,
}

/// One field of an encoding
///
/// Constant fields carry their bits in `literal`; operand fields are named.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitField {
    pub kind: FieldKind,
    pub name: String,
    pub bits: u32,
    pub literal: Option<String>,
}

impl BitField {
    fn operand(kind: FieldKind, name: String, bits: u32) -> Self {
        Self {
            kind,
            name,
            bits,
            literal: None,
        }
    }

    fn constant(kind: FieldKind, literal: String) -> Self {
        Self {
            kind,
            name: String::new(),
            bits: literal.len() as u32,
            literal: Some(literal),
        }
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{}'b{}", self.bits, literal),
            None => write!(f, "{}[{}:0]", self.name, self.bits - 1),
        }
    }
}

/// Name of the `index`-th register source field (0-based): `rs1`, `rs2`, ...
pub fn source_field(index: usize) -> String {
    format!("rs{}", index + 1)
}

/// Name of the `index`-th immediate field (0-based): `imm`, `imm2`, ...
pub fn immediate_field(index: usize) -> String {
    match index {
        0 => "imm".to_string(),
        _ => format!("imm{}", index + 1),
    }
}

/// Fields from the most significant bit down
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    fields: Vec<BitField>,
}

impl Layout {
    /// Lay out `candidate` with `assignment` as its opcode
    ///
    /// Order, high to low: major field (48-bit), destination, sources
    /// (last-needed first), immediates (last-declared first), zero padding,
    /// opcode. The result covers the target width exactly.
    ///
    /// Immediate fields keep the widths the format budgeted. The format
    /// reserves the length-selector bits, so those bits become zero padding
    /// here and are not folded into the last immediate. A 32-bit encoding
    /// therefore carries `2'b00` and its last immediate is 2 bits narrower
    /// than a layout that widens it to fill the word.
    pub fn build(candidate: &FusionCandidate, assignment: &OpcodeAssignment) -> Result<Self> {
        let width = candidate.format().width();
        let register_bits = RegisterCatalog::width(width.uses_compressed_registers());
        let mut fields = Vec::new();

        if let Some(major) = &assignment.major {
            fields.push(BitField::constant(FieldKind::Major, major.clone()));
        }
        if candidate.out_reg().is_some() {
            fields.push(BitField::operand(FieldKind::Destination, "rd".to_string(), register_bits));
        }
        for index in (0..candidate.in_regs().len()).rev() {
            fields.push(BitField::operand(FieldKind::Source, source_field(index), register_bits));
        }
        for (index, &bits) in candidate.format().immediate_widths().iter().enumerate().rev() {
            fields.push(BitField::operand(FieldKind::Immediate, immediate_field(index), bits));
        }

        let used: u32 = fields.iter().map(|f| f.bits).sum::<u32>() + assignment.opcode.len() as u32;
        let mismatch = || SynthesisError::WidthMismatch {
            name: candidate.name(),
            assigned: used,
            expected: width.bits(),
        };
        let padding = width.bits().checked_sub(used).ok_or_else(mismatch)?;
        if padding > 0 {
            fields.push(BitField::constant(FieldKind::Padding, "0".repeat(padding as usize)));
        }
        fields.push(BitField::constant(FieldKind::Opcode, assignment.opcode.clone()));

        let layout = Self { fields };
        if layout.total_bits() != width.bits() {
            return Err(mismatch());
        }
        Ok(layout)
    }

    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    pub fn total_bits(&self) -> u32 {
        self.fields.iter().map(|f| f.bits).sum()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" :: ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
