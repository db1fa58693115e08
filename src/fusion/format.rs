//! Bit-budget accounting for a target instruction width

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::model::RegisterCatalog;

/// Target encoding width
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Width {
    /// 16-bit compressed encodings
    Compressed,
    /// 32-bit standard encodings
    Full,
    /// 48-bit extended encodings
    Extended,
}

/// Constants of the RISC-V length-encoding scheme for one width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WidthTraits {
    /// Total bits
    pub bits: u32,
    /// Low opcode bits spent on telling instruction lengths apart
    pub selector_bits: u32,
    /// Opcode patterns unavailable because they select another length
    pub excluded_patterns: u64,
}

const COMPRESSED: WidthTraits = WidthTraits {
    bits: 16,
    selector_bits: 0,
    excluded_patterns: 1,
};
const FULL: WidthTraits = WidthTraits {
    bits: 32,
    selector_bits: 2,
    excluded_patterns: 1,
};
const EXTENDED: WidthTraits = WidthTraits {
    bits: 48,
    selector_bits: 6,
    excluded_patterns: 0,
};

impl Width {
    pub const ALL: [Width; 3] = [Width::Compressed, Width::Full, Width::Extended];

    pub fn traits(self) -> &'static WidthTraits {
        match self {
            Width::Compressed => &COMPRESSED,
            Width::Full => &FULL,
            Width::Extended => &EXTENDED,
        }
    }

    pub fn bits(self) -> u32 {
        self.traits().bits
    }

    pub fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn selector_bits(self) -> u32 {
        self.traits().selector_bits
    }

    pub fn excluded_patterns(self) -> u64 {
        self.traits().excluded_patterns
    }

    /// Compressed formats use 3-bit register fields
    pub fn uses_compressed_registers(self) -> bool {
        self == Width::Compressed
    }

    pub fn from_bits(bits: u32) -> Option<Width> {
        Self::ALL.into_iter().find(|w| w.bits() == bits)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl FromStr for Width {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u32>()
            .ok()
            .and_then(Width::from_bits)
            .ok_or_else(|| format!("unsupported instruction width '{}' (expected 16, 32 or 48)", s))
    }
}

/// Bit budget of one fused instruction under construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    width: Width,
    opcode_len: u32,
    immediate_widths: Vec<u32>,
}

impl Format {
    /// Create an empty format; the opcode must leave room below the width
    pub fn new(width: Width, opcode_len: u32) -> Result<Self> {
        if width.bits() - width.selector_bits() <= opcode_len {
            return Err(SynthesisError::InfeasibleFormat {
                width: width.bits(),
                selector_bits: width.selector_bits(),
                opcode_len,
            });
        }
        Ok(Self {
            width,
            opcode_len,
            immediate_widths: Vec::new(),
        })
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn opcode_len(&self) -> u32 {
        self.opcode_len
    }

    /// Widths of the immediate fields in declaration order
    pub fn immediate_widths(&self) -> &[u32] {
        &self.immediate_widths
    }

    /// Sum of all immediate field widths
    pub fn total_immediate_bits(&self) -> u32 {
        self.immediate_widths.iter().sum()
    }

    /// Bits left for register fields
    pub fn available_bits(&self) -> i64 {
        self.width.bits() as i64
            - self.opcode_len as i64
            - self.width.selector_bits() as i64
            - self.total_immediate_bits() as i64
    }

    /// Custom opcodes this width can address
    pub fn available_slots(&self) -> u64 {
        (1u64 << self.opcode_len).saturating_sub(self.width.excluded_patterns())
    }

    pub fn max_codeable_registers(&self, extra_fixed_bits: u32, compressed: bool) -> i64 {
        let register_bits = RegisterCatalog::width(compressed) as i64;
        (self.available_bits() - extra_fixed_bits as i64).div_euclid(register_bits)
    }

    /// Bits left after `register_count` register fields; may be negative
    pub fn remaining_bits(&self, extra_fixed_bits: u32, register_count: usize, compressed: bool) -> i64 {
        let register_bits = RegisterCatalog::width(compressed) as i64 * register_count as i64;
        self.available_bits() - extra_fixed_bits as i64 - register_bits
    }

    pub(crate) fn push_immediate(&mut self, bits: u32) {
        self.immediate_widths.push(bits.max(1));
    }

    /// Grow the last immediate field by everything the registers leave over
    ///
    /// Returns the remaining bits before widening. The field never shrinks
    /// below one bit, even when the budget is already overdrawn.
    pub(crate) fn absorb_remaining(&mut self, register_count: usize) -> i64 {
        let remaining = self.remaining_bits(0, register_count, self.width.uses_compressed_registers());
        if let Some(last) = self.immediate_widths.last_mut() {
            *last = (*last as i64 + remaining).max(1) as u32;
        }
        remaining
    }
}
