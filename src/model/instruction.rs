//! Decoded instruction records and mnemonic classification

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};

use super::immediate::Immediate;
use super::register::{Register, RegisterCatalog};

/// Store mnemonics; none of their operands is a destination
pub const STORES: &[&str] = &[
    "sd", "sw", "sh", "sb", "sbu", "shu", "fsd", "fsw", "swsp", "c.sd", "c.sw", "c.swsp",
    "c.sdsp", "c.fsw", "c.fsd", "c.fswsp", "c.fsdsp",
];

/// Load mnemonics
pub const LOADS: &[&str] = &[
    "ld", "lw", "lh", "lb", "lbu", "lhu", "lwu", "fld", "flw", "lwsp", "c.ld", "c.lw", "c.lwsp",
    "c.ldsp", "c.flw", "c.fld", "c.flwsp", "c.fldsp",
];

/// Compressed read-modify-write forms whose first operand is also a source
pub const DUP_COMPRESSED: &[&str] = &[
    "c.addi", "c.add", "c.subi", "c.sub", "c.andi", "c.and", "c.or", "c.ori", "c.slli", "c.lui",
    "c.srai", "c.srli", "c.xori", "c.xor",
];

/// Control transfers that end a straight-line chain
pub const BRANCHES: &[&str] = &[
    "j", "jal", "jalr", "jr", "ret", "call", "tail", "beqz", "beq", "bnez", "bne", "blez", "blt",
    "bltz", "bge", "bgez", "bgtz", "bgt", "bgtu", "bltu", "ble", "bleu", "bgeu",
];

/// Load-immediate forms
pub const LOAD_IMMEDIATES: &[&str] = &["li", "lui"];

/// Multiply/divide forms allowed to follow a load-immediate in a chain
pub const MUL_DIV: &[&str] = &["mul", "div"];

/// A single decoded instruction
///
/// Operands are kept in assembly order; the first operand is the destination
/// unless the mnemonic says otherwise (see [`Instruction::has_destination`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    address: u64,
    opcode: String,
    mnemonic: String,
    base_mnemonic: String,
    operands: Vec<Register>,
    immediate: Option<Immediate>,
}

impl Instruction {
    /// Create an instruction without operands
    ///
    /// Odd-length opcodes are left-padded with `0`. Opcodes of 16 digits or more
    /// are bit strings and must be a multiple of 16 digits long.
    pub fn new(address: u64, opcode: &str, mnemonic: &str) -> Result<Self> {
        let mut opcode = opcode.to_string();
        if opcode.is_empty() {
            return Err(SynthesisError::InvalidOpcode {
                opcode,
                reason: "empty opcode",
            });
        }
        if opcode.len() % 2 != 0 {
            opcode.insert(0, '0');
        }
        if opcode.len() >= 16 && opcode.len() % 16 != 0 {
            return Err(SynthesisError::InvalidOpcode {
                opcode,
                reason: "bit-string opcodes must be a multiple of 16 digits",
            });
        }

        Ok(Self {
            address,
            opcode,
            mnemonic: mnemonic.to_string(),
            base_mnemonic: base_mnemonic(mnemonic),
            operands: Vec::new(),
            immediate: None,
        })
    }

    /// Append a register operand
    pub fn with_register(mut self, register: Register) -> Self {
        self.operands.push(register);
        self
    }

    /// Attach the immediate operand
    pub fn with_immediate(mut self, immediate: Immediate) -> Result<Self> {
        self.set_immediate(immediate, &immediate.to_string())?;
        Ok(self)
    }

    /// Append a raw operand token
    ///
    /// Registers are resolved through the catalog, then immediates are tried.
    /// Other tokens (symbols, branch targets) are ignored.
    pub fn append_operand(&mut self, token: &str) -> Result<()> {
        if let Some(register) = RegisterCatalog::lookup(token, false) {
            self.operands.push(register);
        } else if let Some(immediate) = Immediate::parse(token) {
            self.set_immediate(immediate, token)?;
        }
        Ok(())
    }

    fn set_immediate(&mut self, immediate: Immediate, token: &str) -> Result<()> {
        if self.immediate.is_some() {
            return Err(SynthesisError::DuplicateImmediate {
                address: self.address,
                mnemonic: self.mnemonic.clone(),
                token: token.to_string(),
            });
        }
        self.immediate = Some(immediate);
        Ok(())
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Mnemonic without the `c.` prefix and the implicit `sp` suffix
    pub fn base_mnemonic(&self) -> &str {
        &self.base_mnemonic
    }

    /// Raw register operands in assembly order
    pub fn operands(&self) -> &[Register] {
        &self.operands
    }

    pub fn immediate(&self) -> Option<Immediate> {
        self.immediate
    }

    pub fn has_immediate(&self) -> bool {
        self.immediate.is_some()
    }

    pub fn is_store(&self) -> bool {
        STORES.contains(&self.mnemonic.as_str())
    }

    /// Load or store, by raw or base mnemonic
    pub fn is_memory_access(&self) -> bool {
        [self.mnemonic.as_str(), self.base_mnemonic.as_str()]
            .iter()
            .any(|m| LOADS.contains(m) || STORES.contains(m))
    }

    pub fn is_duplicated_compressed(&self) -> bool {
        DUP_COMPRESSED.contains(&self.mnemonic.as_str())
    }

    pub fn is_branch_class(&self) -> bool {
        BRANCHES.contains(&self.base_mnemonic.as_str())
    }

    pub fn is_floating_point(&self) -> bool {
        self.base_mnemonic.starts_with('f')
    }

    pub fn is_load_immediate(&self) -> bool {
        LOAD_IMMEDIATES.contains(&self.base_mnemonic.as_str())
    }

    pub fn is_mul_div(&self) -> bool {
        MUL_DIV.contains(&self.base_mnemonic.as_str())
    }

    pub fn has_destination(&self) -> bool {
        !self.is_store() && !self.operands.is_empty()
    }

    /// First operand when the instruction writes a register
    pub fn destination(&self) -> Option<Register> {
        if self.has_destination() {
            self.operands.first().copied()
        } else {
            None
        }
    }

    /// Registers read by this instruction
    pub fn sources(&self) -> &[Register] {
        if self.is_store() || self.is_duplicated_compressed() {
            return &self.operands;
        }
        self.operands.get(1..).unwrap_or(&[])
    }

    /// Whether any source is one of `registers`
    pub fn reads_any(&self, registers: &[Register]) -> bool {
        self.sources().iter().any(|src| registers.contains(src))
    }

    /// Encoded size in bytes
    pub fn size_bytes(&self) -> usize {
        if self.opcode.len() < 16 {
            self.opcode.len() / 2
        } else {
            self.opcode.len() / 8
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.size_bytes() == 2
    }
}

/// Strip compressed prefix and stack-pointer suffix so width variants compare equal
pub fn base_mnemonic(mnemonic: &str) -> String {
    mnemonic.replace("c.", "").replace("sp", "")
}
