//! An ordered, decoded instruction sequence

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::instruction::Instruction;

/// Instructions in program (or trace) order
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Total encoded size in bytes
    pub fn byte_count(&self) -> usize {
        self.instructions.iter().map(Instruction::size_bytes).sum()
    }

    /// Addresses of all instructions
    pub fn addresses(&self) -> HashSet<u64> {
        self.instructions.iter().map(Instruction::address).collect()
    }

    /// Look up an instruction by address
    pub fn find(&self, address: u64) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.address() == address)
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}
