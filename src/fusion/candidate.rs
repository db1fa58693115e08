//! Fusion candidates: chains of instructions proposed as one custom instruction

use std::fmt;

use crate::model::{Immediate, Instruction, Register};

use super::format::Format;

/// Shape key used to deduplicate candidates
///
/// Two candidates with the same template and the same number of input,
/// output and immediate fields encode identically, whatever registers or
/// immediate values they were discovered with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateSignature {
    pub template: Vec<String>,
    pub inputs: usize,
    pub outputs: usize,
    pub immediates: usize,
}

/// A chain of straight-line instructions fused under one [`Format`]
#[derive(Clone, Debug)]
pub struct FusionCandidate {
    /// Member instructions in program order
    instructions: Vec<Instruction>,
    /// Base mnemonics of the members
    template: Vec<String>,
    /// Bit budget, owned by this chain alone
    format: Format,
    /// External inputs in the order they were first needed
    in_regs: Vec<Register>,
    /// Live output; a fused instruction has one destination at most
    out_reg: Option<Register>,
    immediates: Vec<Immediate>,
    /// Whether the last step consumed the previous step's result
    connected: bool,
}

impl FusionCandidate {
    /// Create an empty chain
    pub fn new(format: Format) -> Self {
        Self {
            instructions: Vec::new(),
            template: Vec::new(),
            format,
            in_regs: Vec::new(),
            out_reg: None,
            immediates: Vec::new(),
            connected: false,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn template(&self) -> &[String] {
        &self.template
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub(crate) fn format_mut(&mut self) -> &mut Format {
        &mut self.format
    }

    pub fn in_regs(&self) -> &[Register] {
        &self.in_regs
    }

    pub fn out_reg(&self) -> Option<Register> {
        self.out_reg
    }

    pub fn immediates(&self) -> &[Immediate] {
        &self.immediates
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of outputs (0 or 1)
    pub fn out_count(&self) -> usize {
        usize::from(self.out_reg.is_some())
    }

    /// Register fields the encoding needs
    pub fn coded_registers(&self) -> usize {
        self.in_regs.len() + self.out_count()
    }

    /// Width of the last immediate field, if any
    pub fn final_immediate_width(&self) -> Option<u32> {
        self.format.immediate_widths().last().copied()
    }

    /// Sum of all immediate field widths
    pub fn total_immediate_width(&self) -> u32 {
        self.format.total_immediate_bits()
    }

    /// Template joined with underscores, e.g. `addi_add`
    pub fn name(&self) -> String {
        self.template.join("_")
    }

    pub fn signature(&self) -> CandidateSignature {
        CandidateSignature {
            template: self.template.clone(),
            inputs: self.in_regs.len(),
            outputs: self.out_count(),
            immediates: self.format.immediate_widths().len(),
        }
    }

    /// Sources of `instruction` that are the live output
    pub(crate) fn captured_output(&self, instruction: &Instruction) -> Vec<Register> {
        match self.out_reg {
            Some(out) if instruction.sources().contains(&out) => vec![out],
            _ => Vec::new(),
        }
    }

    /// Distinct sources of `instruction` that are not in `captured`
    pub(crate) fn new_inputs(instruction: &Instruction, captured: &[Register]) -> Vec<Register> {
        let mut fresh = Vec::new();
        for src in instruction.sources() {
            if !captured.contains(src) && !fresh.contains(src) {
                fresh.push(*src);
            }
        }
        fresh
    }

    /// Append `instruction` as the next member
    ///
    /// The first member contributes all of its sources as inputs; later
    /// members only contribute the sources the chain does not already produce.
    pub(crate) fn push(&mut self, instruction: &Instruction) {
        let captured = self.captured_output(instruction);
        let fresh = Self::new_inputs(instruction, &captured);

        if self.instructions.is_empty() {
            self.in_regs = instruction.sources().to_vec();
        } else {
            self.in_regs.extend(fresh.iter().copied());
        }
        self.connected = instruction.sources().len() > fresh.len();
        self.out_reg = instruction.destination();
        self.template.push(instruction.base_mnemonic().to_string());

        if let Some(imm) = instruction.immediate() {
            self.immediates.push(imm);
            self.format.push_immediate(imm.needed_bits());
        }
        self.instructions.push(instruction.clone());
    }
}

impl fmt::Display for FusionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} (in: {}, out: {}, imms: {})",
            self.format.width(),
            self.name(),
            self.in_regs.len(),
            self.out_count(),
            self.format.immediate_widths().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::format::Width;
    use crate::model::RegisterCatalog;

    fn reg(name: &str) -> Register {
        RegisterCatalog::lookup(name, false).unwrap()
    }

    fn inst(mnemonic: &str, operands: &[&str]) -> Instruction {
        let mut instruction = Instruction::new(0x100, "00a50533", mnemonic).unwrap();
        for operand in operands {
            instruction.append_operand(operand).unwrap();
        }
        instruction
    }

    fn empty() -> FusionCandidate {
        FusionCandidate::new(Format::new(Width::Full, 9).unwrap())
    }

    #[test]
    fn test_first_member_takes_all_sources() {
        let mut chain = empty();
        chain.push(&inst("add", &["a0", "a1", "a1"]));

        assert_eq!(chain.in_regs(), &[reg("a1"), reg("a1")]);
        assert_eq!(chain.out_reg(), Some(reg("a0")));
        assert_eq!(chain.coded_registers(), 3);
        assert!(chain.is_connected());
    }

    #[test]
    fn test_second_member_adds_only_new_inputs() {
        let mut chain = empty();
        chain.push(&inst("addi", &["a0", "a0", "4"]));
        chain.push(&inst("add", &["a2", "a2", "a0"]));

        assert_eq!(chain.template(), &["addi".to_string(), "add".to_string()]);
        assert_eq!(chain.in_regs(), &[reg("a0"), reg("a2")]);
        assert_eq!(chain.out_reg(), Some(reg("a2")));
        assert!(chain.is_connected());
        assert_eq!(chain.format().immediate_widths(), &[2]);
        assert_eq!(chain.name(), "addi_add");
    }

    #[test]
    fn test_signature_ignores_register_identity() {
        let mut a = empty();
        a.push(&inst("addi", &["a0", "a0", "4"]));
        let mut b = empty();
        b.push(&inst("addi", &["t1", "t2", "0x7ff"]));

        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.final_immediate_width(), b.final_immediate_width());
    }

    #[test]
    fn test_display() {
        let mut chain = empty();
        chain.push(&inst("c.addi", &["a0", "4"]));
        assert_eq!(chain.to_string(), "32.addi (in: 1, out: 1, imms: 1)");
    }
}
