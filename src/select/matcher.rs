//! Replays a candidate template against the real instruction sequence

use crate::model::{Instruction, Register};

/// Instructions covered by one successful template match
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome<'a> {
    /// Matched instructions in sequence order
    pub matched: Vec<&'a Instruction>,
    /// Needed immediate bits summed over the matched instructions
    pub immediate_bits: u32,
}

impl MatchOutcome<'_> {
    /// Whether the matched immediates fit `allocated` immediate bits
    pub fn fits_immediates(&self, allocated: u32) -> bool {
        self.immediate_bits <= allocated
    }

    /// Encoded size of the matched instructions
    pub fn byte_count(&self) -> usize {
        self.matched.iter().map(|i| i.size_bytes()).sum()
    }
}

/// Match `template` starting at `start`
///
/// Instructions whose base mnemonic is not the next template entry are
/// stepped over, unless they are branches or read a register produced
/// earlier in this match; either of those aborts the match. Returns `None`
/// unless every template entry was matched.
pub fn match_at<'a>(sequence: &'a [Instruction], template: &[String], start: usize) -> Option<MatchOutcome<'a>> {
    if template.is_empty() {
        return None;
    }

    let mut matched = Vec::with_capacity(template.len());
    let mut produced: Vec<Register> = Vec::new();
    let mut immediate_bits = 0;

    for instruction in sequence.get(start..)? {
        if instruction.base_mnemonic() == template[matched.len()] {
            if let Some(imm) = instruction.immediate() {
                immediate_bits += imm.needed_bits();
            }
            produced.extend(instruction.destination());
            matched.push(instruction);
            if matched.len() == template.len() {
                return Some(MatchOutcome {
                    matched,
                    immediate_bits,
                });
            }
        } else if instruction.is_branch_class() || instruction.reads_any(&produced) {
            return None;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(mnemonic: &str, operands: &[&str]) -> Instruction {
        let mut instruction = Instruction::new(0, "00a50533", mnemonic).unwrap();
        for operand in operands {
            instruction.append_operand(operand).unwrap();
        }
        instruction
    }

    fn template(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_contiguous_match() {
        let sequence = vec![inst("addi", &["a0", "a0", "0x10"]), inst("add", &["a1", "a1", "a0"])];
        let outcome = match_at(&sequence, &template(&["addi", "add"]), 0).unwrap();

        assert_eq!(outcome.matched.len(), 2);
        assert_eq!(outcome.immediate_bits, 4);
        assert_eq!(outcome.byte_count(), 8);
        assert!(outcome.fits_immediates(4));
        assert!(!outcome.fits_immediates(3));
    }

    #[test]
    fn test_unrelated_instruction_is_skipped() {
        let sequence = vec![
            inst("addi", &["a0", "a0", "1"]),
            inst("xor", &["t0", "t1", "t2"]),
            inst("add", &["a1", "a1", "a0"]),
        ];
        let outcome = match_at(&sequence, &template(&["addi", "add"]), 0).unwrap();
        assert_eq!(outcome.matched[1].mnemonic(), "add");
    }

    #[test]
    fn test_hazard_aborts_match() {
        let sequence = vec![
            inst("addi", &["a0", "a0", "1"]),
            inst("xor", &["t0", "a0", "t2"]),
            inst("add", &["a1", "a1", "a0"]),
        ];
        assert!(match_at(&sequence, &template(&["addi", "add"]), 0).is_none());
    }

    #[test]
    fn test_branch_aborts_match() {
        let sequence = vec![
            inst("addi", &["a0", "a0", "1"]),
            inst("j", &["0x40"]),
            inst("add", &["a1", "a1", "a0"]),
        ];
        assert!(match_at(&sequence, &template(&["addi", "add"]), 0).is_none());
    }

    #[test]
    fn test_partial_match_fails() {
        let sequence = vec![inst("addi", &["a0", "a0", "1"])];
        assert!(match_at(&sequence, &template(&["addi", "add"]), 0).is_none());
        assert!(match_at(&sequence, &template(&["addi"]), 5).is_none());
    }

    #[test]
    fn test_compressed_forms_match_base_template() {
        let sequence = vec![
            inst("c.addi", &["a0", "1"]),
            inst("c.add", &["a0", "a1"]),
        ];
        let outcome = match_at(&sequence, &template(&["addi", "add"]), 0).unwrap();
        assert_eq!(outcome.matched.len(), 2);
    }
}
