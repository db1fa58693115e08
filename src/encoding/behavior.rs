//! Symbolic behavior of a fused instruction
//!
//! Member instructions are folded left to right into one expression tree.
//! Register and immediate placeholders are numbered in the same order the
//! candidate allocated its input and immediate fields.

use std::fmt;

use crate::error::{Result, SynthesisError};
use crate::fusion::FusionCandidate;
use crate::model::{Instruction, Register};

use super::layout::{immediate_field, source_field};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    And,
    Or,
    Xor,
    ShiftRight,
    ShiftLeft,
    Mul,
    Div,
    Rem,
    LessThan,
    Negate,
    Not,
    Unknown,
}

const BINARY_OPERATORS: &[(&str, Operator)] = &[
    ("add", Operator::Add),
    ("addi", Operator::Add),
    ("sub", Operator::Sub),
    ("subi", Operator::Sub),
    ("and", Operator::And),
    ("andi", Operator::And),
    ("or", Operator::Or),
    ("ori", Operator::Or),
    ("xor", Operator::Xor),
    ("xori", Operator::Xor),
    ("srl", Operator::ShiftRight),
    ("srli", Operator::ShiftRight),
    ("sra", Operator::ShiftRight),
    ("srai", Operator::ShiftRight),
    ("sll", Operator::ShiftLeft),
    ("slli", Operator::ShiftLeft),
    ("mul", Operator::Mul),
    ("div", Operator::Div),
    ("divu", Operator::Div),
    ("rem", Operator::Rem),
    ("remu", Operator::Rem),
    ("slt", Operator::LessThan),
    ("slti", Operator::LessThan),
    ("sltu", Operator::LessThan),
    ("sltiu", Operator::LessThan),
];

const UNARY_OPERATORS: &[(&str, Operator)] = &[("neg", Operator::Negate), ("not", Operator::Not)];

/// Immediates zero-extended to XLEN after sign interpretation
const UNSIGNED_IMMEDIATES: &[&str] = &["andi", "ori", "xori", "sltiu"];

impl Operator {
    pub fn binary(mnemonic: &str) -> Self {
        lookup(BINARY_OPERATORS, mnemonic)
    }

    pub fn unary(mnemonic: &str) -> Self {
        lookup(UNARY_OPERATORS, mnemonic)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub | Operator::Negate => "-",
            Operator::And => "&",
            Operator::Or => "|",
            Operator::Xor => "^",
            Operator::ShiftRight => ">>",
            Operator::ShiftLeft => "<<",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::LessThan => "<",
            Operator::Not => "~",
            Operator::Unknown => "UNKNOWN",
        }
    }

    /// Comparisons yield 1 or 0
    pub fn is_comparison(&self) -> bool {
        *self == Operator::LessThan
    }
}

fn lookup(table: &[(&str, Operator)], mnemonic: &str) -> Operator {
    table
        .iter()
        .find(|(m, _)| *m == mnemonic)
        .map(|(_, op)| *op)
        .unwrap_or(Operator::Unknown)
}

/// Expression tree over encoding fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Register file read through a source field
    Register(String),
    /// Sign-interpreted immediate field, optionally widened unsigned to XLEN
    Immediate { field: String, unsigned: bool },
    ProgramCounter,
    /// Value of a member whose operation has no rendering
    Unknown,
    Unary { op: Operator, operand: Box<Expr> },
    Binary { op: Operator, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Register(field) => write!(f, "X[{}]", field),
            Expr::Immediate { field, unsigned: false } => write!(f, "(signed){}", field),
            Expr::Immediate { field, unsigned: true } => write!(f, "(unsigned<XLEN>)((signed){})", field),
            Expr::ProgramCounter => f.write_str("PC"),
            Expr::Unknown => f.write_str(Operator::Unknown.symbol()),
            Expr::Unary { op, operand } => write!(f, "({}{})", op.symbol(), operand),
            Expr::Binary { op, lhs, rhs } if op.is_comparison() => {
                write!(f, "(({} {} {}) ? 1 : 0)", lhs, op.symbol(), rhs)
            }
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}

/// Hands out placeholder names in allocation order
#[derive(Default)]
struct Placeholders {
    sources: usize,
    immediates: usize,
}

impl Placeholders {
    fn source(&mut self) -> Expr {
        self.sources += 1;
        Expr::Register(source_field(self.sources - 1))
    }

    fn immediate(&mut self, unsigned: bool) -> Expr {
        self.immediates += 1;
        Expr::Immediate {
            field: immediate_field(self.immediates - 1),
            unsigned,
        }
    }
}

/// Fold the members of `candidate` into a single expression
pub fn expression(candidate: &FusionCandidate) -> Result<Expr> {
    let mut names = Placeholders::default();
    let mut folded: Option<Expr> = None;
    let mut live: Option<Register> = None;

    for instruction in candidate.instructions() {
        let operands = match &folded {
            None => instruction.sources().iter().map(|_| names.source()).collect(),
            Some(previous) => {
                let mut fresh: Vec<(Register, Expr)> = Vec::new();
                let mut operands = Vec::with_capacity(instruction.sources().len());
                for source in instruction.sources() {
                    let operand = if Some(*source) == live {
                        previous.clone()
                    } else if let Some((_, known)) = fresh.iter().find(|(r, _)| r == source) {
                        known.clone()
                    } else {
                        let placeholder = names.source();
                        fresh.push((*source, placeholder.clone()));
                        placeholder
                    };
                    operands.push(operand);
                }
                operands
            }
        };

        folded = Some(member(instruction, operands, &mut names));
        live = instruction.destination();
    }

    folded.ok_or_else(|| SynthesisError::UnsupportedOperands {
        mnemonic: candidate.name(),
        sources: 0,
        position: 0,
    })
}

/// Expression of one member given its (already substituted) register operands
///
/// Shapes without a dedicated rendering fold their operands with the
/// unknown operator; a member with no operands at all becomes `UNKNOWN`.
/// Every immediate still takes its placeholder so later fields keep their names.
fn member(instruction: &Instruction, mut operands: Vec<Expr>, names: &mut Placeholders) -> Expr {
    let base = instruction.base_mnemonic();

    if instruction.has_immediate() && matches!(base, "li" | "lui" | "auipc") {
        return match base {
            "lui" => names.immediate(true),
            "auipc" => Expr::binary(Operator::Add, Expr::ProgramCounter, names.immediate(false)),
            _ => names.immediate(false),
        };
    }

    match (operands.len(), instruction.has_immediate()) {
        (1, true) => {
            let imm = names.immediate(UNSIGNED_IMMEDIATES.contains(&base));
            let lhs = operands.remove(0);
            Expr::binary(Operator::binary(base), lhs, imm)
        }
        (1, false) if base == "mv" => operands.remove(0),
        (1, false) => Expr::Unary {
            op: Operator::unary(base),
            operand: Box::new(operands.remove(0)),
        },
        (2, false) => {
            let rhs = operands.remove(1);
            let lhs = operands.remove(0);
            Expr::binary(Operator::binary(base), lhs, rhs)
        }
        (_, has_immediate) => {
            if has_immediate {
                operands.push(names.immediate(false));
            }
            operands
                .into_iter()
                .reduce(|lhs, rhs| Expr::binary(Operator::Unknown, lhs, rhs))
                .unwrap_or(Expr::Unknown)
        }
    }
}

/// Behavior statement assigning the folded expression to `rd`
pub fn render(candidate: &FusionCandidate) -> Result<String> {
    let expr = expression(candidate)?;
    Ok(match candidate.out_reg() {
        Some(_) => format!("if ((rd) != 0) X[rd] = {}", expr),
        None => expr.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{FusionConfig, FusionEngine, Width};

    fn inst(mnemonic: &str, operands: &[&str]) -> Instruction {
        let mut instruction = Instruction::new(0x100, "00a50533", mnemonic).unwrap();
        for operand in operands {
            instruction.append_operand(operand).unwrap();
        }
        instruction
    }

    fn fuse(config: &FusionConfig, instructions: &[Instruction]) -> FusionCandidate {
        let engine = FusionEngine::new(config, Width::Extended).unwrap();
        let mut found = engine.generate(instructions, false).unwrap().into_vec();
        found.retain(|c| c.len() > 1);
        assert_eq!(found.len(), 1, "{:?}", found);
        found.remove(0)
    }

    // ========================================================================
    // Operator Tests
    // ========================================================================

    #[test]
    fn test_operator_table() {
        assert_eq!(Operator::binary("addi").symbol(), "+");
        assert_eq!(Operator::binary("sra").symbol(), ">>");
        assert_eq!(Operator::binary("remu").symbol(), "%");
        assert_eq!(Operator::binary("mulhsu"), Operator::Unknown);
        assert_eq!(Operator::unary("neg").symbol(), "-");
    }

    // ========================================================================
    // Rendering Tests
    // ========================================================================

    #[test]
    fn test_render_addi_add() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("addi", &["a0", "a0", "4"]), inst("add", &["a2", "a2", "a0"])],
        );
        assert_eq!(
            render(&candidate).unwrap(),
            "if ((rd) != 0) X[rd] = (X[rs2] + (X[rs1] + (signed)imm))"
        );
    }

    #[test]
    fn test_render_keeps_operand_order() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("add", &["a0", "a1", "a2"]), inst("sub", &["a0", "a0", "a3"])],
        );
        assert_eq!(
            render(&candidate).unwrap(),
            "if ((rd) != 0) X[rd] = ((X[rs1] + X[rs2]) - X[rs3])"
        );
    }

    #[test]
    fn test_render_comparison_and_unsigned_immediate() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[
                inst("andi", &["a0", "a1", "15"]),
                inst("sltu", &["a0", "a2", "a0"]),
                inst("xori", &["a0", "a0", "1"]),
            ],
        );
        assert_eq!(
            render(&candidate).unwrap(),
            "if ((rd) != 0) X[rd] = (((X[rs2] < (X[rs1] & (unsigned<XLEN>)((signed)imm))) ? 1 : 0) ^ (unsigned<XLEN>)((signed)imm2))"
        );
    }

    #[test]
    fn test_render_unknown_operator() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("addi", &["a0", "a0", "1"]), inst("mulhsu", &["a1", "a1", "a0"])],
        );
        assert_eq!(
            render(&candidate).unwrap(),
            "if ((rd) != 0) X[rd] = (X[rs2] UNKNOWN (X[rs1] + (signed)imm))"
        );
    }

    #[test]
    fn test_render_lui_mul() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("lui", &["a0", "0x12"]), inst("mul", &["a1", "a1", "a0"])],
        );
        assert_eq!(
            render(&candidate).unwrap(),
            "if ((rd) != 0) X[rd] = (X[rs1] * (unsigned<XLEN>)((signed)imm))"
        );
    }

    #[test]
    fn test_render_same_register_twice() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("slli", &["a0", "a0", "2"]), inst("add", &["a1", "a0", "a0"])],
        );
        assert_eq!(
            render(&candidate).unwrap(),
            "if ((rd) != 0) X[rd] = ((X[rs1] << (signed)imm) + (X[rs1] << (signed)imm))"
        );
    }

    #[test]
    fn test_render_member_without_operands() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("csrr", &["a0", "cycle"]), inst("add", &["a1", "a1", "a0"])],
        );
        assert_eq!(render(&candidate).unwrap(), "if ((rd) != 0) X[rd] = (X[rs1] + UNKNOWN)");
    }

    #[test]
    fn test_render_load_immediate_without_value() {
        let candidate = fuse(
            &FusionConfig::default(),
            &[inst("li", &["a0", "sym"]), inst("mul", &["a1", "a1", "a0"])],
        );
        assert_eq!(render(&candidate).unwrap(), "if ((rd) != 0) X[rd] = (X[rs1] * UNKNOWN)");
    }
}
