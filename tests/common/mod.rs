//! Shared test utilities and fixtures for Arise tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use arise::model::{Instruction, Program};

// ============================================================================
// Listings and Traces
// ============================================================================

/// objdump listing with two fusable functions and two excluded ones
pub const LISTING: &str = "\
prog.elf:     file format elf32-littleriscv


Disassembly of section .text:

00010074 <main>:
   10074:\t00450513          \taddi\ta0,a0,4
   10078:\t00a60633          \tadd\ta2,a2,a0
   1007c:\t00008067          \tret

00010080 <compute>:
   10080:\t00828293          \taddi\tt0,t0,8
   10084:\t00530333          \tadd\tt1,t1,t0
   10088:\t00008067          \tret

0001008c <_start>:
   1008c:\t00450513          \taddi\ta0,a0,4
   10090:\t00a60633          \tadd\ta2,a2,a0

00010094 <exit>:
   10094:\t00450513          \taddi\ta0,a0,4
   10098:\t00a60633          \tadd\ta2,a2,a0
   1009c:\t00008067          \tret
";

/// ETISS trace of `LISTING`: `main` runs once, `compute` three times
pub const ETISS_TRACE: &str = "\
0x0000000000010074: addi # 00000000010001010000010100010011 [rd=10 | rs1=10 | imm=4]
0x0000000000010078: add # 00000000101001100000011000110011 [rd=12 | rs1=12 | rs2=10]
0x0000000000010080: addi # 00000000100000101000001010010011 [rd=5 | rs1=5 | imm=8]
0x0000000000010084: add # 00000000010100110000001100110011 [rd=6 | rs1=6 | rs2=5]
0x0000000000010080: addi # 00000000100000101000001010010011 [rd=5 | rs1=5 | imm=8]
0x0000000000010084: add # 00000000010100110000001100110011 [rd=6 | rs1=6 | rs2=5]
0x0000000000010080: addi # 00000000100000101000001010010011 [rd=5 | rs1=5 | imm=8]
0x0000000000010084: add # 00000000010100110000001100110011 [rd=6 | rs1=6 | rs2=5]
0x0000000080000000: add # 00000000010100110000001100110011 [rd=6 | rs1=6 | rs2=5]
";

/// Spike commit log
pub const SPIKE_TRACE: &str = "\
core   0: >>>>  main
core   0: 0x00010074 (0x00450513) addi    a0, a0, 4
core   0: 0x00010078 (0x00a60633) add     a2, a2, a0
core   0: 0x0001007c (0x00008067) ret
";

// ============================================================================
// Instruction Builders
// ============================================================================

/// 32-bit instruction with operands given as assembly tokens
pub fn inst(address: u64, mnemonic: &str, operands: &[&str]) -> Instruction {
    let mut instruction = Instruction::new(address, "00a50533", mnemonic).unwrap();
    for operand in operands {
        instruction.append_operand(operand).unwrap();
    }
    instruction
}

/// Program from `(mnemonic, operands)` pairs at consecutive 4-byte addresses
pub fn program(lines: &[(&str, &[&str])]) -> Program {
    Program::new(
        lines
            .iter()
            .enumerate()
            .map(|(i, (mnemonic, operands))| inst(i as u64 * 4, mnemonic, operands))
            .collect(),
    )
}

/// A longer program mixing arithmetic, immediates and control flow
pub fn mixed_program() -> Program {
    program(&[
        ("addi", &["a0", "a0", "4"]),
        ("add", &["a2", "a2", "a0"]),
        ("slli", &["a2", "a2", "2"]),
        ("ret", &[]),
        ("lui", &["a5", "0x12345"]),
        ("mul", &["a4", "a4", "a5"]),
        ("beqz", &["a4", "0x40"]),
        ("andi", &["t0", "t1", "255"]),
        ("sltu", &["t0", "t2", "t0"]),
        ("xori", &["t0", "t0", "1"]),
        ("j", &["0x10"]),
        ("add", &["s0", "s1", "s2"]),
        ("sub", &["s0", "s0", "s3"]),
        ("sra", &["s0", "s0", "s4"]),
        ("or", &["s0", "s0", "s5"]),
        ("ret", &[]),
        ("addi", &["a1", "a1", "-2048"]),
        ("xor", &["a3", "a3", "a1"]),
        ("ret", &[]),
    ])
}

// ============================================================================
// Files
// ============================================================================

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
