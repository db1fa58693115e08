//! Line decoders for disassembly listings and execution traces

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Instruction;

/// Source text layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// `objdump -d` style static disassembly
    #[default]
    Objdump,
    /// ETISS instruction trace
    Etiss,
    /// Spike commit trace
    Spike,
}

impl InputFormat {
    /// Decoder for this format
    pub fn decoder(&self) -> Box<dyn LineDecoder> {
        match self {
            InputFormat::Objdump => Box::new(ObjdumpDecoder),
            InputFormat::Etiss => Box::new(EtissDecoder),
            InputFormat::Spike => Box::new(SpikeDecoder),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Objdump => "objdump",
            InputFormat::Etiss => "etiss",
            InputFormat::Spike => "spike",
        }
    }
}

/// Turns one text line into an instruction record
pub trait LineDecoder: Send + Sync {
    /// Decode `line`; lines that are not instructions give `Ok(None)`
    fn decode_line(&self, line: &str) -> Result<Option<Instruction>>;

    /// Address of the instruction on `line`, for execution counting
    fn trace_address(&self, line: &str) -> Option<u64> {
        self.decode_line(line).ok().flatten().map(|i| i.address())
    }
}

/// Split an operand list into tokens
///
/// `off(base)` becomes `off`, `base`; braces and surrounding blanks go.
fn operand_tokens(operands: &str) -> Vec<String> {
    operands
        .replace(['(', ','], " ")
        .replace([')', '{', '}'], "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn parse_hex(token: &str) -> Option<u64> {
    let digits = token.strip_prefix("0x").unwrap_or(token);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn is_hex_byte(token: &str) -> bool {
    token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

// ============================================================================
// objdump
// ============================================================================

/// Static disassembly: `<addr>: <opcode> <mnemonic> <operands>`
///
/// The opcode is either a single word (`00a50533`) or space-separated bytes
/// in memory order (`13 65 05 08`), which are reversed into a word.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjdumpDecoder;

impl LineDecoder for ObjdumpDecoder {
    fn decode_line(&self, line: &str) -> Result<Option<Instruction>> {
        let Some(first) = line.chars().next() else {
            return Ok(None);
        };
        if !(first.is_whitespace() || first.is_ascii_hexdigit()) {
            return Ok(None);
        }

        let line = line.split('#').next().unwrap_or_default();
        let line = line.split('<').next().unwrap_or_default();
        let Some((address, body)) = line.split_once(':') else {
            return Ok(None);
        };
        let Some(address) = parse_hex(address.trim()) else {
            return Ok(None);
        };

        let mut tokens = body.split_whitespace().peekable();
        let opcode = match tokens.next() {
            Some(token) if is_hex_byte(token) => {
                let mut bytes = vec![token];
                while let Some(next) = tokens.next_if(|t| is_hex_byte(t)) {
                    bytes.push(next);
                }
                bytes.reverse();
                bytes.concat()
            }
            Some(token) if token.bytes().all(|b| b.is_ascii_hexdigit()) => token.to_string(),
            _ => return Ok(None),
        };
        let Some(mnemonic) = tokens.next() else {
            return Ok(None);
        };

        let mut instruction = Instruction::new(address, &opcode, mnemonic)?;
        let operands: Vec<&str> = tokens.collect();
        for token in operand_tokens(&operands.join(" ")) {
            instruction.append_operand(&token)?;
        }
        Ok(Some(instruction))
    }
}

// ============================================================================
// ETISS
// ============================================================================

/// ETISS trace: `0x<addr>: <mnemonic> # <opcode bits> [rd=.. | rs1=.. | imm=..]`
#[derive(Clone, Copy, Debug, Default)]
pub struct EtissDecoder;

impl LineDecoder for EtissDecoder {
    fn decode_line(&self, line: &str) -> Result<Option<Instruction>> {
        let Some(address) = self.trace_address(line) else {
            return Ok(None);
        };
        let Some((_, rest)) = line.split_once(':') else {
            return Ok(None);
        };
        let mut tokens = rest.split_whitespace();
        let (Some(mnemonic), Some("#"), Some(opcode)) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Ok(None);
        };

        let mut instruction = Instruction::new(address, opcode, mnemonic)?;

        let fields = rest
            .split_once('[')
            .and_then(|(_, tail)| tail.split(']').next())
            .unwrap_or_default();
        let mut registers: Vec<(&str, &str)> = Vec::new();
        let mut immediate = None;
        for field in fields.split('|') {
            let Some((key, value)) = field.trim().split_once('=') else {
                continue;
            };
            match key {
                "rd" | "rs1" | "rs2" | "rs3" => registers.push((key, value)),
                "imm" => immediate = Some(field.trim()),
                _ => {}
            }
        }
        // rd first, then sources in index order
        registers.sort_by(|a, b| (a.0 != "rd").cmp(&(b.0 != "rd")).then(a.0.cmp(b.0)));

        for (_, index) in registers {
            instruction.append_operand(&format!("x{}", index))?;
        }
        if let Some(immediate) = immediate {
            instruction.append_operand(immediate)?;
        }
        Ok(Some(instruction))
    }

    fn trace_address(&self, line: &str) -> Option<u64> {
        if !line.starts_with("0x") {
            return None;
        }
        let (address, _) = line.split_once(':')?;
        parse_hex(address)
    }
}

// ============================================================================
// Spike
// ============================================================================

/// Spike commit trace: `core   0: 0x<addr> (0x<opcode>) <mnemonic> <operands>`
#[derive(Clone, Copy, Debug, Default)]
pub struct SpikeDecoder;

impl SpikeDecoder {
    /// Text after the `core N:` prefix
    fn body<'l>(&self, line: &'l str) -> Option<&'l str> {
        let rest = line.strip_prefix("core")?;
        let (core, body) = rest.split_once(':')?;
        if core.trim().parse::<u32>().is_err() {
            return None;
        }
        let body = body.trim_start();
        body.starts_with("0x").then_some(body)
    }
}

impl LineDecoder for SpikeDecoder {
    fn decode_line(&self, line: &str) -> Result<Option<Instruction>> {
        let Some(body) = self.body(line) else {
            return Ok(None);
        };
        let mut tokens = body.split_whitespace();
        let (Some(address), Some(opcode), Some(mnemonic)) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Ok(None);
        };
        let Some(address) = parse_hex(address) else {
            return Ok(None);
        };
        let opcode = opcode.trim_start_matches('(').trim_end_matches(')');
        let opcode = opcode.strip_prefix("0x").unwrap_or(opcode);
        if opcode.is_empty() || !opcode.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(None);
        }

        let mut instruction = Instruction::new(address, opcode, mnemonic)?;
        let operands: Vec<&str> = tokens.collect();
        let operands = operands.join(" ").replace(" - ", "-").replace(" + ", "+");
        for token in operand_tokens(&operands) {
            instruction.append_operand(&token)?;
        }
        Ok(Some(instruction))
    }

    fn trace_address(&self, line: &str) -> Option<u64> {
        let address = self.body(line)?.split_whitespace().next()?;
        parse_hex(address)
    }
}
