//! Reading programs and execution profiles from text files

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{instruction::base_mnemonic, Program};

use super::decoder::InputFormat;
use super::filter::{FunctionFilter, FunctionFilterConfig};
use super::frequency::FrequencyMap;

/// Trace addresses at or above 2 GiB belong to the runtime, not the program
pub const DEFAULT_EXCLUDED_ADDRESS_MASK: u64 = 0x8000_0000;

/// Decode-time filtering
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Base mnemonics dropped while decoding
    pub dropped_mnemonics: Vec<String>,
    /// Trace addresses with any of these bits set are not counted
    pub excluded_address_mask: u64,
    pub functions: FunctionFilterConfig,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            dropped_mnemonics: Vec::new(),
            excluded_address_mask: DEFAULT_EXCLUDED_ADDRESS_MASK,
            functions: FunctionFilterConfig::default(),
        }
    }
}

/// Decode a whole listing or trace
///
/// Lines inside excluded functions are skipped before decoding; lines the
/// decoder does not recognize are skipped silently.
pub fn parse_program(text: &str, format: InputFormat, config: &DecodeConfig) -> crate::error::Result<Program> {
    let decoder = format.decoder();
    let mut filter = FunctionFilter::new(&config.functions);
    let mut instructions = Vec::new();
    let mut skipped = 0usize;

    for line in text.lines() {
        if filter.suppresses(line) {
            skipped += 1;
            continue;
        }
        let Some(instruction) = decoder.decode_line(line)? else {
            continue;
        };
        let base = base_mnemonic(instruction.mnemonic());
        if config.dropped_mnemonics.iter().any(|m| *m == base) {
            continue;
        }
        instructions.push(instruction);
    }

    debug!(
        format = format.as_str(),
        instructions = instructions.len(),
        suppressed_lines = skipped,
        "decoded program"
    );
    Ok(Program::new(instructions))
}

/// Read the file eagerly (invalid UTF-8 is replaced) and return its text
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Load and decode a program file
pub fn load_program(path: &Path, format: InputFormat, config: &DecodeConfig) -> Result<Program> {
    let text = read_text(path)?;
    parse_program(&text, format, config).with_context(|| format!("Failed to decode {}", path.display()))
}

/// Count executions of `program`'s instructions in a trace file
pub fn load_frequencies(
    path: &Path,
    format: InputFormat,
    program: &Program,
    config: &DecodeConfig,
) -> Result<FrequencyMap> {
    let text = read_text(path)?;
    let decoder = format.decoder();
    let map = FrequencyMap::from_trace(&text, decoder.as_ref(), program, config.excluded_address_mask);
    debug!(
        path = %path.display(),
        addresses = map.len(),
        executions = map.total(),
        "loaded execution profile"
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
prog.elf:     file format elf32-littleriscv

Disassembly of section .text:

00010074 <main>:
   10074:\t00450513          \taddi\ta0,a0,4
   10078:\t00a585b3          \tadd\ta1,a1,a0
   1007c:\t00008067          \tret

00010080 <_start>:
   10080:\t00000513          \tli\ta0,0
";

    #[test]
    fn test_parse_program_filters_functions() {
        let program = parse_program(LISTING, InputFormat::Objdump, &DecodeConfig::default()).unwrap();
        let mnemonics: Vec<&str> = program.instructions().iter().map(|i| i.mnemonic()).collect();
        assert_eq!(mnemonics, vec!["addi", "add", "ret"]);
    }

    #[test]
    fn test_parse_program_drops_mnemonics() {
        let config = DecodeConfig {
            dropped_mnemonics: vec!["ret".to_string()],
            ..DecodeConfig::default()
        };
        let program = parse_program(LISTING, InputFormat::Objdump, &config).unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_parse_empty_text() {
        let program = parse_program("", InputFormat::Spike, &DecodeConfig::default()).unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_load_program_missing_file() {
        let result = load_program(Path::new("/nonexistent/prog.dump"), InputFormat::Objdump, &DecodeConfig::default());
        assert!(result.is_err());
    }
}
