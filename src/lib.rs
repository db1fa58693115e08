//! Arise: synthesis of fused custom instructions for RISC-V
//!
//! This crate decodes RISC-V programs (static disassembly or execution
//! traces), proposes chains of dependent instructions that fit a single
//! 32- or 48-bit custom encoding, ranks them by the code size or instruction
//! count they save, and emits the winners as a CoreDSL instruction-set
//! extension.

pub mod disasm;
pub mod encoding;
pub mod error;
pub mod fusion;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod select;

pub use disasm::{load_frequencies, load_program, parse_program, DecodeConfig, FrequencyMap, InputFormat};
pub use encoding::{EncodedInstruction, Encoder, IsaConfig};
pub use error::{Result, SynthesisError};
pub use fusion::{merge, Format, FusionCandidate, FusionConfig, FusionEngine, Width};
pub use model::{Immediate, Instruction, Program, Register, RegisterCatalog};
pub use persistence::SynthesisReport;
pub use pipeline::{SynthesisConfig, SynthesisOutcome, SynthesisPipeline};
pub use select::{Objective, ScoringConfig, Selector};
