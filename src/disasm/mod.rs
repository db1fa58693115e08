//! Decoding of disassembly listings and execution traces

pub mod decoder;
pub mod filter;
pub mod frequency;
pub mod loader;

pub use decoder::{EtissDecoder, InputFormat, LineDecoder, ObjdumpDecoder, SpikeDecoder};
pub use filter::{FunctionFilter, FunctionFilterConfig};
pub use frequency::FrequencyMap;
pub use loader::{load_frequencies, load_program, parse_program, DecodeConfig};
