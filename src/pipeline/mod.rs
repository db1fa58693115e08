//! Synthesis runs over a decoded program

pub mod config;
pub mod synthesis;

pub use config::SynthesisConfig;
pub use synthesis::{SynthesisOutcome, SynthesisPipeline, WidthOutcome};
