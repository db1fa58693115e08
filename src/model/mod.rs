//! Register, immediate and instruction model

pub mod immediate;
pub mod instruction;
pub mod program;
pub mod register;

pub use immediate::Immediate;
pub use instruction::Instruction;
pub use program::Program;
pub use register::{Register, RegisterCatalog, RegisterFile, SavedBy};
