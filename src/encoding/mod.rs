//! Opcode assignment, bit layout and behavior of fused instructions

pub mod behavior;
pub mod coredsl;
pub mod layout;
pub mod opcode;

pub use behavior::{Expr, Operator};
pub use coredsl::{Document, EncodedInstruction, Encoder, IsaConfig};
pub use layout::{BitField, FieldKind, Layout};
pub use opcode::{OpcodeAssignment, OpcodeSpace};
