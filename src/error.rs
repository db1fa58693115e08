//! Error type shared by the synthesis layers

use thiserror::Error;

/// Fatal conditions raised while modelling, fusing or encoding instructions
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// An instruction received a second immediate operand
    #[error("instruction at {address:#x} ({mnemonic}) already carries an immediate, got another: {token}")]
    DuplicateImmediate {
        address: u64,
        mnemonic: String,
        token: String,
    },

    /// Opcode string whose length cannot be mapped to an instruction size
    #[error("opcode {opcode:?} has no valid size: {reason}")]
    InvalidOpcode { opcode: String, reason: &'static str },

    /// Width and opcode length leave no room for operands
    #[error("a {width}-bit format with {selector_bits} length-selector bits cannot hold a {opcode_len}-bit opcode")]
    InfeasibleFormat {
        width: u32,
        selector_bits: u32,
        opcode_len: u32,
    },

    /// Remaining bit budget went negative where it must not
    #[error("bit budget of {width}-bit format exhausted: {remaining} bits remaining")]
    BitBudget { width: u32, remaining: i64 },

    /// Encoder layout does not add up to the target width
    #[error("encoding of {name} assigns {assigned} bits, expected {expected}")]
    WidthMismatch {
        name: String,
        assigned: u32,
        expected: u32,
    },

    /// No custom opcode space is defined for this width
    #[error("no custom opcode space defined for {0}-bit instructions")]
    UnsupportedWidth(u32),

    /// Opcode index beyond the capacity of the reserved opcode space
    #[error("opcode index {index} exceeds the {capacity} custom opcodes available at {width} bits")]
    OpcodeSpaceExhausted {
        width: u32,
        index: usize,
        capacity: usize,
    },

    /// Member instruction with an operand shape the behavior renderer cannot express
    #[error("cannot render behavior of {mnemonic} with {sources} register sources in position {position}")]
    UnsupportedOperands {
        mnemonic: String,
        sources: usize,
        position: usize,
    },
}

/// Result alias for synthesis operations
pub type Result<T> = std::result::Result<T, SynthesisError>;
