//! Custom opcode space reserved for fused instructions

use crate::error::{Result, SynthesisError};
use crate::fusion::engine::BASE_OPCODE_LEN;
use crate::fusion::Width;

/// Base patterns of the 32-bit custom opcode slots
pub const BASE_32_PATTERNS: &[&str] = &["0001011", "0101011", "1010111", "1110111"];

/// Base pattern of the 48-bit encodings
pub const BASE_48_PATTERN: &str = "1011111";

/// Bits of the 48-bit major field
pub const MAJOR_48_BITS: u32 = 4;

/// Values of the 48-bit major field; all-zero is not used
const MAJOR_48_VALUES: u32 = (1 << MAJOR_48_BITS) - 1;

/// Opcode bits given to one fused instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeAssignment {
    /// Major field in the topmost bits (48-bit only)
    pub major: Option<String>,
    /// Full opcode bits, secondary field followed by the base pattern
    pub opcode: String,
}

/// Enumerates opcodes for one width
///
/// Index `i` cycles through the base patterns (or the 48-bit major values)
/// first; the secondary field above the base pattern counts the rounds.
#[derive(Clone, Debug)]
pub struct OpcodeSpace {
    width: Width,
    opcode_len: u32,
}

impl OpcodeSpace {
    pub fn new(width: Width, opcode_len: u32) -> Result<Self> {
        if width == Width::Compressed {
            return Err(SynthesisError::UnsupportedWidth(width.bits()));
        }
        if opcode_len < BASE_OPCODE_LEN || opcode_len >= width.bits() {
            return Err(SynthesisError::InfeasibleFormat {
                width: width.bits(),
                selector_bits: width.selector_bits(),
                opcode_len,
            });
        }
        Ok(Self { width, opcode_len })
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn opcode_len(&self) -> u32 {
        self.opcode_len
    }

    /// Bits of the major field (0 for 32-bit)
    pub fn major_bits(&self) -> u32 {
        match self.width {
            Width::Extended => MAJOR_48_BITS,
            _ => 0,
        }
    }

    fn secondary_bits(&self) -> u32 {
        self.opcode_len - BASE_OPCODE_LEN
    }

    /// Distinct patterns before the secondary field advances
    fn round(&self) -> usize {
        match self.width {
            Width::Extended => MAJOR_48_VALUES as usize,
            _ => BASE_32_PATTERNS.len(),
        }
    }

    /// Number of opcodes this space can hand out
    pub fn capacity(&self) -> usize {
        1usize
            .checked_shl(self.secondary_bits())
            .and_then(|rounds| rounds.checked_mul(self.round()))
            .unwrap_or(usize::MAX)
    }

    /// Opcode of the `index`-th fused instruction
    pub fn assign(&self, index: usize) -> Result<OpcodeAssignment> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(SynthesisError::OpcodeSpaceExhausted {
                width: self.width.bits(),
                index,
                capacity,
            });
        }

        let round = self.round();
        let secondary = binary(index / round, self.secondary_bits());
        let (major, base) = match self.width {
            Width::Extended => {
                let value = (index % round) as u32 + 1;
                (Some(binary(value as usize, MAJOR_48_BITS)), BASE_48_PATTERN)
            }
            _ => (None, BASE_32_PATTERNS[index % round]),
        };

        Ok(OpcodeAssignment {
            major,
            opcode: format!("{}{}", secondary, base),
        })
    }
}

/// `value` as exactly `bits` binary digits
fn binary(value: usize, bits: u32) -> String {
    if bits == 0 {
        return String::new();
    }
    format!("{:0width$b}", value, width = bits as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert_eq!(OpcodeSpace::new(Width::Full, 9).unwrap().capacity(), 16);
        assert_eq!(OpcodeSpace::new(Width::Full, 7).unwrap().capacity(), 4);
        assert_eq!(OpcodeSpace::new(Width::Extended, 9).unwrap().capacity(), 60);
    }

    #[test]
    fn test_assign_32() {
        let space = OpcodeSpace::new(Width::Full, 9).unwrap();

        let first = space.assign(0).unwrap();
        assert_eq!(first.major, None);
        assert_eq!(first.opcode, "000001011");
        assert_eq!(space.assign(3).unwrap().opcode, "001110111");
        assert_eq!(space.assign(5).unwrap().opcode, "010101011");
        assert_eq!(space.assign(15).unwrap().opcode, "111110111");
    }

    #[test]
    fn test_assign_48() {
        let space = OpcodeSpace::new(Width::Extended, 9).unwrap();

        let first = space.assign(0).unwrap();
        assert_eq!(first.major.as_deref(), Some("0001"));
        assert_eq!(first.opcode, "001011111");

        let wrapped = space.assign(15).unwrap();
        assert_eq!(wrapped.major.as_deref(), Some("0001"));
        assert_eq!(wrapped.opcode, "011011111");
        assert_eq!(space.assign(14).unwrap().major.as_deref(), Some("1111"));
    }

    #[test]
    fn test_assign_beyond_capacity() {
        let space = OpcodeSpace::new(Width::Full, 9).unwrap();
        assert!(matches!(
            space.assign(16),
            Err(SynthesisError::OpcodeSpaceExhausted { capacity: 16, .. })
        ));
    }

    #[test]
    fn test_compressed_unsupported() {
        assert!(matches!(
            OpcodeSpace::new(Width::Compressed, 9),
            Err(SynthesisError::UnsupportedWidth(16))
        ));
        assert!(OpcodeSpace::new(Width::Full, 6).is_err());
    }
}
