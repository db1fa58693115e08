//! RISC-V architectural register catalog

use std::fmt;

use serde::{Deserialize, Serialize};

/// Register namespace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegisterFile {
    /// x0-x31
    Integer,
    /// f0-f31
    Float,
}

/// Calling-convention save class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SavedBy {
    /// Hardwired or platform registers (zero, gp, tp)
    NotSaved,
    /// Caller-saved (temporaries, arguments, ra)
    Caller,
    /// Callee-saved (sp, s-registers)
    Callee,
}

/// An architectural register, identified by namespace and canonical index
///
/// Equality is by identity: `a0` and `x10` resolve to the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Register {
    file: RegisterFile,
    index: u8,
}

struct RegisterInfo {
    names: &'static [&'static str],
    saved_by: SavedBy,
}

const fn info(names: &'static [&'static str], saved_by: SavedBy) -> RegisterInfo {
    RegisterInfo { names, saved_by }
}

use SavedBy::{Callee, Caller, NotSaved};

static INTEGER: [RegisterInfo; 32] = [
    info(&["zero", "x0"], NotSaved),
    info(&["ra", "x1"], Caller),
    info(&["sp", "x2"], Callee),
    info(&["gp", "x3"], NotSaved),
    info(&["tp", "x4"], NotSaved),
    info(&["t0", "x5"], Caller),
    info(&["t1", "x6"], Caller),
    info(&["t2", "x7"], Caller),
    info(&["s0", "fp", "x8"], Callee),
    info(&["s1", "x9"], Callee),
    info(&["a0", "x10"], Caller),
    info(&["a1", "x11"], Caller),
    info(&["a2", "x12"], Caller),
    info(&["a3", "x13"], Caller),
    info(&["a4", "x14"], Caller),
    info(&["a5", "x15"], Caller),
    info(&["a6", "x16"], Caller),
    info(&["a7", "x17"], Caller),
    info(&["s2", "x18"], Callee),
    info(&["s3", "x19"], Callee),
    info(&["s4", "x20"], Callee),
    info(&["s5", "x21"], Callee),
    info(&["s6", "x22"], Callee),
    info(&["s7", "x23"], Callee),
    info(&["s8", "x24"], Callee),
    info(&["s9", "x25"], Callee),
    info(&["s10", "x26"], Callee),
    info(&["s11", "x27"], Callee),
    info(&["t3", "x28"], Caller),
    info(&["t4", "x29"], Caller),
    info(&["t5", "x30"], Caller),
    info(&["t6", "x31"], Caller),
];

static FLOAT: [RegisterInfo; 32] = [
    info(&["ft0", "f0"], Caller),
    info(&["ft1", "f1"], Caller),
    info(&["ft2", "f2"], Caller),
    info(&["ft3", "f3"], Caller),
    info(&["ft4", "f4"], Caller),
    info(&["ft5", "f5"], Caller),
    info(&["ft6", "f6"], Caller),
    info(&["ft7", "f7"], Caller),
    info(&["fs0", "f8"], Callee),
    info(&["fs1", "f9"], Callee),
    info(&["fa0", "f10"], Caller),
    info(&["fa1", "f11"], Caller),
    info(&["fa2", "f12"], Caller),
    info(&["fa3", "f13"], Caller),
    info(&["fa4", "f14"], Caller),
    info(&["fa5", "f15"], Caller),
    info(&["fa6", "f16"], Caller),
    info(&["fa7", "f17"], Caller),
    info(&["fs2", "f18"], Callee),
    info(&["fs3", "f19"], Callee),
    info(&["fs4", "f20"], Callee),
    info(&["fs5", "f21"], Callee),
    info(&["fs6", "f22"], Callee),
    info(&["fs7", "f23"], Callee),
    info(&["fs8", "f24"], Callee),
    info(&["fs9", "f25"], Callee),
    info(&["fs10", "f26"], Callee),
    info(&["fs11", "f27"], Callee),
    info(&["ft8", "f28"], Caller),
    info(&["ft9", "f29"], Caller),
    info(&["ft10", "f30"], Caller),
    info(&["ft11", "f31"], Caller),
];

/// Integer registers addressable by compressed (3-bit) register fields
const COMPRESSED_FIRST: u8 = 8;
const COMPRESSED_COUNT: u8 = 8;

impl Register {
    /// The hardwired zero register
    pub const ZERO: Register = Register::integer(0);

    /// Register `index` of `file`, if the file has that many registers
    pub fn from_index(file: RegisterFile, index: u8) -> Option<Self> {
        let count = match file {
            RegisterFile::Integer => INTEGER.len(),
            RegisterFile::Float => FLOAT.len(),
        };
        ((index as usize) < count).then_some(Self { file, index })
    }

    /// Integer register `x<index>`; `index` must be below 32
    pub(crate) const fn integer(index: u8) -> Self {
        Self {
            file: RegisterFile::Integer,
            index,
        }
    }

    /// Floating-point register `f<index>`; `index` must be below 32
    pub(crate) const fn float(index: u8) -> Self {
        Self {
            file: RegisterFile::Float,
            index,
        }
    }

    /// Namespace of this register
    pub fn file(&self) -> RegisterFile {
        self.file
    }

    /// Canonical index within its namespace
    pub fn index(&self) -> u8 {
        self.index
    }

    fn info(&self) -> &'static RegisterInfo {
        match self.file {
            RegisterFile::Integer => &INTEGER[self.index as usize],
            RegisterFile::Float => &FLOAT[self.index as usize],
        }
    }

    /// All alias names, ABI name first
    pub fn names(&self) -> &'static [&'static str] {
        self.info().names
    }

    /// ABI name
    pub fn name(&self) -> &'static str {
        self.names()[0]
    }

    /// Calling-convention save class
    pub fn saved_by(&self) -> SavedBy {
        self.info().saved_by
    }

    /// Whether a 3-bit compressed register field can address this register
    pub fn is_compressed_addressable(&self) -> bool {
        self.file == RegisterFile::Integer
            && (COMPRESSED_FIRST..COMPRESSED_FIRST + COMPRESSED_COUNT).contains(&self.index)
    }

    /// Whether this is the hardwired zero register
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static lookup over the integer and floating-point register tables
pub struct RegisterCatalog;

impl RegisterCatalog {
    /// Resolve a register by any of its alias names
    ///
    /// With `compressed` set only the eight compressed-addressable registers match.
    pub fn lookup(name: &str, compressed: bool) -> Option<Register> {
        if compressed {
            return Self::reduced().find(|reg| reg.names().contains(&name));
        }
        Self::all()
            .chain(Self::floating())
            .find(|reg| reg.names().contains(&name))
    }

    /// Bits needed to encode a register field
    pub fn width(compressed: bool) -> u32 {
        let count = if compressed {
            COMPRESSED_COUNT as u32
        } else {
            INTEGER.len() as u32
        };
        count.trailing_zeros()
    }

    /// All 32 integer registers
    pub fn all() -> impl Iterator<Item = Register> {
        (0..INTEGER.len() as u8).map(Register::integer)
    }

    /// The 8 compressed-addressable integer registers (x8-x15)
    pub fn reduced() -> impl Iterator<Item = Register> {
        (COMPRESSED_FIRST..COMPRESSED_FIRST + COMPRESSED_COUNT).map(Register::integer)
    }

    /// All 32 floating-point registers
    pub fn floating() -> impl Iterator<Item = Register> {
        (0..FLOAT.len() as u8).map(Register::float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Catalog Tests
    // ========================================================================

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(RegisterCatalog::all().count(), 32);
        assert_eq!(RegisterCatalog::floating().count(), 32);
        assert_eq!(RegisterCatalog::reduced().count(), 8);
    }

    #[test]
    fn test_lookup_abi_and_numeric_alias() {
        let a0 = RegisterCatalog::lookup("a0", false).expect("a0 is a register");
        assert!(a0.names().contains(&"x10"));
        assert_eq!(RegisterCatalog::lookup("x10", false), Some(a0));
        assert_eq!(a0.saved_by(), SavedBy::Caller);
    }

    #[test]
    fn test_lookup_frame_pointer_alias() {
        let fp = RegisterCatalog::lookup("fp", false).unwrap();
        assert_eq!(fp, Register::integer(8));
        assert_eq!(fp.name(), "s0");
        assert_eq!(fp.saved_by(), SavedBy::Callee);
    }

    #[test]
    fn test_lookup_float_namespace_is_separate() {
        let fa0 = RegisterCatalog::lookup("fa0", false).unwrap();
        assert_eq!(fa0.file(), RegisterFile::Float);
        assert_eq!(fa0.index(), 10);
        assert_ne!(fa0, RegisterCatalog::lookup("a0", false).unwrap());
    }

    #[test]
    fn test_lookup_compressed_subset() {
        assert!(RegisterCatalog::lookup("a0", true).is_some());
        assert!(RegisterCatalog::lookup("s1", true).is_some());
        assert!(RegisterCatalog::lookup("sp", true).is_none());
        assert!(RegisterCatalog::lookup("a6", true).is_none());
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(RegisterCatalog::lookup("garbage", false).is_none());
        assert!(RegisterCatalog::lookup("0x10", false).is_none());
    }

    #[test]
    fn test_register_widths() {
        assert_eq!(RegisterCatalog::width(false), 5);
        assert_eq!(RegisterCatalog::width(true), 3);
    }

    #[test]
    fn test_zero_register() {
        let zero = RegisterCatalog::lookup("zero", false).unwrap();
        assert!(zero.is_zero());
        assert_eq!(RegisterCatalog::lookup("x0", false), Some(zero));
        assert_eq!(zero.saved_by(), SavedBy::NotSaved);
    }

    #[test]
    fn test_compressed_addressable() {
        assert!(Register::integer(8).is_compressed_addressable());
        assert!(Register::integer(15).is_compressed_addressable());
        assert!(!Register::integer(16).is_compressed_addressable());
        assert!(!Register::float(9).is_compressed_addressable());
    }

    #[test]
    fn test_unique_names() {
        let mut seen = std::collections::HashSet::new();
        for reg in RegisterCatalog::all().chain(RegisterCatalog::floating()) {
            for name in reg.names() {
                assert!(seen.insert(*name), "Duplicate register name: {}", name);
            }
        }
    }

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(Register::from_index(RegisterFile::Integer, 31).map(|r| r.name()), Some("t6"));
        assert_eq!(Register::from_index(RegisterFile::Float, 0).map(|r| r.name()), Some("ft0"));
        assert!(Register::from_index(RegisterFile::Integer, 32).is_none());
        assert!(Register::from_index(RegisterFile::Float, 255).is_none());
    }
}
