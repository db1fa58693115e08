//! Immediate operands and their encodable bit width

use std::fmt;

use serde::{Deserialize, Serialize};

/// A signed immediate operand
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Immediate(i64);

impl Immediate {
    /// Wrap a value
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The wrapped value
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Minimal field width used for bit accounting
    ///
    /// `floor(log2(|value|))`, at least 1. No sign bit is reserved and powers of
    /// two are undercounted by one; the fusion cost model relies on exactly
    /// this count, so do not replace it with a two's-complement width.
    pub fn needed_bits(&self) -> u32 {
        let magnitude = self.0.unsigned_abs();
        if magnitude == 0 {
            return 1;
        }
        magnitude.ilog2().max(1)
    }

    /// Parse an operand token
    ///
    /// Accepts `0x..`/`-0x..` hex literals, plain decimal integers and the
    /// trace form `imm=<integer>`. Anything else is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token == "0x0" {
            return Some(Self(0));
        }

        let mut parts = token.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(literal), None, None) => parse_literal(literal).map(Self),
            (Some("imm"), Some(value), None) => parse_literal(value).map(Self),
            _ => None,
        }
    }
}

fn parse_literal(literal: &str) -> Option<i64> {
    let (negative, body) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };

    let magnitude = if let Some(hex) = body.strip_prefix("0x") {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        // Wide hex literals (e.g. upper-immediate masks) wrap into i64
        u64::from_str_radix(hex, 16).ok()? as i64
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        body.parse::<i64>().ok()?
    };

    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-{:#x}", self.0.unsigned_abs())
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}
