//! The ten operation types and their arithmetic.

use std::fmt;
use std::str::FromStr;

use crate::error::{ComputeError, PipelineError};

/// Operation served by one worker. Numeric ids match the wire protocol (0..=9).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationType {
    Sum,
    Sub,
    Mult,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Nand,
    Nor,
}

impl OperationType {
    pub const ALL: [OperationType; 10] = [
        OperationType::Sum,
        OperationType::Sub,
        OperationType::Mult,
        OperationType::Div,
        OperationType::Mod,
        OperationType::And,
        OperationType::Or,
        OperationType::Xor,
        OperationType::Nand,
        OperationType::Nor,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<Self, PipelineError> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or_else(|| PipelineError::UnknownOperation { id: id.to_string() })
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationType::Sum => "SUM",
            OperationType::Sub => "SUB",
            OperationType::Mult => "MULT",
            OperationType::Div => "DIV",
            OperationType::Mod => "MOD",
            OperationType::And => "AND",
            OperationType::Or => "OR",
            OperationType::Xor => "XOR",
            OperationType::Nand => "NAND",
            OperationType::Nor => "NOR",
        }
    }

    /// Compute `a <op> b` on 64-bit two's complement integers. Overflow wraps.
    pub fn apply(self, a: i64, b: i64) -> Result<i64, ComputeError> {
        let value = match self {
            OperationType::Sum => a.wrapping_add(b),
            OperationType::Sub => a.wrapping_sub(b),
            OperationType::Mult => a.wrapping_mul(b),
            OperationType::Div | OperationType::Mod if b == 0 => {
                return Err(ComputeError::DivisionByZero { operation: self });
            }
            OperationType::Div => a.wrapping_div(b),
            OperationType::Mod => a.wrapping_rem(b),
            OperationType::And => a & b,
            OperationType::Or => a | b,
            OperationType::Xor => a ^ b,
            OperationType::Nand => !(a & b),
            OperationType::Nor => !(a | b),
        };
        Ok(value)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the numeric id (`"3"`) or the name in any case (`"div"`).
impl FromStr for OperationType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| PipelineError::UnknownOperation { id: s.to_string() })
    }
}
