//! Concrete value types.
//!
//! A [`ValueType`] is a lane type repeated over a power-of-two number of lanes.
//! Scalars have a single lane. The textual form matches the IR: `i32`, `f64`,
//! `b1`, `i32x4`.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{MetaError, MetaResult};

/// Largest supported SIMD lane count.
pub const MAX_LANES: u16 = 256;

/// The type of a single lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneType {
    Int(u16),
    Float(u16),
    Bool(u16),
}

impl LaneType {
    /// Number of bits in one lane.
    pub fn bits(self) -> u16 {
        match self {
            LaneType::Int(bits) | LaneType::Float(bits) | LaneType::Bool(bits) => bits,
        }
    }

    fn prefix(self) -> char {
        match self {
            LaneType::Int(_) => 'i',
            LaneType::Float(_) => 'f',
            LaneType::Bool(_) => 'b',
        }
    }

    fn is_valid(self) -> bool {
        match self {
            LaneType::Int(bits) => matches!(bits, 8 | 16 | 32 | 64),
            LaneType::Float(bits) => matches!(bits, 32 | 64),
            LaneType::Bool(bits) => matches!(bits, 1 | 8 | 16 | 32 | 64),
        }
    }
}

/// A concrete type tag used to bind polymorphic instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    lane: LaneType,
    lanes: u16,
}

impl ValueType {
    pub const I8: ValueType = ValueType::scalar(LaneType::Int(8));
    pub const I16: ValueType = ValueType::scalar(LaneType::Int(16));
    pub const I32: ValueType = ValueType::scalar(LaneType::Int(32));
    pub const I64: ValueType = ValueType::scalar(LaneType::Int(64));
    pub const F32: ValueType = ValueType::scalar(LaneType::Float(32));
    pub const F64: ValueType = ValueType::scalar(LaneType::Float(64));
    pub const B1: ValueType = ValueType::scalar(LaneType::Bool(1));
    pub const B8: ValueType = ValueType::scalar(LaneType::Bool(8));
    pub const B16: ValueType = ValueType::scalar(LaneType::Bool(16));
    pub const B32: ValueType = ValueType::scalar(LaneType::Bool(32));
    pub const B64: ValueType = ValueType::scalar(LaneType::Bool(64));

    const fn scalar(lane: LaneType) -> Self {
        Self { lane, lanes: 1 }
    }

    /// Vector of `lanes` copies of this type's lane type.
    pub fn by(self, lanes: u16) -> MetaResult<Self> {
        let total = u32::from(self.lanes) * u32::from(lanes);
        if !lanes.is_power_of_two() || total > u32::from(MAX_LANES) {
            return Err(MetaError::UnknownType {
                name: format!("{}x{}", self, lanes),
            });
        }
        Ok(Self {
            lane: self.lane,
            lanes: total as u16,
        })
    }

    pub fn lane_type(self) -> LaneType {
        self.lane
    }

    pub fn is_vector(self) -> bool {
        self.lanes > 1
    }

    /// Name of the matching constant in the IR's `types` module.
    pub fn rust_name(self) -> String {
        format!("ir::types::{}", self.to_string().to_uppercase())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.lane.prefix(), self.lane.bits())?;
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl FromStr for ValueType {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || MetaError::UnknownType { name: s.to_string() };

        let (scalar, lanes) = match s.split_once('x') {
            Some((scalar, lanes)) => (scalar, Some(lanes)),
            None => (s, None),
        };

        let mut chars = scalar.chars();
        let prefix = chars.next().ok_or_else(unknown)?;
        let bits: u16 = chars.as_str().parse().map_err(|_| unknown())?;
        let lane = match prefix {
            'i' => LaneType::Int(bits),
            'f' => LaneType::Float(bits),
            'b' => LaneType::Bool(bits),
            _ => return Err(unknown()),
        };
        if !lane.is_valid() {
            return Err(unknown());
        }

        let ty = ValueType::scalar(lane);
        match lanes {
            None => Ok(ty),
            Some(lanes) => {
                let lanes: u16 = lanes.parse().map_err(|_| unknown())?;
                if lanes < 2 {
                    return Err(unknown());
                }
                ty.by(lanes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_names() {
        assert_eq!(ValueType::I32.to_string(), "i32");
        assert_eq!(ValueType::F64.to_string(), "f64");
        assert_eq!(ValueType::B1.to_string(), "b1");
        assert_eq!("i16".parse::<ValueType>().unwrap(), ValueType::I16);
    }

    #[test]
    fn test_vector_types() {
        let v = ValueType::I32.by(4).unwrap();
        assert_eq!(v.to_string(), "i32x4");
        assert!(v.is_vector());
        assert_eq!("f32x8".parse::<ValueType>().unwrap(), ValueType::F32.by(8).unwrap());
        assert_eq!(v.rust_name(), "ir::types::I32X4");
    }

    #[test]
    fn test_rejects_bad_types() {
        assert!(ValueType::I8.by(3).is_err());
        assert!(ValueType::I8.by(512).is_err());
        for name in ["", "i7", "f16", "x4", "q32", "i32x1", "i32xq"] {
            assert!(
                matches!(name.parse::<ValueType>(), Err(MetaError::UnknownType { .. })),
                "{name} should not parse"
            );
        }
    }
}
