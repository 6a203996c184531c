//! Type variables for polymorphic instructions.

use std::fmt;

use super::types::{LaneType, ValueType};

/// The set of concrete types a type variable may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSet {
    pub ints: bool,
    pub floats: bool,
    pub bools: bool,
    pub simd: bool,
}

impl TypeSet {
    pub const INTS: TypeSet = TypeSet { ints: true, floats: false, bools: false, simd: false };
    pub const FLOATS: TypeSet = TypeSet { ints: false, floats: true, bools: false, simd: false };
    pub const BOOLS: TypeSet = TypeSet { ints: false, floats: false, bools: true, simd: false };
    pub const ANY: TypeSet = TypeSet { ints: true, floats: true, bools: true, simd: true };

    /// The same set, extended with vectors of its lane types.
    pub const fn with_simd(self) -> Self {
        Self { simd: true, ..self }
    }

    pub fn contains(&self, ty: ValueType) -> bool {
        if ty.is_vector() && !self.simd {
            return false;
        }
        match ty.lane_type() {
            LaneType::Int(_) => self.ints,
            LaneType::Float(_) => self.floats,
            LaneType::Bool(_) => self.bools,
        }
    }
}

/// A named polymorphic type parameter of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub name: &'static str,
    pub doc: &'static str,
    pub types: TypeSet,
}

impl TypeVar {
    pub fn new(name: &'static str, doc: &'static str, types: TypeSet) -> Self {
        Self { name, doc, types }
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
