//! Instruction operands.

use std::fmt;

use super::typevar::TypeVar;
use super::types::ValueType;

/// What an operand carries.
///
/// Value operands are SSA values, either of a fixed type or of a type variable.
/// Immediates are encoded in the instruction itself and entity references point
/// at something declared in the function preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    Value(ValueType),
    TypeVar(TypeVar),
    Immediate(&'static str),
    EntityRef(&'static str),
}

impl From<ValueType> for OperandKind {
    fn from(ty: ValueType) -> Self {
        OperandKind::Value(ty)
    }
}

impl From<TypeVar> for OperandKind {
    fn from(tv: TypeVar) -> Self {
        OperandKind::TypeVar(tv)
    }
}

impl From<&TypeVar> for OperandKind {
    fn from(tv: &TypeVar) -> Self {
        OperandKind::TypeVar(tv.clone())
    }
}

/// A named input or output of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub name: &'static str,
    doc: Option<&'static str>,
    pub kind: OperandKind,
}

impl Operand {
    pub fn new(name: &'static str, kind: impl Into<OperandKind>) -> Self {
        Self {
            name,
            doc: None,
            kind: kind.into(),
        }
    }

    /// Immediate operand of the given immediate kind.
    pub fn imm(name: &'static str, kind: &'static str) -> Self {
        Self::new(name, OperandKind::Immediate(kind))
    }

    /// Entity reference operand.
    pub fn entity(name: &'static str, kind: &'static str) -> Self {
        Self::new(name, OperandKind::EntityRef(kind))
    }

    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn doc(&self) -> Option<&str> {
        if let Some(doc) = self.doc {
            return Some(doc);
        }
        match &self.kind {
            OperandKind::TypeVar(tv) => Some(tv.doc),
            _ => None,
        }
    }

    pub fn type_var(&self) -> Option<&TypeVar> {
        match &self.kind {
            OperandKind::TypeVar(tv) => Some(tv),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.name)
    }
}
