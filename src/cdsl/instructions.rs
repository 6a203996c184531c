// This module defines instructions and the catalog that hands them out to rewrite rules.
// An Instruction is declared once with its input and output operands; its polymorphism,
// the ordered list of type variables (controlling one first) and whether the controlling
// type can be read off an input operand are derived when it is built. Instructions live
// in an InstructionGroup which assigns dense InstId handles. Rules never reach into a
// global registry: they receive an InstructionCatalog reference explicitly, and refer to
// instructions through InstRef, a closed sum of unbound and type-bound references.

//! Instruction definitions and the instruction catalog.

use std::fmt;

use hashbrown::HashMap;

use super::{blurb, camel_case};
use super::operands::Operand;
use super::typevar::TypeVar;
use super::types::ValueType;
use crate::core::error::{MetaError, MetaResult};

/// Dense handle of an instruction within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Reference to an instruction, possibly specialized to concrete types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstRef {
    Unbound(InstId),
    Bound(InstId, Vec<ValueType>),
}

impl InstRef {
    pub fn id(&self) -> InstId {
        match self {
            InstRef::Unbound(id) | InstRef::Bound(id, _) => *id,
        }
    }

    /// Type arguments carried by the reference itself.
    pub fn type_arguments(&self) -> &[ValueType] {
        match self {
            InstRef::Unbound(_) => &[],
            InstRef::Bound(_, types) => types,
        }
    }
}

impl From<InstId> for InstRef {
    fn from(id: InstId) -> Self {
        InstRef::Unbound(id)
    }
}

/// What a rule needs to know about an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstInfo<'a> {
    pub name: &'a str,
    pub input_arity: usize,
    pub is_polymorphic: bool,
    pub type_var_count: usize,
}

/// Read-only access to instruction definitions.
///
/// Rule construction takes the catalog as an explicit argument so rules can be
/// built and tested against any catalog, including small ad-hoc ones.
pub trait InstructionCatalog {
    /// Describe the instruction `id`, if this catalog defines it.
    fn inst_info(&self, id: InstId) -> Option<InstInfo<'_>>;

    /// Check that `types` may be bound to the type variables of `id`.
    ///
    /// The default only checks polymorphism and the number of type arguments.
    fn check_binding(&self, id: InstId, types: &[ValueType]) -> MetaResult<()> {
        let info = self
            .inst_info(id)
            .ok_or(MetaError::UnknownInstruction { id: id.as_u32() })?;
        if types.is_empty() {
            return Ok(());
        }
        if !info.is_polymorphic {
            return Err(MetaError::NotPolymorphic {
                inst: info.name.to_string(),
            });
        }
        if types.len() > info.type_var_count {
            return Err(MetaError::TooManyTypeArguments {
                inst: info.name.to_string(),
                max: info.type_var_count,
                actual: types.len(),
            });
        }
        Ok(())
    }
}

/// An instruction definition.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub name: &'static str,
    pub camel_name: String,
    pub doc: &'static str,
    pub ins: Vec<Operand>,
    pub outs: Vec<Operand>,
    pub is_terminator: bool,
    /// Distinct type variables, controlling type variable first.
    pub type_vars: Vec<TypeVar>,
    /// Whether the controlling type variable is the type of an input operand.
    pub use_typevar_operand: bool,
}

impl Instruction {
    pub fn input_arity(&self) -> usize {
        self.ins.len()
    }

    pub fn is_polymorphic(&self) -> bool {
        !self.type_vars.is_empty()
    }

    /// Name of the instruction builder method. Rust keywords get a trailing `_`.
    pub fn snake_name(&self) -> String {
        match self.name {
            "return" | "break" | "continue" | "loop" | "match" => format!("{}_", self.name),
            name => name.to_string(),
        }
    }

    /// First non-empty line of the documentation.
    pub fn blurb(&self) -> &str {
        blurb(self.doc)
    }

}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.outs.is_empty() {
            let outs: Vec<_> = self.outs.iter().map(|o| o.name).collect();
            write!(f, "{} = ", outs.join(", "))?;
        }
        let ins: Vec<_> = self.ins.iter().map(|o| o.name).collect();
        write!(f, "{} {}", self.name, ins.join(", "))
    }
}

/// Builder for [`Instruction`].
pub struct InstructionBuilder {
    name: &'static str,
    doc: &'static str,
    ins: Vec<Operand>,
    outs: Vec<Operand>,
    is_terminator: bool,
}

impl InstructionBuilder {
    pub fn new(name: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            doc,
            ins: Vec::new(),
            outs: Vec::new(),
            is_terminator: false,
        }
    }

    pub fn operands_in(mut self, operands: Vec<Operand>) -> Self {
        self.ins = operands;
        self
    }

    pub fn operands_out(mut self, operands: Vec<Operand>) -> Self {
        self.outs = operands;
        self
    }

    pub fn is_terminator(mut self, val: bool) -> Self {
        self.is_terminator = val;
        self
    }

    pub fn build(self) -> Instruction {
        // Prefer an input operand as the controlling type variable; fall back to the
        // first polymorphic result.
        let ctrl_in = self.ins.iter().find_map(Operand::type_var);
        let use_typevar_operand = ctrl_in.is_some();
        let ctrl = ctrl_in.or_else(|| self.outs.iter().find_map(Operand::type_var));

        let mut type_vars: Vec<TypeVar> = Vec::new();
        let all = ctrl
            .into_iter()
            .chain(self.ins.iter().filter_map(Operand::type_var))
            .chain(self.outs.iter().filter_map(Operand::type_var));
        for tv in all {
            if !type_vars.iter().any(|seen| seen.name == tv.name) {
                type_vars.push(tv.clone());
            }
        }

        Instruction {
            name: self.name,
            camel_name: camel_case(self.name),
            doc: self.doc,
            ins: self.ins,
            outs: self.outs,
            is_terminator: self.is_terminator,
            type_vars,
            use_typevar_operand,
        }
    }
}

/// A named set of instructions, and the catalog rules are built against.
#[derive(Debug, Clone)]
pub struct InstructionGroup {
    pub name: &'static str,
    pub doc: &'static str,
    instructions: Vec<Instruction>,
    by_name: HashMap<&'static str, InstId>,
}

impl InstructionGroup {
    pub fn new(name: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            doc,
            instructions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Add an instruction and return its handle.
    pub fn push(&mut self, inst: Instruction) -> MetaResult<InstId> {
        if self.by_name.contains_key(inst.name) {
            return Err(MetaError::DuplicateInstruction {
                group: self.name.to_string(),
                name: inst.name.to_string(),
            });
        }
        let id = InstId(self.instructions.len() as u32);
        log::trace!("instruction {} = #{} in group {}", inst.name, id.0, self.name);
        self.by_name.insert(inst.name, id);
        self.instructions.push(inst);
        Ok(id)
    }

    pub fn get(&self, id: InstId) -> Option<&Instruction> {
        self.instructions.get(id.index())
    }

    pub fn by_name(&self, name: &str) -> Option<InstId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstId, &Instruction)> {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, inst)| (InstId(i as u32), inst))
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Bind type arguments to a polymorphic instruction.
    ///
    /// Binding an already bound reference appends to its type arguments, so
    /// `uextend.i32` can be bound further to `uextend.i32.i8`.
    pub fn bind(&self, inst: impl Into<InstRef>, types: &[ValueType]) -> MetaResult<InstRef> {
        let inst = inst.into();
        let id = inst.id();
        let mut all = inst.type_arguments().to_vec();
        all.extend_from_slice(types);
        self.check_binding(id, &all)?;
        Ok(InstRef::Bound(id, all))
    }
}

impl InstructionCatalog for InstructionGroup {
    fn inst_info(&self, id: InstId) -> Option<InstInfo<'_>> {
        self.get(id).map(|inst| InstInfo {
            name: inst.name,
            input_arity: inst.input_arity(),
            is_polymorphic: inst.is_polymorphic(),
            type_var_count: inst.type_vars.len(),
        })
    }

    fn check_binding(&self, id: InstId, types: &[ValueType]) -> MetaResult<()> {
        let inst = self
            .get(id)
            .ok_or(MetaError::UnknownInstruction { id: id.as_u32() })?;
        if types.is_empty() {
            return Ok(());
        }
        if !inst.is_polymorphic() {
            return Err(MetaError::NotPolymorphic {
                inst: inst.name.to_string(),
            });
        }
        if types.len() > inst.type_vars.len() {
            return Err(MetaError::TooManyTypeArguments {
                inst: inst.name.to_string(),
                max: inst.type_vars.len(),
                actual: types.len(),
            });
        }
        for (tv, ty) in inst.type_vars.iter().zip(types) {
            if !tv.types.contains(*ty) {
                return Err(MetaError::TypeNotAllowed {
                    inst: inst.name.to_string(),
                    typevar: tv.name.to_string(),
                    ty: ty.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdsl::typevar::TypeSet;

    fn int() -> TypeVar {
        TypeVar::new("Int", "A scalar or vector integer type", TypeSet::INTS.with_simd())
    }

    fn test_group() -> (InstructionGroup, InstId, InstId, InstId) {
        let mut group = InstructionGroup::new("test", "Test instructions");
        let iadd = group
            .push(
                InstructionBuilder::new("iadd", "Wrapping integer addition.")
                    .operands_in(vec![Operand::new("x", int()), Operand::new("y", int())])
                    .operands_out(vec![Operand::new("a", int())])
                    .build(),
            )
            .unwrap();
        let iconst = group
            .push(
                InstructionBuilder::new("iconst", "Integer constant.")
                    .operands_in(vec![Operand::imm("N", "imm64")])
                    .operands_out(vec![Operand::new("a", int())])
                    .build(),
            )
            .unwrap();
        let ret = group
            .push(
                InstructionBuilder::new("return", "Return from the function.\n\nMore text.")
                    .is_terminator(true)
                    .build(),
            )
            .unwrap();
        (group, iadd, iconst, ret)
    }

    #[test]
    fn test_derived_properties() {
        let (group, iadd, iconst, ret) = test_group();
        let iadd = group.get(iadd).unwrap();
        assert!(iadd.is_polymorphic());
        assert!(iadd.use_typevar_operand);
        assert_eq!(iadd.type_vars.len(), 1);
        assert_eq!(iadd.to_string(), "a = iadd x, y");

        let iconst = group.get(iconst).unwrap();
        assert!(iconst.is_polymorphic());
        assert!(!iconst.use_typevar_operand);
        assert_eq!(iconst.input_arity(), 1);

        let ret = group.get(ret).unwrap();
        assert!(!ret.is_polymorphic());
        assert_eq!(ret.snake_name(), "return_");
        assert_eq!(ret.camel_name, "Return");
        assert_eq!(ret.blurb(), "Return from the function.");
    }

    #[test]
    fn test_duplicate_instruction_rejected() {
        let (mut group, ..) = test_group();
        let again = InstructionBuilder::new("iadd", "again").build();
        assert!(matches!(
            group.push(again),
            Err(MetaError::DuplicateInstruction { name, .. }) if name == "iadd"
        ));
        assert_eq!(group.by_name("iconst").map(InstId::index), Some(1));
    }

    #[test]
    fn test_bind_checks() {
        let (group, iadd, _, ret) = test_group();

        let bound = group.bind(iadd, &[ValueType::I32]).unwrap();
        assert_eq!(bound, InstRef::Bound(iadd, vec![ValueType::I32]));

        assert!(matches!(
            group.bind(bound, &[ValueType::I8]),
            Err(MetaError::TooManyTypeArguments { max: 1, actual: 2, .. })
        ));
        assert!(matches!(
            group.bind(ret, &[ValueType::I32]),
            Err(MetaError::NotPolymorphic { .. })
        ));
        assert!(matches!(
            group.bind(iadd, &[ValueType::F32]),
            Err(MetaError::TypeNotAllowed { .. })
        ));
    }

    #[test]
    fn test_catalog_info() {
        let (group, iadd, ..) = test_group();
        let info = group.inst_info(iadd).unwrap();
        assert_eq!(info.name, "iadd");
        assert_eq!(info.input_arity, 2);
        assert!(group.inst_info(InstId(99)).is_none());
    }
}
