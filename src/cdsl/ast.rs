// This module defines the abstract syntax of rewrite rule patterns. A Var is a named
// placeholder whose identity is a process-unique id, so two variables spelled the same
// way are still different variables. An Apply is an instruction applied to argument
// expressions, optionally specialized with concrete type arguments; its arity and type
// arguments are checked against an explicitly passed InstructionCatalog when it is
// built, so a malformed application never exists. A Def binds one or more output
// variables to the results of an Apply. Defs carry no context of their own: recording
// a definition in the source or destination pattern is the job of xform::Pattern.

//! Variables, instruction applications and definitions.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::instructions::{InstId, InstRef, InstructionCatalog};
use super::types::ValueType;
use crate::core::error::{MetaError, MetaResult};

static NEXT_VAR_ID: AtomicU32 = AtomicU32::new(0);

/// A named placeholder in a pattern.
///
/// Cloning a `Var` yields the same variable. Equality, hashing and ordering use
/// the identity assigned by [`Var::new`], never the name.
#[derive(Clone)]
pub struct Var {
    id: u32,
    name: Arc<str>,
}

impl Var {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Var {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({}#{})", self.name, self.id)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An expression in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Var(Var),
    Apply(Apply),
}

impl Expr {
    /// Call `f` for every variable used in this expression, left to right.
    pub fn visit_vars(&self, f: &mut dyn FnMut(&Var)) {
        match self {
            Expr::Var(var) => f(var),
            Expr::Apply(apply) => apply.visit_vars(f),
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Expr::Var(var) => Some(var),
            Expr::Apply(_) => None,
        }
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr::Var(var)
    }
}

impl From<&Var> for Expr {
    fn from(var: &Var) -> Self {
        Expr::Var(var.clone())
    }
}

impl From<Apply> for Expr {
    fn from(apply: Apply) -> Self {
        Expr::Apply(apply)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(var) => var.fmt(f),
            Expr::Apply(apply) => apply.fmt(f),
        }
    }
}

/// An instruction applied to arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apply {
    inst: InstId,
    name: Arc<str>,
    type_args: Vec<ValueType>,
    args: Vec<Expr>,
}

impl Apply {
    /// Apply `inst` to `args`.
    ///
    /// A bound reference brings its own type arguments and `type_args` must then be
    /// empty. The number of arguments must match the instruction's input arity.
    pub fn new<C>(
        catalog: &C,
        inst: impl Into<InstRef>,
        type_args: Vec<ValueType>,
        args: Vec<Expr>,
    ) -> MetaResult<Self>
    where
        C: InstructionCatalog + ?Sized,
    {
        let inst = inst.into();
        let id = inst.id();
        let info = catalog
            .inst_info(id)
            .ok_or(MetaError::UnknownInstruction { id: id.as_u32() })?;

        let type_args = match inst {
            InstRef::Bound(_, bound) => {
                if !type_args.is_empty() {
                    return Err(MetaError::AlreadyBound {
                        inst: info.name.to_string(),
                    });
                }
                bound
            }
            InstRef::Unbound(_) => type_args,
        };
        catalog.check_binding(id, &type_args)?;

        if args.len() != info.input_arity {
            return Err(MetaError::ArityMismatch {
                inst: info.name.to_string(),
                expected: info.input_arity,
                actual: args.len(),
            });
        }

        Ok(Self {
            inst: id,
            name: Arc::from(info.name),
            type_args,
            args,
        })
    }

    pub fn inst(&self) -> InstId {
        self.inst
    }

    /// Bare instruction name, without type arguments.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_args(&self) -> &[ValueType] {
        &self.type_args
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// Instruction name qualified by its type arguments: `iadd.i32`.
    pub fn inst_name(&self) -> String {
        let mut name = self.name.to_string();
        for ty in &self.type_args {
            name.push('.');
            name.push_str(&ty.to_string());
        }
        name
    }

    pub fn visit_vars(&self, f: &mut dyn FnMut(&Var)) {
        for arg in &self.args {
            arg.visit_vars(f);
        }
    }
}

impl fmt::Display for Apply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.inst_name())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Build an [`Apply`] without type arguments, converting each argument into an
/// [`Expr`].
///
/// ```ignore
/// let sum = apply!(&insts, iadd, &x, apply!(&insts, iadd, &x, &y)?)?;
/// ```
#[macro_export]
macro_rules! apply {
    ($catalog:expr, $inst:expr $(, $arg:expr)* $(,)?) => {
        $crate::cdsl::ast::Apply::new(
            $catalog,
            $inst,
            ::std::vec::Vec::new(),
            ::std::vec![$($crate::cdsl::ast::Expr::from($arg)),*],
        )
    };
}

/// The output variables of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefOutputs(Vec<Var>);

impl From<Var> for DefOutputs {
    fn from(var: Var) -> Self {
        DefOutputs(vec![var])
    }
}

impl From<&Var> for DefOutputs {
    fn from(var: &Var) -> Self {
        DefOutputs(vec![var.clone()])
    }
}

impl From<Vec<Var>> for DefOutputs {
    fn from(vars: Vec<Var>) -> Self {
        DefOutputs(vars)
    }
}

impl From<&[Var]> for DefOutputs {
    fn from(vars: &[Var]) -> Self {
        DefOutputs(vars.to_vec())
    }
}

impl<const N: usize> From<[Var; N]> for DefOutputs {
    fn from(vars: [Var; N]) -> Self {
        DefOutputs(vars.into())
    }
}

impl<const N: usize> From<[&Var; N]> for DefOutputs {
    fn from(vars: [&Var; N]) -> Self {
        DefOutputs(vars.into_iter().cloned().collect())
    }
}

impl From<(&Var, &Var)> for DefOutputs {
    fn from((a, b): (&Var, &Var)) -> Self {
        DefOutputs(vec![a.clone(), b.clone()])
    }
}

/// Output variables bound to the results of an instruction application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Def {
    outputs: Vec<Var>,
    value: Apply,
}

impl Def {
    pub fn new(outputs: impl Into<DefOutputs>, value: impl Into<Expr>) -> MetaResult<Self> {
        let value = match value.into() {
            Expr::Apply(apply) => apply,
            Expr::Var(var) => {
                return Err(MetaError::NotAnApplication {
                    found: var.name().to_string(),
                })
            }
        };
        let DefOutputs(outputs) = outputs.into();
        if outputs.is_empty() {
            return Err(MetaError::NoOutputs {
                value: value.to_string(),
            });
        }
        Ok(Self { outputs, value })
    }

    pub fn outputs(&self) -> &[Var] {
        &self.outputs
    }

    pub fn value(&self) -> &Apply {
        &self.value
    }

    /// Does this definition bind `var`?
    pub fn defines(&self, var: &Var) -> bool {
        self.outputs.contains(var)
    }
}

impl fmt::Display for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.outputs.as_slice() {
            write!(f, "{single}")?;
        } else {
            f.write_str("(")?;
            for (i, var) in self.outputs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{var}")?;
            }
            f.write_str(")")?;
        }
        write!(f, " << {}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdsl::instructions::{InstructionBuilder, InstructionGroup};
    use crate::cdsl::operands::Operand;
    use crate::cdsl::typevar::{TypeSet, TypeVar};

    fn catalog() -> (InstructionGroup, InstId, InstId) {
        let int = TypeVar::new("Int", "An integer type", TypeSet::INTS);
        let mut group = InstructionGroup::new("test", "");
        let iadd = group
            .push(
                InstructionBuilder::new("iadd", "Integer addition.")
                    .operands_in(vec![Operand::new("x", &int), Operand::new("y", &int)])
                    .operands_out(vec![Operand::new("a", &int)])
                    .build(),
            )
            .unwrap();
        let jump = group
            .push(
                InstructionBuilder::new("jump", "Jump.")
                    .operands_in(vec![Operand::entity("EBB", "ebb")])
                    .is_terminator(true)
                    .build(),
            )
            .unwrap();
        (group, iadd, jump)
    }

    #[test]
    fn test_var_identity_not_name() {
        let a = Var::new("x");
        let b = Var::new("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_apply_arity() {
        let (insts, iadd, _) = catalog();
        let (x, y) = (Var::new("x"), Var::new("y"));

        for n in [0, 1, 3] {
            let args = vec![Expr::from(&x); n];
            assert!(matches!(
                Apply::new(&insts, iadd, vec![], args),
                Err(MetaError::ArityMismatch { expected: 2, actual, .. }) if actual == n
            ));
        }
        let ok = apply!(&insts, iadd, &x, &y).unwrap();
        assert_eq!(ok.to_string(), "iadd(x, y)");
    }

    #[test]
    fn test_apply_type_arguments() {
        let (insts, iadd, jump) = catalog();
        let (x, y) = (Var::new("x"), Var::new("y"));
        let args = || vec![Expr::from(&x), Expr::from(&y)];

        let explicit = Apply::new(&insts, iadd, vec![ValueType::I32], args()).unwrap();
        assert_eq!(explicit.inst_name(), "iadd.i32");

        let bound = insts.bind(iadd, &[ValueType::I64]).unwrap();
        let from_ref = Apply::new(&insts, bound.clone(), vec![], args()).unwrap();
        assert_eq!(from_ref.to_string(), "iadd.i64(x, y)");
        assert_eq!(from_ref.type_args(), &[ValueType::I64]);

        assert!(matches!(
            Apply::new(&insts, bound, vec![ValueType::I64], args()),
            Err(MetaError::AlreadyBound { .. })
        ));
        assert!(matches!(
            Apply::new(&insts, jump, vec![ValueType::I32], vec![Expr::from(&x)]),
            Err(MetaError::NotPolymorphic { .. })
        ));
    }

    #[test]
    fn test_def_requires_application() {
        let (insts, iadd, _) = catalog();
        let (x, y, z) = (Var::new("x"), Var::new("y"), Var::new("z"));

        assert!(matches!(
            Def::new(&z, &x),
            Err(MetaError::NotAnApplication { found }) if found == "x"
        ));
        assert!(matches!(
            Def::new(Vec::<Var>::new(), apply!(&insts, iadd, &x, &y).unwrap()),
            Err(MetaError::NoOutputs { .. })
        ));

        let def = Def::new(&z, apply!(&insts, iadd, &x, &y).unwrap()).unwrap();
        assert_eq!(def.outputs(), &[z.clone()]);
        assert_eq!(def.to_string(), "z << iadd(x, y)");

        let pair = Def::new((&x, &y), apply!(&insts, iadd, &z, &z).unwrap()).unwrap();
        assert_eq!(pair.to_string(), "(x, y) << iadd(z, z)");
    }

    #[test]
    fn test_nested_rendering() {
        let (insts, iadd, _) = catalog();
        let (x, y) = (Var::new("x"), Var::new("y"));
        let inner = apply!(&insts, iadd, &x, &y).unwrap();
        let outer = apply!(&insts, iadd, &x, inner).unwrap();
        assert_eq!(outer.to_string(), "iadd(x, iadd(x, y))");
        assert_eq!(outer.to_string(), outer.clone().to_string());

        let mut seen = Vec::new();
        outer.visit_vars(&mut |v| seen.push(v.name().to_string()));
        assert_eq!(seen, ["x", "x", "y"]);
    }
}
