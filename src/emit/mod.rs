// This module adapts instruction applications to the call-expression form consumed by
// source generators. render() turns an Apply into a CallExpr tree: the operation is the
// instruction name qualified by its type arguments, variables become named arguments and
// nested applications become nested calls. The conversion depends on nothing but the
// expression tree. flatten() linearizes a tree into a sequence of calls whose nested
// operands are replaced by fresh temporaries, for backends that cannot nest builder calls.

//! Call-expression rendering of instruction applications.

use std::fmt;

use crate::cdsl::ast::{Apply, Expr};
use crate::cdsl::instructions::InstId;
use crate::cdsl::types::ValueType;

/// One argument of a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Var(String),
    Call(CallExpr),
}

impl fmt::Display for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallArg::Var(name) => f.write_str(name),
            CallArg::Call(call) => call.fmt(f),
        }
    }
}

/// An instruction call as seen by a source generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    /// Instruction name with dot-separated type arguments: `iadd.i32`.
    pub operation: String,
    pub inst: InstId,
    pub type_args: Vec<ValueType>,
    pub args: Vec<CallArg>,
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operation)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Render `apply` as a call expression.
pub fn render(apply: &Apply) -> CallExpr {
    let args = apply
        .args()
        .iter()
        .map(|arg| match arg {
            Expr::Var(var) => CallArg::Var(var.name().to_string()),
            Expr::Apply(nested) => CallArg::Call(render(nested)),
        })
        .collect();
    CallExpr {
        operation: apply.inst_name(),
        inst: apply.inst(),
        type_args: apply.type_args().to_vec(),
        args,
    }
}

/// A call whose arguments are all variables, producing `result` when it is a
/// hoisted nested call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatCall {
    pub result: Option<String>,
    pub call: CallExpr,
}

/// Hoist nested calls out of `call`, innermost first.
///
/// Hoisted calls are bound to names produced by `fresh`; the last element is
/// `call` itself with `result` unset.
pub fn flatten(call: CallExpr, fresh: &mut dyn FnMut() -> String) -> Vec<FlatCall> {
    let mut out = Vec::new();
    let top = hoist(call, fresh, &mut out);
    out.push(FlatCall {
        result: None,
        call: top,
    });
    out
}

fn hoist(call: CallExpr, fresh: &mut dyn FnMut() -> String, out: &mut Vec<FlatCall>) -> CallExpr {
    let CallExpr {
        operation,
        inst,
        type_args,
        args,
    } = call;
    let args = args
        .into_iter()
        .map(|arg| match arg {
            CallArg::Var(name) => CallArg::Var(name),
            CallArg::Call(nested) => {
                let nested = hoist(nested, fresh, out);
                let name = fresh();
                out.push(FlatCall {
                    result: Some(name.clone()),
                    call: nested,
                });
                CallArg::Var(name)
            }
        })
        .collect();
    CallExpr {
        operation,
        inst,
        type_args,
        args,
    }
}
