// This module defines the shared legalization patterns. The `narrow` group splits
// integer operations that are too wide for the target into operations on their low and
// high halves, chaining carries and borrows between the halves. The `expand` group
// rewrites instructions with a cheaper equivalent sequence on the same type: immediate
// operands become materialized constants and the negated bitwise operations become a
// `bnot` followed by the plain operation. Each rule is built with XFormGroup::legalize,
// so a malformed rule is reported with its location here and never enters the group.

//! Shared legalization patterns.

use super::instructions::Opcodes;
use crate::apply;
use crate::cdsl::ast::Var;
use crate::cdsl::instructions::{InstId, InstructionGroup};
use crate::cdsl::xform::XFormGroup;
use crate::core::error::RuleError;

/// Split `a << op(x, y)` with a carry or borrow chain between the halves.
#[track_caller]
fn narrow_with_carry(
    group: &mut XFormGroup,
    insts: &InstructionGroup,
    ops: &Opcodes,
    op: InstId,
    op_out: InstId,
    op_in: InstId,
) -> Result<(), RuleError> {
    let (x, y, a) = (Var::new("x"), Var::new("y"), Var::new("a"));
    let (xl, xh) = (Var::new("xl"), Var::new("xh"));
    let (yl, yh) = (Var::new("yl"), Var::new("yh"));
    let (al, ah, c) = (Var::new("al"), Var::new("ah"), Var::new("c"));

    group.legalize(|b| {
        b.src(&a, apply!(insts, op, &x, &y)?)?;
        b.dst((&xl, &xh), apply!(insts, ops.isplit_lohi, &x)?)?;
        b.dst((&yl, &yh), apply!(insts, ops.isplit_lohi, &y)?)?;
        b.dst((&al, &c), apply!(insts, op_out, &xl, &yl)?)?;
        b.dst(&ah, apply!(insts, op_in, &xh, &yh, &c)?)?;
        b.dst(&a, apply!(insts, ops.iconcat_lohi, &al, &ah)?)
    })?;
    Ok(())
}

/// Split the bitwise `a << op(x, y)` into independent halves.
#[track_caller]
fn narrow_bitwise(
    group: &mut XFormGroup,
    insts: &InstructionGroup,
    ops: &Opcodes,
    op: InstId,
) -> Result<(), RuleError> {
    let (x, y, a) = (Var::new("x"), Var::new("y"), Var::new("a"));
    let (xl, xh) = (Var::new("xl"), Var::new("xh"));
    let (yl, yh) = (Var::new("yl"), Var::new("yh"));
    let (al, ah) = (Var::new("al"), Var::new("ah"));

    group.legalize(|b| {
        b.src(&a, apply!(insts, op, &x, &y)?)?;
        b.dst((&xl, &xh), apply!(insts, ops.isplit_lohi, &x)?)?;
        b.dst((&yl, &yh), apply!(insts, ops.isplit_lohi, &y)?)?;
        b.dst(&al, apply!(insts, op, &xl, &yl)?)?;
        b.dst(&ah, apply!(insts, op, &xh, &yh)?)?;
        b.dst(&a, apply!(insts, ops.iconcat_lohi, &al, &ah)?)
    })?;
    Ok(())
}

/// Materialize the immediate of `a << op_imm(x, y)` for `op`.
#[track_caller]
fn expand_imm(
    group: &mut XFormGroup,
    insts: &InstructionGroup,
    ops: &Opcodes,
    op_imm: InstId,
    op: InstId,
) -> Result<(), RuleError> {
    let (x, y, a, c) = (Var::new("x"), Var::new("y"), Var::new("a"), Var::new("c"));

    group.legalize(|b| {
        b.src(&a, apply!(insts, op_imm, &x, &y)?)?;
        b.dst(&c, apply!(insts, ops.iconst, &y)?)?;
        b.dst(&a, apply!(insts, op, &x, &c)?)
    })?;
    Ok(())
}

/// Rewrite `a << op_not(x, y)` as `op(x, bnot(y))`.
#[track_caller]
fn expand_not(
    group: &mut XFormGroup,
    insts: &InstructionGroup,
    ops: &Opcodes,
    op_not: InstId,
    op: InstId,
) -> Result<(), RuleError> {
    let (x, y, a, c) = (Var::new("x"), Var::new("y"), Var::new("a"), Var::new("c"));

    group.legalize(|b| {
        b.src(&a, apply!(insts, op_not, &x, &y)?)?;
        b.dst(&c, apply!(insts, ops.bnot, &y)?)?;
        b.dst(&a, apply!(insts, op, &x, &c)?)
    })?;
    Ok(())
}

pub fn narrow(insts: &InstructionGroup, ops: &Opcodes) -> Result<XFormGroup, RuleError> {
    let mut narrow = XFormGroup::new(
        "narrow",
        r#"
        Legalize instructions by narrowing.

        The transformations in the 'narrow' group work by expressing
        instructions in terms of smaller types. Operations on vector types are
        expressed in terms of vector types with fewer lanes, and integer
        operations are expressed in terms of smaller integer types.
        "#,
    );

    narrow_with_carry(&mut narrow, insts, ops, ops.iadd, ops.iadd_cout, ops.iadd_cin)?;
    narrow_with_carry(&mut narrow, insts, ops, ops.isub, ops.isub_bout, ops.isub_bin)?;
    for op in [ops.band, ops.bor, ops.bxor] {
        narrow_bitwise(&mut narrow, insts, ops, op)?;
    }
    Ok(narrow)
}

pub fn expand(insts: &InstructionGroup, ops: &Opcodes) -> Result<XFormGroup, RuleError> {
    let mut expand = XFormGroup::new(
        "expand",
        r#"
        Legalize instructions by expansion.

        Rewrite instructions in terms of other instructions, generally
        operating on the same types as the original instructions.
        "#,
    );

    expand_imm(&mut expand, insts, ops, ops.iadd_imm, ops.iadd)?;
    expand_imm(&mut expand, insts, ops, ops.imul_imm, ops.imul)?;
    expand_not(&mut expand, insts, ops, ops.band_not, ops.band)?;
    expand_not(&mut expand, insts, ops, ops.bor_not, ops.bor)?;
    expand_not(&mut expand, insts, ops, ops.bxor_not, ops.bxor)?;
    Ok(expand)
}
