//! The shared instruction set.
//!
//! Every target starts from these instructions. Legalization rewrites the ones a
//! target cannot execute directly in terms of ones it can.

use crate::cdsl::instructions::{InstId, InstructionBuilder, InstructionGroup};
use crate::cdsl::operands::Operand;
use crate::cdsl::types::ValueType;
use crate::cdsl::typevar::{TypeSet, TypeVar};
use crate::core::error::MetaResult;

/// Handles of the shared instructions.
#[derive(Debug, Clone, Copy)]
pub struct Opcodes {
    pub jump: InstId,
    pub return_: InstId,
    pub iconst: InstId,
    pub iadd: InstId,
    pub isub: InstId,
    pub imul: InstId,
    pub iadd_imm: InstId,
    pub imul_imm: InstId,
    pub iadd_cin: InstId,
    pub iadd_cout: InstId,
    pub isub_bin: InstId,
    pub isub_bout: InstId,
    pub band: InstId,
    pub bor: InstId,
    pub bxor: InstId,
    pub bnot: InstId,
    pub band_not: InstId,
    pub bor_not: InstId,
    pub bxor_not: InstId,
    pub isplit_lohi: InstId,
    pub iconcat_lohi: InstId,
}

fn binary(group: &mut InstructionGroup, name: &'static str, doc: &'static str, tv: &TypeVar) -> MetaResult<InstId> {
    group.push(
        InstructionBuilder::new(name, doc)
            .operands_in(vec![Operand::new("x", tv), Operand::new("y", tv)])
            .operands_out(vec![Operand::new("a", tv)])
            .build(),
    )
}

fn binary_imm(group: &mut InstructionGroup, name: &'static str, doc: &'static str, tv: &TypeVar) -> MetaResult<InstId> {
    group.push(
        InstructionBuilder::new(name, doc)
            .operands_in(vec![Operand::new("x", tv), Operand::imm("Y", "imm64")])
            .operands_out(vec![Operand::new("a", tv)])
            .build(),
    )
}

/// Populate `group` with the shared instructions.
pub fn define(group: &mut InstructionGroup) -> MetaResult<Opcodes> {
    let int = TypeVar::new("Int", "A scalar or vector integer type", TypeSet::INTS.with_simd());
    let i_b = TypeVar::new(
        "iB",
        "A scalar or vector integer or boolean type",
        TypeSet {
            ints: true,
            floats: false,
            bools: true,
            simd: true,
        },
    );
    let wide_int = TypeVar::new("WideInt", "A scalar integer type wider than 8 bits", TypeSet::INTS);
    let half_int = TypeVar::new("HalfInt", "Half the width of the split integer", TypeSet::INTS);

    let c_in = Operand::new("c_in", ValueType::B1).with_doc("Input carry flag");
    let c_out = Operand::new("c_out", ValueType::B1).with_doc("Output carry flag");
    let b_in = Operand::new("b_in", ValueType::B1).with_doc("Input borrow flag");
    let b_out = Operand::new("b_out", ValueType::B1).with_doc("Output borrow flag");

    let jump = group.push(
        InstructionBuilder::new(
            "jump",
            r#"
            Jump.

            Unconditionally jump to an extended basic block.
            "#,
        )
        .operands_in(vec![Operand::entity("EBB", "ebb").with_doc("Destination extended basic block")])
        .is_terminator(true)
        .build(),
    )?;

    let return_ = group.push(
        InstructionBuilder::new(
            "return",
            r#"
            Return from the function.

            Unconditionally transfer control to the calling function.
            "#,
        )
        .is_terminator(true)
        .build(),
    )?;

    let iconst = group.push(
        InstructionBuilder::new(
            "iconst",
            r#"
            Integer constant.

            Create a scalar integer SSA value with an immediate constant value.
            "#,
        )
        .operands_in(vec![Operand::imm("N", "imm64")])
        .operands_out(vec![Operand::new("a", &int).with_doc("A constant integer scalar or vector value")])
        .build(),
    )?;

    let iadd = binary(group, "iadd", "Wrapping integer addition: a := x + y mod 2^B.", &int)?;
    let isub = binary(group, "isub", "Wrapping integer subtraction: a := x - y mod 2^B.", &int)?;
    let imul = binary(group, "imul", "Wrapping integer multiplication: a := x y mod 2^B.", &int)?;

    let iadd_imm = binary_imm(
        group,
        "iadd_imm",
        "Add immediate integer.\n\nSame as `iadd`, but one operand is an immediate constant.",
        &int,
    )?;
    let imul_imm = binary_imm(
        group,
        "imul_imm",
        "Integer multiplication by immediate constant.",
        &int,
    )?;

    let iadd_cin = group.push(
        InstructionBuilder::new(
            "iadd_cin",
            "Add integers with carry in.\n\nSame as `iadd` with an additional carry input.",
        )
        .operands_in(vec![Operand::new("x", &i_b), Operand::new("y", &i_b), c_in])
        .operands_out(vec![Operand::new("a", &i_b)])
        .build(),
    )?;

    let iadd_cout = group.push(
        InstructionBuilder::new(
            "iadd_cout",
            "Add integers with carry out.\n\nSame as `iadd` with an additional carry output.",
        )
        .operands_in(vec![Operand::new("x", &i_b), Operand::new("y", &i_b)])
        .operands_out(vec![Operand::new("a", &i_b), c_out])
        .build(),
    )?;

    let isub_bin = group.push(
        InstructionBuilder::new(
            "isub_bin",
            "Subtract integers with borrow in.\n\nSame as `isub` with an additional borrow input.",
        )
        .operands_in(vec![Operand::new("x", &i_b), Operand::new("y", &i_b), b_in])
        .operands_out(vec![Operand::new("a", &i_b)])
        .build(),
    )?;

    let isub_bout = group.push(
        InstructionBuilder::new(
            "isub_bout",
            "Subtract integers with borrow out.\n\nSame as `isub` with an additional borrow output.",
        )
        .operands_in(vec![Operand::new("x", &i_b), Operand::new("y", &i_b)])
        .operands_out(vec![Operand::new("a", &i_b), b_out])
        .build(),
    )?;

    let band = binary(group, "band", "Bitwise and.", &i_b)?;
    let bor = binary(group, "bor", "Bitwise or.", &i_b)?;
    let bxor = binary(group, "bxor", "Bitwise xor.", &i_b)?;

    let bnot = group.push(
        InstructionBuilder::new("bnot", "Bitwise not.")
            .operands_in(vec![Operand::new("x", &i_b)])
            .operands_out(vec![Operand::new("a", &i_b)])
            .build(),
    )?;

    let band_not = binary(group, "band_not", "Bitwise and not.\n\nComputes `x & ~y`.", &i_b)?;
    let bor_not = binary(group, "bor_not", "Bitwise or not.\n\nComputes `x | ~y`.", &i_b)?;
    let bxor_not = binary(group, "bxor_not", "Bitwise xor not.\n\nComputes `x ^ ~y`.", &i_b)?;

    let isplit_lohi = group.push(
        InstructionBuilder::new(
            "isplit_lohi",
            r#"
            Split a scalar integer into low and high parts.

            Returns the low half of `x` and the high half of `x` as two independent
            values.
            "#,
        )
        .operands_in(vec![Operand::new("x", &wide_int)])
        .operands_out(vec![
            Operand::new("lo", &half_int).with_doc("The low bits of `x`"),
            Operand::new("hi", &half_int).with_doc("The high bits of `x`"),
        ])
        .build(),
    )?;

    let iconcat_lohi = group.push(
        InstructionBuilder::new(
            "iconcat_lohi",
            r#"
            Concatenate low and high bits to form a larger integer type.
            "#,
        )
        .operands_in(vec![Operand::new("lo", &half_int), Operand::new("hi", &half_int)])
        .operands_out(vec![Operand::new("a", &wide_int).with_doc("The concatenation of `lo` and `hi`")])
        .build(),
    )?;

    Ok(Opcodes {
        jump,
        return_,
        iconst,
        iadd,
        isub,
        imul,
        iadd_imm,
        imul_imm,
        iadd_cin,
        iadd_cout,
        isub_bin,
        isub_bout,
        band,
        bor,
        bxor,
        bnot,
        band_not,
        bor_not,
        bxor_not,
        isplit_lohi,
        iconcat_lohi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_instructions() {
        let mut group = InstructionGroup::new("base", "Shared base instruction set");
        let ops = define(&mut group).unwrap();
        assert_eq!(group.len(), 21);
        assert_eq!(group.by_name("iadd"), Some(ops.iadd));

        let ret = group.get(ops.return_).unwrap();
        assert_eq!(ret.snake_name(), "return_");
        assert!(ret.is_terminator && !ret.is_polymorphic());

        let iconst = group.get(ops.iconst).unwrap();
        assert!(iconst.is_polymorphic() && !iconst.use_typevar_operand);

        let cout = group.get(ops.iadd_cout).unwrap();
        assert_eq!(cout.outs.len(), 2);
        assert_eq!(cout.type_vars.len(), 1);

        let split = group.get(ops.isplit_lohi).unwrap();
        assert_eq!(split.type_vars[0].name, "WideInt");
        assert_eq!(split.blurb(), "Split a scalar integer into low and high parts.");
    }

    #[test]
    fn test_defining_twice_fails() {
        let mut group = InstructionGroup::new("base", "");
        define(&mut group).unwrap();
        assert!(define(&mut group).is_err());
    }
}
