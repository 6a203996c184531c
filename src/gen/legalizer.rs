// This module generates the legalizer: one Rust function per transform group that looks
// at the instruction under the cursor and, if a transform of the group matches its
// opcode, rewrites it. The generated code unwraps the operands of the source instruction
// into the input variables, then emits the destination definitions in order. The
// classification decides what happens to the source results: outputs are detached and
// reattached to the destination instructions that recompute them, or, when the last
// destination definition produces exactly the source outputs, the source instruction is
// replaced in place. Otherwise the source instruction is removed once the replacement
// sequence has been inserted. Nested destination applications are hoisted into
// temporaries because the instruction builder borrows the data flow graph mutably.

//! Legalizer source generation.

use std::path::Path;

use hashbrown::HashSet;

use super::srcgen::Formatter;
use crate::cdsl::ast::{Def, Var};
use crate::cdsl::classify::VarKind;
use crate::cdsl::instructions::{InstId, Instruction, InstructionGroup};
use crate::cdsl::operands::OperandKind;
use crate::cdsl::xform::{XForm, XFormGroup};
use crate::core::error::{MetaError, MetaResult};
use crate::core::session::MetaSession;
use crate::emit::{self, CallArg, CallExpr, FlatCall};

fn codegen_error(xform: &XForm, reason: &str) -> MetaError {
    MetaError::CodeGeneration {
        reason: format!(
            "transform at {}:{}: {reason}",
            xform.location().file(),
            xform.location().line()
        ),
    }
}

fn lookup<'a>(insts: &'a InstructionGroup, id: InstId) -> MetaResult<&'a Instruction> {
    insts
        .get(id)
        .ok_or(MetaError::UnknownInstruction { id: id.as_u32() })
}

/// The single source definition of a legalization transform.
fn source_def(xform: &XForm) -> MetaResult<&Def> {
    let def = match xform.src().defs() {
        [def] => def,
        _ => return Err(codegen_error(xform, "legalization needs exactly one source definition")),
    };
    if def.value().args().iter().any(|arg| arg.as_var().is_none()) {
        return Err(codegen_error(xform, "source arguments must be variables"));
    }
    Ok(def)
}

/// Render the builder call for `call`, adding the controlling type when the
/// instruction cannot infer it from an operand.
fn builder_call(insts: &InstructionGroup, call: &CallExpr) -> MetaResult<String> {
    let inst = lookup(insts, call.inst)?;
    let mut args: Vec<String> = Vec::with_capacity(call.args.len() + 1);
    if inst.is_polymorphic() && !inst.use_typevar_operand {
        args.push(match call.type_args.first() {
            Some(ty) => ty.rust_name(),
            None => "ctrl_type".to_string(),
        });
    }
    for arg in &call.args {
        match arg {
            CallArg::Var(name) => args.push(name.clone()),
            CallArg::Call(_) => {
                return Err(MetaError::CodeGeneration {
                    reason: format!("nested call in `{call}` was not hoisted"),
                })
            }
        }
    }
    Ok(format!("{}({})", inst.snake_name(), args.join(", ")))
}

fn needs_ctrl_type(insts: &InstructionGroup, calls: &[FlatCall]) -> bool {
    calls.iter().any(|flat| {
        insts.get(flat.call.inst).is_some_and(|inst| {
            inst.is_polymorphic() && !inst.use_typevar_operand && flat.call.type_args.is_empty()
        })
    })
}

/// Whether `var` is an output of `xform`. Every variable of an accepted rule is
/// classified, so a miss is reported as `UnknownVariable`.
fn is_output(xform: &XForm, var: &Var) -> MetaResult<bool> {
    Ok(xform.classification().expect_kind(var)? == VarKind::Output)
}

fn binding(outputs: &[Var]) -> String {
    match outputs {
        [single] => single.name().to_string(),
        _ => {
            let names: Vec<_> = outputs.iter().map(Var::name).collect();
            format!("({})", names.join(", "))
        }
    }
}

/// Emit the match arm body for one transform.
fn gen_xform(fmt: &mut Formatter<'_>, insts: &InstructionGroup, xform: &XForm) -> MetaResult<()> {
    let src = source_def(xform)?;
    let src_inst = lookup(insts, src.value().inst())?;
    let dst = xform.dst().defs();

    // The source instruction is rewritten in place when the last destination
    // definition recomputes exactly its results.
    let replace = dst.last().is_some_and(|last| last.outputs() == src.outputs());

    // Flatten every destination definition up front so the arm knows whether the
    // controlling type is needed. Hoisted names skip those the rule already uses.
    let taken: HashSet<&str> = xform.classification().iter().map(|(var, _)| var.name()).collect();
    let mut tmp = 0;
    let mut fresh = || loop {
        tmp += 1;
        let name = format!("tmp{tmp}");
        if !taken.contains(name.as_str()) {
            return name;
        }
    };
    let flat: Vec<(&Def, Vec<FlatCall>)> = dst
        .iter()
        .map(|def| (def, emit::flatten(emit::render(def.value()), &mut fresh)))
        .collect();
    let all_calls: Vec<FlatCall> = flat.iter().flat_map(|(_, calls)| calls.iter().cloned()).collect();

    fmt.comment(&format!("Unwrap {src}"));
    if needs_ctrl_type(insts, &all_calls) {
        fmt.line("let ctrl_type = dfg.ctrl_typevar(inst);");
    }
    let mut value_index = 0;
    for (position, (operand, arg)) in src_inst.ins.iter().zip(src.value().args()).enumerate() {
        let name = arg.as_var().map(Var::name).unwrap_or("_");
        match &operand.kind {
            OperandKind::Value(_) | OperandKind::TypeVar(_) => {
                fmt.line(&format!("let {name} = dfg.inst_args(inst)[{value_index}];"));
                value_index += 1;
            }
            OperandKind::Immediate(_) => {
                fmt.line(&format!("let {name} = dfg[inst].imm_operand({position});"));
            }
            OperandKind::EntityRef(_) => {
                fmt.line(&format!("let {name} = dfg[inst].entity_operand({position});"));
            }
        }
    }

    let mut reused: Vec<(usize, &Var)> = Vec::new();
    for (i, var) in src.outputs().iter().enumerate() {
        if is_output(xform, var)? {
            reused.push((i, var));
        }
    }
    if !replace && !reused.is_empty() {
        fmt.line("let results = dfg.detach_results(inst);");
        for (i, var) in &reused {
            fmt.line(&format!("let {} = results[{i}];", var.name()));
        }
    }
    fmt.line("");

    let last = flat.len().saturating_sub(1);
    for (n, (def, calls)) in flat.iter().enumerate() {
        for hoisted in &calls[..calls.len() - 1] {
            let name = hoisted.result.as_deref().unwrap_or("_");
            fmt.line(&format!(
                "let {name} = dfg.ins(pos).{};",
                builder_call(insts, &hoisted.call)?
            ));
        }
        let top = match calls.last() {
            Some(top) => builder_call(insts, &top.call)?,
            None => continue,
        };

        if replace && n == last {
            fmt.line(&format!("dfg.replace(inst).{top};"));
            continue;
        }

        let outputs = def.outputs();
        let mut slots: Vec<String> = Vec::with_capacity(outputs.len());
        let mut any_reused = false;
        for var in outputs {
            if is_output(xform, var)? {
                any_reused = true;
                slots.push(format!("Some({})", var.name()));
            } else {
                slots.push("None".to_string());
            }
        }
        let builder = if any_reused {
            format!("dfg.ins(pos).with_results([{}])", slots.join(", "))
        } else {
            "dfg.ins(pos)".to_string()
        };
        fmt.line(&format!("let {} = {builder}.{top};", binding(outputs)));
    }

    if !replace {
        fmt.line("assert_eq!(pos.remove_inst(), inst);");
    }
    fmt.line("true");
    Ok(())
}

/// Emit the legalization function for `group`.
pub fn gen_group(fmt: &mut Formatter<'_>, insts: &InstructionGroup, group: &XFormGroup) -> MetaResult<()> {
    let mut opcodes: HashSet<InstId> = HashSet::new();
    for xform in group.xforms() {
        let src = source_def(xform)?;
        if !opcodes.insert(src.value().inst()) {
            return Err(codegen_error(
                xform,
                &format!("second transform for `{}` in group `{}`", src.value().name(), group.name),
            ));
        }
    }

    fmt.doc_comment(group.doc);
    fmt.line("#[allow(unused_variables, unused_assignments)]");
    fmt.line(&format!(
        "pub fn {}(dfg: &mut ir::DataFlowGraph, pos: &mut ir::Cursor) -> bool {{",
        group.name
    ));
    fmt.indent(|fmt| -> MetaResult<()> {
        fmt.line("use ir::InstBuilder;");
        fmt.line("let inst = match pos.current_inst() {");
        fmt.indent(|fmt| {
            fmt.line("Some(inst) => inst,");
            fmt.line("None => return false,");
        });
        fmt.line("};");
        fmt.line("match dfg[inst].opcode() {");
        fmt.indent(|fmt| -> MetaResult<()> {
            for xform in group.xforms() {
                let src = source_def(xform)?;
                let inst = lookup(insts, src.value().inst())?;
                fmt.line(&format!("ir::Opcode::{} => {{", inst.camel_name));
                fmt.indent(|fmt| gen_xform(fmt, insts, xform))?;
                fmt.line("}");
            }
            fmt.line("_ => false,");
            Ok(())
        })?;
        fmt.line("}");
        Ok(())
    })?;
    fmt.line("}");
    Ok(())
}

/// Generate `filename` in `out_dir` with one function per transform group.
pub fn generate(
    session: &MetaSession<'_>,
    insts: &InstructionGroup,
    groups: &[XFormGroup],
    out_dir: &Path,
    filename: &str,
) -> MetaResult<()> {
    let mut fmt = session.formatter();
    fmt.line("//! Legalization patterns, generated by metagen.");
    fmt.line("");
    fmt.line("use crate::ir;");
    for group in groups {
        log::debug!("generating legalizer for group {} ({} transforms)", group.name, group.len());
        for xform in group.xforms() {
            session.record_transform(xform.classification().counts());
        }
        fmt.line("");
        gen_group(&mut fmt, insts, group)?;
    }
    let written = fmt.update_file(out_dir.join(filename))?;
    session.record_file(fmt.line_count(), written);
    Ok(())
}
