// This test suite validates rewrite rule construction and variable classification against
// the shared instruction set. It covers the two reference rules (a commuted addition where
// the same variable is the output of both patterns, and a rule whose source computes an
// intermediate value that the destination never recomputes), the partition property
// that every variable of a closed rule has exactly one role, arity checking for every
// shared instruction, rejection of redefinitions and of distinct variables sharing a
// name without registering the rule, and classification of independent rules on several
// threads at once.

//! Test transform construction and classification.

use tpde_meta::apply;
use tpde_meta::base::{self, Definitions};
use tpde_meta::cdsl::ast::{Apply, Expr, Var};
use tpde_meta::cdsl::types::ValueType;
use tpde_meta::cdsl::xform::{XForm, XFormGroup};
use tpde_meta::{classify, MetaError, VarKind};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn definitions() -> Definitions {
    init_logging();
    base::define().expect("base definitions are valid")
}

/// Check that the four role predicates partition the variables of `xform`.
fn assert_partition(xform: &XForm, vars: &[&Var]) {
    for var in vars {
        let roles = [
            xform.is_input(var),
            xform.is_output(var),
            xform.is_intermediate(var),
            xform.is_temp(var),
        ];
        assert_eq!(
            roles.iter().filter(|&&r| r).count(),
            1,
            "{var:?} has roles {roles:?}"
        );
    }
    assert_eq!(xform.classification().len(), vars.len());
}

#[test]
fn test_commuted_add() {
    let defs = definitions();
    let (insts, ops) = (&defs.instructions, &defs.opcodes);
    let (x, y, z) = (Var::new("x"), Var::new("y"), Var::new("z"));

    let xform = XForm::build(|b| {
        b.src(&z, apply!(insts, ops.iadd, &x, &y)?)?;
        b.dst(&z, apply!(insts, ops.iadd, &y, &x)?)
    })
    .unwrap();

    assert_eq!(xform.kind(&x), Some(VarKind::Input));
    assert_eq!(xform.kind(&y), Some(VarKind::Input));
    assert_eq!(xform.kind(&z), Some(VarKind::Output));
    assert_partition(&xform, &[&x, &y, &z]);
}

#[test]
fn test_intermediate_value() {
    let defs = definitions();
    let (insts, ops) = (&defs.instructions, &defs.opcodes);
    let (x, y, z, t) = (Var::new("x"), Var::new("y"), Var::new("z"), Var::new("t"));

    let xform = XForm::build(|b| {
        b.src(&t, apply!(insts, ops.iadd, &x, &y)?)?;
        b.src(&z, apply!(insts, ops.iadd, &t, &x)?)?;
        b.dst(&z, apply!(insts, ops.iadd, &x, apply!(insts, ops.iadd, &x, &y)?)?)
    })
    .unwrap();

    assert!(xform.is_intermediate(&t));
    assert!(xform.is_input(&x) && xform.is_input(&y));
    assert!(xform.is_output(&z));
    assert_eq!(xform.inputs(), &[x.clone(), y.clone()]);
    assert_eq!(
        xform.to_string(),
        "t << iadd(x, y); z << iadd(t, x) => z << iadd(x, iadd(x, y))"
    );
    assert_partition(&xform, &[&x, &y, &z, &t]);
}

#[test]
fn test_temporary_value() {
    let defs = definitions();
    let (insts, ops) = (&defs.instructions, &defs.opcodes);
    let (x, y, a, c) = (Var::new("x"), Var::new("y"), Var::new("a"), Var::new("c"));

    let xform = XForm::build(|b| {
        b.src(&a, apply!(insts, ops.band_not, &x, &y)?)?;
        b.dst(&c, apply!(insts, ops.bnot, &y)?)?;
        b.dst(&a, apply!(insts, ops.band, &x, &c)?)
    })
    .unwrap();

    assert!(xform.is_temp(&c));
    assert!(xform.is_output(&a));
    assert_partition(&xform, &[&x, &y, &a, &c]);
}

#[test]
fn test_arity_checked_for_every_instruction() {
    let defs = definitions();
    let insts = &defs.instructions;
    let x = Var::new("x");

    for (id, inst) in insts.iter() {
        let arity = inst.input_arity();
        for n in 0..=arity + 1 {
            let args = vec![Expr::from(&x); n];
            let result = Apply::new(insts, id, vec![], args);
            if n == arity {
                assert!(result.is_ok(), "{} with {n} arguments", inst.name);
            } else {
                assert!(
                    matches!(result, Err(MetaError::ArityMismatch { expected, actual, .. })
                        if expected == arity && actual == n),
                    "{} with {n} arguments",
                    inst.name
                );
            }
        }
    }
}

#[test]
fn test_redefinition_leaves_group_unchanged() {
    let defs = definitions();
    let (insts, ops) = (&defs.instructions, &defs.opcodes);
    let (x, y, z) = (Var::new("x"), Var::new("y"), Var::new("z"));
    let mut group = XFormGroup::new("test", "Test transforms.");

    let rejected = group.legalize(|b| {
        b.src(&z, apply!(insts, ops.iadd, &x, &y)?)?;
        b.dst(&z, apply!(insts, ops.isub, &x, &y)?)?;
        b.dst(&z, apply!(insts, ops.iadd, &y, &x)?)
    });
    let err = rejected.unwrap_err();
    assert!(matches!(err.kind(), MetaError::DuplicateDefinition { var, .. } if var == "z"));
    assert!(err.to_string().contains("xform_tests.rs"));
    assert!(group.is_empty());
}

#[test]
fn test_names_unique_within_rule() {
    let defs = definitions();
    let (insts, ops) = (&defs.instructions, &defs.opcodes);
    let (a, x) = (Var::new("a"), Var::new("x"));
    let second_x = Var::new("x");
    let mut group = XFormGroup::new("test", "Test transforms.");

    let rejected = group.legalize(|b| {
        b.src(&a, apply!(insts, ops.isub, &x, &second_x)?)?;
        b.dst(&a, apply!(insts, ops.iadd, &x, &second_x)?)
    });
    assert!(matches!(rejected.unwrap_err().kind(), MetaError::AmbiguousName { name } if name == "x"));
    assert!(group.is_empty());

    // Reusing a name in another rule is fine.
    let y = Var::new("y");
    group
        .legalize(|b| {
            b.src(&a, apply!(insts, ops.isub, &second_x, &y)?)?;
            b.dst(&a, apply!(insts, ops.iadd, &second_x, &y)?)
        })
        .unwrap();
    assert_eq!(group.len(), 1);
}

#[test]
fn test_bound_instruction_in_rule() {
    let defs = definitions();
    let (insts, ops) = (&defs.instructions, &defs.opcodes);
    let (x, a) = (Var::new("x"), Var::new("a"));
    let iconst_i32 = insts.bind(ops.iconst, &[ValueType::I32]).unwrap();

    let xform = XForm::build(|b| {
        b.src(&a, apply!(insts, ops.bnot, &x)?)?;
        b.dst(&a, apply!(insts, iconst_i32.clone(), &x)?)
    })
    .unwrap();
    assert_eq!(xform.to_string(), "a << bnot(x) => a << iconst.i32(x)");

    let err = XForm::build(|b| {
        let bound = Apply::new(insts, iconst_i32.clone(), vec![ValueType::I64], vec![(&x).into()])?;
        b.src(&a, bound)
    })
    .unwrap_err();
    assert!(matches!(err.kind(), MetaError::AlreadyBound { inst } if inst == "iconst"));
}

#[test]
fn test_parallel_classification() {
    let defs = definitions();
    let groups = &defs.transform_groups;

    let expected: Vec<Vec<Vec<VarKind>>> = groups
        .iter()
        .map(|g| {
            g.xforms()
                .iter()
                .map(|x| x.classification().iter().map(|(_, k)| k).collect())
                .collect()
        })
        .collect();

    std::thread::scope(|s| {
        let handles: Vec<_> = groups
            .iter()
            .map(|group| {
                s.spawn(move || {
                    group
                        .xforms()
                        .iter()
                        .map(|x| {
                            classify(x.src().defs(), x.dst().defs())
                                .iter()
                                .map(|(_, k)| k)
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}
