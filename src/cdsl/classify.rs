// This module classifies the variables of a rewrite rule. Given the definitions of the
// source pattern and of the destination pattern, every distinct variable mentioned in
// either gets exactly one role, decided only by where it is defined: nowhere (input),
// in both patterns (output), only in the source (intermediate), or only in the
// destination (temporary). The result is an immutable Classification keyed by variable
// identity. classify() is a pure function of the two definition sequences, so it can run
// on any thread and running it twice gives the same answer.

//! Variable classification for rewrite rules.

use std::fmt;

use hashbrown::{HashMap, HashSet};

use super::ast::{Def, Var};
use crate::core::error::{MetaError, MetaResult};

/// The role of a variable in a rewrite rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Bound by the matcher; defined in neither pattern.
    Input,
    /// Computed by the matched code and recomputed by the replacement.
    Output,
    /// Computed by the matched code and not recomputed.
    Intermediate,
    /// Introduced by the replacement.
    Temporary,
}

impl VarKind {
    pub fn from_defs(in_src: bool, in_dst: bool) -> Self {
        match (in_src, in_dst) {
            (false, false) => VarKind::Input,
            (true, true) => VarKind::Output,
            (true, false) => VarKind::Intermediate,
            (false, true) => VarKind::Temporary,
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarKind::Input => "input",
            VarKind::Output => "output",
            VarKind::Intermediate => "intermediate",
            VarKind::Temporary => "temporary",
        })
    }
}

/// Number of variables of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub inputs: usize,
    pub outputs: usize,
    pub intermediates: usize,
    pub temporaries: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.inputs + self.outputs + self.intermediates + self.temporaries
    }
}

/// Roles of all variables of one rule, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    vars: Vec<(Var, VarKind)>,
    index: HashMap<Var, usize>,
}

impl Classification {
    pub fn kind(&self, var: &Var) -> Option<VarKind> {
        self.index.get(var).map(|&i| self.vars[i].1)
    }

    /// Like [`kind`](Self::kind), for callers that know `var` belongs to the rule.
    pub fn expect_kind(&self, var: &Var) -> MetaResult<VarKind> {
        self.kind(var).ok_or_else(|| MetaError::UnknownVariable {
            var: var.name().to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Var, VarKind)> {
        self.vars.iter().map(|(var, kind)| (var, *kind))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn counts(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for (_, kind) in &self.vars {
            match kind {
                VarKind::Input => counts.inputs += 1,
                VarKind::Output => counts.outputs += 1,
                VarKind::Intermediate => counts.intermediates += 1,
                VarKind::Temporary => counts.temporaries += 1,
            }
        }
        counts
    }
}

fn defined_vars(defs: &[Def]) -> HashSet<&Var> {
    defs.iter().flat_map(|def| def.outputs()).collect()
}

/// Classify every variable appearing in `src` or `dst`.
///
/// Variables are visited definition by definition, outputs before arguments, the
/// source pattern before the destination pattern.
pub fn classify(src: &[Def], dst: &[Def]) -> Classification {
    let in_src = defined_vars(src);
    let in_dst = defined_vars(dst);

    let mut result = Classification::default();
    let mut record = |var: &Var| {
        if result.index.contains_key(var) {
            return;
        }
        let kind = VarKind::from_defs(in_src.contains(var), in_dst.contains(var));
        result.index.insert(var.clone(), result.vars.len());
        result.vars.push((var.clone(), kind));
    };

    for def in src.iter().chain(dst) {
        for var in def.outputs() {
            record(var);
        }
        def.value().visit_vars(&mut record);
    }
    result
}
