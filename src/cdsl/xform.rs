// This module builds rewrite rules. A Pattern is an ordered list of definitions assembled
// for an explicit context (source or destination); pushing a definition records its
// outputs and rejects any variable that is already defined in that pattern. An XForm is
// a closed rule: building it checks that the source pattern is non-empty, that no
// variable is used as an input and also defined, and that the destination introduces no
// inputs of its own. Only then are the variables classified, once, and the result kept
// with the rule, provided no two distinct variables of the rule share a name. Failures are reported as RuleError carrying the location of the code
// that tried to build the rule, and a rejected rule never reaches its XFormGroup.

//! Patterns, transforms and transform groups.

use std::fmt;
use std::panic::Location;

use hashbrown::{HashMap, HashSet};

use super::ast::{Def, DefOutputs, Expr, Var};
use super::classify::{classify, Classification, VarKind};
use crate::core::error::{MetaError, MetaResult, RuleError};

/// Which side of a rewrite rule a pattern describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternContext {
    Source,
    Destination,
}

impl fmt::Display for PatternContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatternContext::Source => "source",
            PatternContext::Destination => "destination",
        })
    }
}

/// An ordered sequence of definitions.
#[derive(Debug, Clone)]
pub struct Pattern {
    context: PatternContext,
    defs: Vec<Def>,
    defined: HashSet<Var>,
}

impl Pattern {
    pub fn new(context: PatternContext) -> Self {
        Self {
            context,
            defs: Vec::new(),
            defined: HashSet::new(),
        }
    }

    pub fn context(&self) -> PatternContext {
        self.context
    }

    /// Append `def`, recording its outputs as defined in this pattern.
    ///
    /// Nothing is recorded when an output is already defined here.
    pub fn push(&mut self, def: Def) -> MetaResult<()> {
        for (i, var) in def.outputs().iter().enumerate() {
            if self.defined.contains(var) || def.outputs()[..i].contains(var) {
                return Err(MetaError::DuplicateDefinition {
                    var: var.name().to_string(),
                    context: self.context,
                });
            }
        }
        log::trace!("{} pattern: {}", self.context, def);
        self.defined.extend(def.outputs().iter().cloned());
        self.defs.push(def);
        Ok(())
    }

    /// Build a definition and append it.
    pub fn define(
        &mut self,
        outputs: impl Into<DefOutputs>,
        value: impl Into<Expr>,
    ) -> MetaResult<()> {
        self.push(Def::new(outputs, value)?)
    }

    pub fn defs(&self) -> &[Def] {
        &self.defs
    }

    pub fn defines(&self, var: &Var) -> bool {
        self.defined.contains(var)
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, def) in self.defs.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{def}")?;
        }
        Ok(())
    }
}

/// A closed, classified rewrite rule.
#[derive(Debug, Clone)]
pub struct XForm {
    src: Pattern,
    dst: Pattern,
    inputs: Vec<Var>,
    classification: Classification,
    location: &'static Location<'static>,
}

impl XForm {
    /// Close a rule from its source and destination patterns.
    ///
    /// The patterns are taken positionally; their contexts only label diagnostics.
    #[track_caller]
    pub fn new(src: Pattern, dst: Pattern) -> Result<Self, RuleError> {
        Self::close(src, dst, Location::caller())
    }

    /// Assemble both patterns with `f` and close the rule.
    #[track_caller]
    pub fn build<F>(f: F) -> Result<Self, RuleError>
    where
        F: FnOnce(&mut XFormBuilder) -> MetaResult<()>,
    {
        let location = Location::caller();
        let mut builder = XFormBuilder::new();
        if let Err(source) = f(&mut builder) {
            return Err(RuleError { location, source });
        }
        Self::close(builder.src, builder.dst, location)
    }

    fn close(
        src: Pattern,
        dst: Pattern,
        location: &'static Location<'static>,
    ) -> Result<Self, RuleError> {
        let fail = |source| RuleError { location, source };
        let inputs = check_inputs(&src, &dst).map_err(fail)?;
        let classification = classify(src.defs(), dst.defs());
        check_names(&classification).map_err(fail)?;

        let counts = classification.counts();
        log::debug!(
            "transform {}:{}: {} => {} ({} inputs, {} outputs, {} intermediates, {} temporaries)",
            location.file(),
            location.line(),
            src,
            dst,
            counts.inputs,
            counts.outputs,
            counts.intermediates,
            counts.temporaries
        );

        Ok(Self {
            src,
            dst,
            inputs,
            classification,
            location,
        })
    }

    pub fn src(&self) -> &Pattern {
        &self.src
    }

    pub fn dst(&self) -> &Pattern {
        &self.dst
    }

    /// Input variables in order of first use in the source pattern.
    pub fn inputs(&self) -> &[Var] {
        &self.inputs
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn kind(&self, var: &Var) -> Option<VarKind> {
        self.classification.kind(var)
    }

    pub fn is_input(&self, var: &Var) -> bool {
        self.kind(var) == Some(VarKind::Input)
    }

    pub fn is_output(&self, var: &Var) -> bool {
        self.kind(var) == Some(VarKind::Output)
    }

    pub fn is_intermediate(&self, var: &Var) -> bool {
        self.kind(var) == Some(VarKind::Intermediate)
    }

    pub fn is_temp(&self, var: &Var) -> bool {
        self.kind(var) == Some(VarKind::Temporary)
    }

    /// Where the rule was built.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for XForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.src, self.dst)
    }
}

fn uses(def: &Def) -> Vec<&Var> {
    let mut vars = Vec::new();
    for arg in def.value().args() {
        collect_vars(arg, &mut vars);
    }
    vars
}

fn collect_vars<'a>(expr: &'a Expr, out: &mut Vec<&'a Var>) {
    match expr {
        Expr::Var(var) => out.push(var),
        Expr::Apply(apply) => {
            for arg in apply.args() {
                collect_vars(arg, out);
            }
        }
    }
}

/// Validate the variable usage of a rule and return its inputs.
fn check_inputs(src: &Pattern, dst: &Pattern) -> MetaResult<Vec<Var>> {
    if src.is_empty() {
        return Err(MetaError::EmptyPattern {
            context: PatternContext::Source,
        });
    }

    let both_defined = |var: &Var| MetaError::InputDefined {
        var: var.name().to_string(),
    };

    // Source uses ahead of any definition are inputs.
    let mut inputs: Vec<Var> = Vec::new();
    let mut seen: HashSet<&Var> = HashSet::new();
    for def in src.defs() {
        for var in uses(def) {
            if seen.contains(var) {
                continue;
            }
            if src.defines(var) || dst.defines(var) {
                return Err(both_defined(var));
            }
            seen.insert(var);
            inputs.push(var.clone());
        }
        seen.extend(def.outputs());
    }

    // The destination may only use its own earlier definitions and source inputs.
    let extra: Vec<&Var> = {
        let input_set: HashSet<&Var> = inputs.iter().collect();
        let mut dst_defined: HashSet<&Var> = HashSet::new();
        let mut extra: Vec<&Var> = Vec::new();
        for def in dst.defs() {
            for var in uses(def) {
                if dst_defined.contains(var) || input_set.contains(var) {
                    continue;
                }
                if src.defines(var) || dst.defines(var) {
                    return Err(both_defined(var));
                }
                if !extra.contains(&var) {
                    extra.push(var);
                }
            }
            dst_defined.extend(def.outputs());
        }
        extra
    };

    if !extra.is_empty() {
        let names: Vec<_> = extra.iter().map(|v| v.name()).collect();
        return Err(MetaError::ExtraInputs {
            vars: names.join(", "),
        });
    }
    Ok(inputs)
}

/// Reject two distinct variables sharing a name within one rule.
fn check_names(classification: &Classification) -> MetaResult<()> {
    let mut names: HashMap<&str, &Var> = HashMap::new();
    for (var, _) in classification.iter() {
        if let Some(&first) = names.get(var.name()) {
            if first != var {
                return Err(MetaError::AmbiguousName {
                    name: var.name().to_string(),
                });
            }
        }
        names.insert(var.name(), var);
    }
    Ok(())
}

/// Collects the source and destination patterns of a rule under construction.
pub struct XFormBuilder {
    src: Pattern,
    dst: Pattern,
}

impl XFormBuilder {
    fn new() -> Self {
        Self {
            src: Pattern::new(PatternContext::Source),
            dst: Pattern::new(PatternContext::Destination),
        }
    }

    /// Add a definition to the pattern for `context`.
    pub fn def(
        &mut self,
        context: PatternContext,
        outputs: impl Into<DefOutputs>,
        value: impl Into<Expr>,
    ) -> MetaResult<()> {
        match context {
            PatternContext::Source => self.src.define(outputs, value),
            PatternContext::Destination => self.dst.define(outputs, value),
        }
    }

    pub fn src(&mut self, outputs: impl Into<DefOutputs>, value: impl Into<Expr>) -> MetaResult<()> {
        self.def(PatternContext::Source, outputs, value)
    }

    pub fn dst(&mut self, outputs: impl Into<DefOutputs>, value: impl Into<Expr>) -> MetaResult<()> {
        self.def(PatternContext::Destination, outputs, value)
    }
}

/// A named collection of transforms applied by one legalization pass.
#[derive(Debug, Clone)]
pub struct XFormGroup {
    pub name: &'static str,
    pub doc: &'static str,
    xforms: Vec<XForm>,
}

impl XFormGroup {
    pub fn new(name: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            doc,
            xforms: Vec::new(),
        }
    }

    /// Build a transform with `f` and add it to the group.
    ///
    /// The group is unchanged when the transform is rejected.
    #[track_caller]
    pub fn legalize<F>(&mut self, f: F) -> Result<&XForm, RuleError>
    where
        F: FnOnce(&mut XFormBuilder) -> MetaResult<()>,
    {
        let xform = XForm::build(f)?;
        self.xforms.push(xform);
        let index = self.xforms.len() - 1;
        Ok(&self.xforms[index])
    }

    pub fn xforms(&self) -> &[XForm] {
        &self.xforms
    }

    pub fn len(&self) -> usize {
        self.xforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xforms.is_empty()
    }
}
