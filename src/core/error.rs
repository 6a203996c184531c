// This module defines error types for tpde-meta using the thiserror crate for idiomatic
// Rust error handling. MetaError is the main error enum covering every way a meta
// description can be rejected: instruction applications with the wrong number of
// arguments, type arguments on already bound or non-polymorphic instructions, definitions
// that do not wrap an application, variables defined twice in one pattern, inputs that
// are also defined, destination-only inputs, distinct variables sharing a name within a
// rule, unknown instructions, types, settings, transform groups and ISAs, and source
// generation failures. Each variant carries the offending name so the rule author can
// find the problem. RuleError wraps a MetaError together with the source
// location of the rule under construction, captured with #[track_caller]. MetaResult<T>
// is a convenience alias for Result<T, MetaError>.

//! Error types for tpde-meta.
//!
//! Every check runs while a description is being built; nothing is deferred to
//! classification or source generation of an already accepted rule.

use std::panic::Location;

use thiserror::Error;

use crate::cdsl::xform::PatternContext;

/// Main error type for building meta descriptions.
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("`{inst}` takes {expected} arguments, got {actual}")]
    ArityMismatch {
        inst: String,
        expected: usize,
        actual: usize,
    },

    #[error("`{inst}` is already bound to type arguments")]
    AlreadyBound {
        inst: String,
    },

    #[error("`{inst}` is not polymorphic")]
    NotPolymorphic {
        inst: String,
    },

    #[error("`{inst}` has {max} type variables, got {actual} type arguments")]
    TooManyTypeArguments {
        inst: String,
        max: usize,
        actual: usize,
    },

    #[error("type `{ty}` is not allowed for type variable `{typevar}` of `{inst}`")]
    TypeNotAllowed {
        inst: String,
        typevar: String,
        ty: String,
    },

    #[error("definition must wrap an instruction application, found variable `{found}`")]
    NotAnApplication {
        found: String,
    },

    #[error("definition of `{value}` has no output variables")]
    NoOutputs {
        value: String,
    },

    #[error("'{var}' multiply defined in {context} pattern")]
    DuplicateDefinition {
        var: String,
        context: PatternContext,
    },

    #[error("'{var}' used as both input and def")]
    InputDefined {
        var: String,
    },

    #[error("extra inputs in destination pattern: {vars}")]
    ExtraInputs {
        vars: String,
    },

    #[error("{context} pattern is empty")]
    EmptyPattern {
        context: PatternContext,
    },

    #[error("two distinct variables named '{name}' in one transform")]
    AmbiguousName {
        name: String,
    },

    #[error("variable `{var}` is not part of this transform")]
    UnknownVariable {
        var: String,
    },

    #[error("unknown instruction #{id}")]
    UnknownInstruction {
        id: u32,
    },

    #[error("instruction `{name}` already defined in group `{group}`")]
    DuplicateInstruction {
        group: String,
        name: String,
    },

    #[error("unknown value type `{name}`")]
    UnknownType {
        name: String,
    },

    #[error("invalid setting `{group}.{name}`: {reason}")]
    InvalidSetting {
        group: String,
        name: String,
        reason: String,
    },

    #[error("unknown transform group `{name}`")]
    UnknownTransformGroup {
        name: String,
    },

    #[error("unknown target ISA `{name}`")]
    UnknownIsa {
        name: String,
    },

    #[error("Code generation failed: {reason}")]
    CodeGeneration {
        reason: String,
    },

    #[error(transparent)]
    Rule(Box<RuleError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<RuleError> for MetaError {
    fn from(err: RuleError) -> Self {
        MetaError::Rule(Box::new(err))
    }
}

/// Result type alias for meta description operations.
pub type MetaResult<T> = Result<T, MetaError>;

/// A rejected rewrite rule, pointing at the code that tried to build it.
#[derive(Error, Debug)]
#[error("transform at {}:{}: {source}", .location.file(), .location.line())]
pub struct RuleError {
    /// Where the rule was defined.
    pub location: &'static Location<'static>,
    /// Why it was rejected.
    #[source]
    pub source: MetaError,
}

impl RuleError {
    /// Attach the caller's location to `source`.
    #[track_caller]
    pub fn here(source: MetaError) -> Self {
        Self {
            location: Location::caller(),
            source,
        }
    }

    /// The underlying construction error.
    pub fn kind(&self) -> &MetaError {
        &self.source
    }
}
