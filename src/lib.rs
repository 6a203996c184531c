//! TPDE meta - instruction, setting and transform descriptions.
//!
//! The backend's instruction set, its settings and the rewrite rules used by
//! legalization are described in Rust with the [`cdsl`] meta language. Rules are
//! validated and their variables classified when they are built; the [`gen`]
//! generators then turn the descriptions into Rust sources.
//!
//! # Primary Usage
//!
//! ```ignore
//! use tpde_meta::apply;
//! use tpde_meta::cdsl::ast::Var;
//! use tpde_meta::cdsl::xform::XForm;
//!
//! let defs = tpde_meta::base::define()?;
//! let (insts, ops) = (&defs.instructions, &defs.opcodes);
//! let (x, y, z) = (Var::new("x"), Var::new("y"), Var::new("z"));
//!
//! let commute = XForm::build(|b| {
//!     b.src(&z, apply!(insts, ops.iadd, &x, &y)?)?;
//!     b.dst(&z, apply!(insts, ops.iadd, &y, &x)?)
//! })?;
//! assert!(commute.is_output(&z));
//! ```
//!
//! # Architecture
//!
//! - [`cdsl`] - The meta language: types, instructions, patterns, settings
//! - [`emit`] - Call-expression rendering of instruction applications
//! - [`base`] - Shared instructions, settings and legalization groups
//! - [`isa`] - Target ISA registry
//! - [`gen`] - Source generators
//! - [`core`] - Shared infrastructure (errors, session)

pub mod base;
pub mod cdsl;
pub mod core;
pub mod emit;
pub mod gen;
pub mod isa;

pub use crate::cdsl::ast::{Apply, Def, Expr, Var};
pub use crate::cdsl::classify::{classify, Classification, VarKind};
pub use crate::cdsl::instructions::{InstId, InstRef, InstructionCatalog, InstructionGroup};
pub use crate::cdsl::xform::{Pattern, PatternContext, XForm, XFormGroup};
pub use crate::core::{MetaError, MetaResult, MetaSession, RuleError, SessionStats};
