// This module holds the infrastructure shared by every part of tpde-meta: the error
// types used while descriptions are built and checked, and the arena-based session that
// backs source generation and collects statistics about a run.

//! Core tpde-meta infrastructure.
//!
//! ## Errors (`error`)
//! - `MetaError` for every rejected description
//! - `RuleError` for rewrite rules, with the location of the rule
//!
//! ## Session Management (`session`)
//! - Arena-based allocation of generated text using `bumpalo`
//! - Classification and generation statistics

pub mod error;
pub mod session;

pub use error::{MetaError, MetaResult, RuleError};
pub use session::{MetaSession, SessionStats};
