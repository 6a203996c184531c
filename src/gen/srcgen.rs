// This module provides the source formatter used by the generators. Formatter collects
// lines of Rust source in a bumpalo arena borrowed from the MetaSession, prefixing each
// with the current indentation. Nested blocks are written with indent(), which runs a
// closure one level deeper. update_file() writes the result to disk only when the
// contents changed, so rebuilding does not touch unchanged generated files.

//! Indentation-aware source formatter.

use std::fmt;
use std::fs;
use std::path::Path;

use bumpalo::collections::{String as BumpString, Vec as BumpVec};
use bumpalo::Bump;

use crate::core::error::MetaResult;

/// Columns per indentation level.
const SHIFTWIDTH: usize = 4;

/// Collects indented source lines in an arena.
pub struct Formatter<'arena> {
    arena: &'arena Bump,
    lines: BumpVec<'arena, &'arena str>,
    indent: usize,
}

impl<'arena> Formatter<'arena> {
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            lines: BumpVec::new_in(arena),
            indent: 0,
        }
    }

    fn push_at(&mut self, indent: usize, s: &str) {
        let line = if s.is_empty() {
            ""
        } else {
            let mut line = BumpString::with_capacity_in(indent + s.len(), self.arena);
            for _ in 0..indent {
                line.push(' ');
            }
            line.push_str(s);
            line.into_bump_str()
        };
        self.lines.push(line);
    }

    /// Add an indented line.
    pub fn line(&mut self, s: &str) {
        self.push_at(self.indent, s);
    }

    /// Run `f` one indentation level deeper.
    pub fn indent<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += SHIFTWIDTH;
        let result = f(self);
        self.indent -= SHIFTWIDTH;
        result
    }

    pub fn comment(&mut self, s: &str) {
        self.line(&format!("// {s}"));
    }

    /// Add a `///` comment, one line per line of `s`, dropping leading and trailing
    /// blank lines.
    pub fn doc_comment(&mut self, s: &str) {
        let lines: Vec<&str> = s.lines().map(str::trim).collect();
        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        if let (Some(first), Some(last)) = (first, last) {
            for line in &lines[first..=last] {
                if line.is_empty() {
                    self.line("///");
                } else {
                    self.line(&format!("/// {line}"));
                }
            }
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Write the collected lines to `path` unless it already has this content.
    ///
    /// Returns whether the file was written.
    pub fn update_file(&self, path: impl AsRef<Path>) -> MetaResult<bool> {
        let path = path.as_ref();
        let contents = self.to_string();
        if let Ok(existing) = fs::read_to_string(path) {
            if existing == contents {
                log::debug!("{} is up to date", path.display());
                return Ok(false);
            }
        }
        fs::write(path, contents)?;
        log::info!("wrote {} ({} lines)", path.display(), self.lines.len());
        Ok(true)
    }
}

impl fmt::Display for Formatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
