// This module provides arena-based session management for a tpde-meta run using the
// bumpalo crate. MetaSession borrows the arena that backs every source Formatter handed
// out during generation, interns strings that generators repeat many times (instruction
// names, setting names), and keeps SessionStats: how many transforms were classified, how
// many variables of each kind they contained, and how many files and lines the
// generators produced. Everything allocated through the session shares the arena
// lifetime, so generators can hold on to formatted lines without copying them.

//! Arena-based session management for meta runs.
//!
//! All generated text lives in the session arena and is released when the arena
//! is dropped at the end of the run.

use std::cell::RefCell;
use std::fmt;

use bumpalo::Bump;
use hashbrown::HashMap;

use crate::cdsl::classify::KindCounts;
use crate::gen::srcgen::Formatter;

/// Arena-based meta session.
pub struct MetaSession<'arena> {
    /// Arena allocator for generated text.
    arena: &'arena Bump,

    /// Session statistics.
    stats: RefCell<SessionStats>,

    /// String interning for repeated names.
    interned_strings: RefCell<HashMap<String, &'arena str>>,
}

impl<'arena> MetaSession<'arena> {
    /// Create a new session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interned_strings: RefCell::new(HashMap::new()),
        }
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// A fresh source formatter backed by the session arena.
    pub fn formatter(&self) -> Formatter<'arena> {
        Formatter::new(self.arena)
    }

    /// Record a classified transform.
    pub fn record_transform(&self, counts: KindCounts) {
        let mut stats = self.stats.borrow_mut();
        stats.transforms_classified += 1;
        stats.inputs += counts.inputs;
        stats.outputs += counts.outputs;
        stats.intermediates += counts.intermediates;
        stats.temporaries += counts.temporaries;
    }

    /// Record a generated file.
    pub fn record_file(&self, lines: usize, written: bool) {
        let mut stats = self.stats.borrow_mut();
        if written {
            stats.files_written += 1;
        } else {
            stats.files_unchanged += 1;
        }
        stats.lines_emitted += lines;
    }

    /// Get session statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Meta session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of transforms classified.
    pub transforms_classified: usize,

    /// Variables classified as inputs.
    pub inputs: usize,

    /// Variables classified as outputs.
    pub outputs: usize,

    /// Variables classified as intermediates.
    pub intermediates: usize,

    /// Variables classified as temporaries.
    pub temporaries: usize,

    /// Generated files written to disk.
    pub files_written: usize,

    /// Generated files that were already up to date.
    pub files_unchanged: usize,

    /// Total lines of generated source.
    pub lines_emitted: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Meta Session Statistics:")?;
        writeln!(f, "  Transforms classified: {}", self.transforms_classified)?;
        writeln!(
            f,
            "  Variables: {} inputs, {} outputs, {} intermediates, {} temporaries",
            self.inputs, self.outputs, self.intermediates, self.temporaries
        )?;
        writeln!(
            f,
            "  Files: {} written, {} unchanged",
            self.files_written, self.files_unchanged
        )?;
        writeln!(f, "  Lines emitted: {}", self.lines_emitted)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_interning() {
        let arena = Bump::new();
        let session = MetaSession::new(&arena);

        let s1 = session.intern_str("iadd");
        let s2 = session.intern_str("iadd");
        let s3 = session.intern_str("isub");

        assert_eq!(s1.as_ptr(), s2.as_ptr());
        assert_ne!(s1.as_ptr(), s3.as_ptr());
    }

    #[test]
    fn test_session_statistics() {
        let arena = Bump::new();
        let session = MetaSession::new(&arena);

        session.record_transform(KindCounts {
            inputs: 2,
            outputs: 1,
            intermediates: 0,
            temporaries: 3,
        });
        session.record_transform(KindCounts {
            inputs: 1,
            outputs: 1,
            intermediates: 1,
            temporaries: 0,
        });
        session.record_file(40, true);
        session.record_file(10, false);

        let stats = session.stats();
        assert_eq!(stats.transforms_classified, 2);
        assert_eq!(stats.inputs, 3);
        assert_eq!(stats.temporaries, 3);
        assert_eq!(stats.lines_emitted, 50);

        let report = stats.to_string();
        assert!(report.contains("Transforms classified: 2"));
        assert!(report.contains("1 written, 1 unchanged"));
    }

    #[test]
    fn test_formatter_uses_session_arena() {
        let arena = Bump::new();
        let session = MetaSession::new(&arena);
        let before = arena.allocated_bytes();
        let mut fmt = session.formatter();
        fmt.line("fn generated() {}");
        assert!(arena.allocated_bytes() > before);
        assert_eq!(fmt.to_string(), "fn generated() {}\n");
    }
}
