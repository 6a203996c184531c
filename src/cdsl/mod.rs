// This module is the meta language used to describe the backend. Instructions, their
// operands and type variables are declared with plain Rust values; rewrite rules are
// built from variables, instruction applications and definitions collected into source
// and destination patterns. Closing a rule validates it and classifies each variable
// as an input, output, intermediate or temporary. Settings groups and target ISA
// descriptions complete the vocabulary used by the base definitions and the generators.

//! The meta language for instruction, setting and transform descriptions.

pub mod ast;
pub mod classify;
pub mod instructions;
pub mod isa;
pub mod operands;
pub mod settings;
pub mod types;
pub mod typevar;
pub mod xform;

/// Convert `snake_case` to `CamelCase`.
pub fn camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for part in s.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// First non-empty line of a documentation string, trimmed.
pub fn blurb(doc: &str) -> &str {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}
