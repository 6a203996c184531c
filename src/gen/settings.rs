// This module generates the Rust side of a settings group: an enum type for every
// enumerated setting, a Flags struct holding the group's bytes in the computed layout,
// one getter per setting, the numbered_predicate accessor used for boolean settings, and
// a Default implementation built from the default byte image of the group.

//! Settings source generation.

use std::path::Path;

use super::srcgen::Formatter;
use crate::cdsl::camel_case;
use crate::cdsl::settings::{Setting, SettingGroup, SettingKind};
use crate::core::error::MetaResult;
use crate::core::session::MetaSession;

fn gen_enum(fmt: &mut Formatter<'_>, group: &SettingGroup, setting: &Setting, values: &[&str]) {
    let ty = camel_case(setting.name);
    fmt.doc_comment(&format!("Values for `{}.{}`.", group.name, setting.name));
    fmt.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    fmt.line(&format!("pub enum {ty} {{"));
    fmt.indent(|fmt| {
        for value in values {
            fmt.doc_comment(&format!("`{value}`."));
            fmt.line(&format!("{},", camel_case(value)));
        }
    });
    fmt.line("}");
    fmt.line("");
    fmt.line(&format!("impl fmt::Display for {ty} {{"));
    fmt.indent(|fmt| {
        fmt.line("fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {");
        fmt.indent(|fmt| {
            fmt.line("f.write_str(match *self {");
            fmt.indent(|fmt| {
                for value in values {
                    fmt.line(&format!("{ty}::{} => \"{value}\",", camel_case(value)));
                }
            });
            fmt.line("})");
        });
        fmt.line("}");
    });
    fmt.line("}");
    fmt.line("");
}

fn gen_getter(fmt: &mut Formatter<'_>, setting: &Setting) {
    fmt.doc_comment(setting.doc);
    match &setting.kind {
        SettingKind::Bool { .. } => {
            let predicate = setting.predicate.unwrap_or_default();
            fmt.line(&format!("pub fn {}(&self) -> bool {{", setting.name));
            fmt.indent(|fmt| fmt.line(&format!("self.numbered_predicate({predicate})")));
        }
        SettingKind::Num { .. } => {
            fmt.line(&format!("pub fn {}(&self) -> u8 {{", setting.name));
            fmt.indent(|fmt| fmt.line(&format!("self.bytes[{}]", setting.byte_offset)));
        }
        SettingKind::Enum { values } => {
            let ty = camel_case(setting.name);
            fmt.line(&format!("pub fn {}(&self) -> {ty} {{", setting.name));
            fmt.indent(|fmt| {
                fmt.line(&format!("match self.bytes[{}] {{", setting.byte_offset));
                fmt.indent(|fmt| {
                    for (i, value) in values.iter().enumerate().skip(1) {
                        fmt.line(&format!("{i} => {ty}::{},", camel_case(value)));
                    }
                    if let Some(first) = values.first() {
                        fmt.line(&format!("_ => {ty}::{},", camel_case(first)));
                    }
                });
                fmt.line("}");
            });
        }
    }
    fmt.line("}");
}

fn gen_bytes(bytes: &[u8]) -> String {
    let bytes: Vec<String> = bytes.iter().map(|b| format!("{b:#04x}")).collect();
    format!("[{}]", bytes.join(", "))
}

/// Emit the settings types for `group`.
pub fn gen_group(fmt: &mut Formatter<'_>, group: &SettingGroup) {
    fmt.line("use std::fmt;");
    fmt.line("");

    for setting in group.settings() {
        if let SettingKind::Enum { values } = &setting.kind {
            gen_enum(fmt, group, setting, values);
        }
    }

    let mut doc = format!("Flags group `{}`.", group.name);
    if let Some(parent) = group.parent {
        doc.push_str(&format!("\n\nSettings of the `{parent}` group are kept in their own `Flags`."));
    }
    fmt.doc_comment(&doc);
    fmt.line("#[derive(Clone)]");
    fmt.line("pub struct Flags {");
    fmt.indent(|fmt| fmt.line(&format!("bytes: [u8; {}],", group.settings_size())));
    fmt.line("}");
    fmt.line("");

    fmt.line("impl Flags {");
    fmt.indent(|fmt| {
        fmt.doc_comment("Dynamic numbered predicate getter.");
        fmt.line("pub fn numbered_predicate(&self, p: usize) -> bool {");
        fmt.indent(|fmt| {
            fmt.line(&format!(
                "self.bytes[{} + p / 8] & (1 << (p % 8)) != 0",
                group.boolean_offset()
            ));
        });
        fmt.line("}");
        for setting in group.settings() {
            fmt.line("");
            gen_getter(fmt, setting);
        }
    });
    fmt.line("}");
    fmt.line("");

    fmt.line("impl Default for Flags {");
    fmt.indent(|fmt| {
        fmt.line("fn default() -> Self {");
        fmt.indent(|fmt| {
            fmt.line("Self {");
            fmt.indent(|fmt| fmt.line(&format!("bytes: {},", gen_bytes(&group.default_bytes()))));
            fmt.line("}");
        });
        fmt.line("}");
    });
    fmt.line("}");
}

/// Generate `filename` in `out_dir` for `group`.
pub fn generate(
    session: &MetaSession<'_>,
    group: &SettingGroup,
    out_dir: &Path,
    filename: &str,
) -> MetaResult<()> {
    let mut fmt = session.formatter();
    fmt.line(&format!("//! Settings group `{}`, generated by metagen.", group.name));
    fmt.line("");
    gen_group(&mut fmt, group);
    let written = fmt.update_file(out_dir.join(filename))?;
    session.record_file(fmt.line_count(), written);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base;
    use bumpalo::Bump;

    #[test]
    fn test_shared_flags() {
        let shared = base::settings::define().unwrap();
        let arena = Bump::new();
        let mut fmt = Formatter::new(&arena);
        gen_group(&mut fmt, &shared);
        let text = fmt.to_string();

        assert!(text.contains("pub enum OptLevel {\n    /// `default`.\n    Default,\n"));
        assert!(text.contains("OptLevel::Fastest => \"fastest\","));
        assert!(text.contains("bytes: [u8; 2],"));
        assert!(text.contains("self.bytes[1 + p / 8] & (1 << (p % 8)) != 0"));
        assert!(text.contains(
            "    pub fn opt_level(&self) -> OptLevel {\n        match self.bytes[0] {\n            1 => OptLevel::Best,\n            2 => OptLevel::Fastest,\n            _ => OptLevel::Default,\n"
        ));
        assert!(text.contains("pub fn enable_simd(&self) -> bool {\n        self.numbered_predicate(4)\n"));
        assert!(text.contains("bytes: [0x00, 0x38],"));
    }

    #[test]
    fn test_isa_flags_name_parent() {
        let shared = base::settings::define().unwrap();
        let riscv = crate::isa::lookup("riscv", &shared).unwrap();
        let arena = Bump::new();
        let mut fmt = Formatter::new(&arena);
        gen_group(&mut fmt, &riscv.settings);
        let text = fmt.to_string();
        assert!(text.contains("/// Settings of the `shared` group are kept in their own `Flags`."));
        assert!(text.contains("bytes: [0x10],"));
        assert!(!text.contains("pub enum"));
    }
}
