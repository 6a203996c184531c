// This module holds the source generators. srcgen provides the arena-backed Formatter
// the generators write through; legalizer turns transform groups into legalization
// functions; settings turns setting groups into Flags types. generate_all() runs every
// generator over the base definitions and the target registry.

//! Rust source generators.

pub mod legalizer;
pub mod settings;
pub mod srcgen;

use std::path::Path;

use crate::base::Definitions;
use crate::cdsl::isa::TargetIsa;
use crate::core::error::MetaResult;
use crate::core::session::MetaSession;

/// Generate every source file into `out_dir`.
pub fn generate_all(
    session: &MetaSession<'_>,
    defs: &Definitions,
    isas: &[TargetIsa],
    out_dir: &Path,
) -> MetaResult<()> {
    std::fs::create_dir_all(out_dir)?;
    log::info!("generating sources in {}", out_dir.display());

    legalizer::generate(
        session,
        &defs.instructions,
        &defs.transform_groups,
        out_dir,
        "legalizer.rs",
    )?;
    settings::generate(session, &defs.settings, out_dir, "settings.rs")?;
    for isa in isas {
        let filename = session.intern_str(&format!("settings-{}.rs", isa.name));
        settings::generate(session, &isa.settings, out_dir, filename)?;
    }
    Ok(())
}
