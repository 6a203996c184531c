// This test suite runs the source generators end to end. It generates every file for the
// shared definitions and all registered targets into a scratch directory, checks the
// file set and a few landmark lines, verifies that a second run leaves unchanged files
// alone, and checks the session statistics collected along the way.

//! Test source generation.

use std::fs;
use std::path::{Path, PathBuf};

use bumpalo::Bump;
use tpde_meta::{base, gen, isa, MetaSession};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh scratch directory unique to `name`.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tpde-meta-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap_or_else(|e| panic!("{file}: {e}"))
}

#[test]
fn test_generate_all() {
    init_logging();
    let defs = base::define().unwrap();
    let isas = isa::all_isas(&defs.settings).unwrap();
    let dir = scratch_dir("generate-all");

    let arena = Bump::new();
    let session = MetaSession::new(&arena);
    gen::generate_all(&session, &defs, &isas, &dir).unwrap();

    let mut files: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        [
            "legalizer.rs",
            "settings-arm32.rs",
            "settings-arm64.rs",
            "settings-intel.rs",
            "settings-riscv.rs",
            "settings.rs",
        ]
    );

    let legalizer = read(&dir, "legalizer.rs");
    assert!(legalizer.starts_with("//! Legalization patterns, generated by metagen.\n"));
    assert!(legalizer.contains("pub fn narrow("));
    assert!(legalizer.contains("pub fn expand("));
    assert!(legalizer.contains("ir::Opcode::IaddImm => {"));
    assert!(legalizer.contains("ir::Opcode::BxorNot => {"));

    let shared = read(&dir, "settings.rs");
    assert!(shared.contains("pub enum OptLevel {"));
    assert!(shared.contains("pub fn enable_atomics(&self) -> bool {"));

    let riscv = read(&dir, "settings-riscv.rs");
    assert!(riscv.contains("pub fn enable_m(&self) -> bool {"));

    let stats = session.stats();
    assert_eq!(stats.transforms_classified, 10);
    assert_eq!(stats.files_written, 6);
    assert_eq!(stats.files_unchanged, 0);
    assert!(stats.lines_emitted > 100);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_regeneration_is_stable() {
    init_logging();
    let defs = base::define().unwrap();
    let isas = isa::all_isas(&defs.settings).unwrap();
    let dir = scratch_dir("stable");

    let arena = Bump::new();
    let first = MetaSession::new(&arena);
    gen::generate_all(&first, &defs, &isas, &dir).unwrap();
    let before = read(&dir, "legalizer.rs");

    let second = MetaSession::new(&arena);
    gen::generate_all(&second, &defs, &isas, &dir).unwrap();
    assert_eq!(read(&dir, "legalizer.rs"), before);

    let stats = second.stats();
    assert_eq!(stats.files_written, 0);
    assert_eq!(stats.files_unchanged, 6);

    fs::remove_dir_all(&dir).unwrap();
}
