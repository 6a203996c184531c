// This module is the registry of target ISAs. Each target contributes its own settings
// group, whose parent is the shared group, and names the instruction groups it can
// execute. all_isas() lists the targets in a fixed order; lookup() finds one by name.

//! Target ISA registry.

pub mod riscv;

use crate::cdsl::isa::TargetIsa;
use crate::cdsl::settings::SettingGroup;
use crate::core::error::{MetaError, MetaResult};

/// Names of the supported targets.
pub const ISA_NAMES: [&str; 4] = ["riscv", "intel", "arm32", "arm64"];

/// A target with no settings of its own.
fn plain(name: &'static str, doc: &'static str, shared: &SettingGroup) -> MetaResult<TargetIsa> {
    let settings = SettingGroup::builder(name, doc).parent(shared.name).build()?;
    Ok(TargetIsa::new(name, settings, vec!["base"]))
}

fn define(name: &str, shared: &SettingGroup) -> MetaResult<TargetIsa> {
    match name {
        "riscv" => riscv::define(shared),
        "intel" => plain("intel", "Intel settings", shared),
        "arm32" => plain("arm32", "ARM32 settings", shared),
        "arm64" => plain("arm64", "ARM64 settings", shared),
        _ => Err(MetaError::UnknownIsa {
            name: name.to_string(),
        }),
    }
}

/// Every supported target, in registry order.
pub fn all_isas(shared: &SettingGroup) -> MetaResult<Vec<TargetIsa>> {
    ISA_NAMES.iter().map(|name| define(name, shared)).collect()
}

/// Find a target by name.
pub fn lookup(name: &str, shared: &SettingGroup) -> MetaResult<TargetIsa> {
    define(name, shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base;

    #[test]
    fn test_registry() {
        let shared = base::settings::define().unwrap();
        let isas = all_isas(&shared).unwrap();
        let names: Vec<_> = isas.iter().map(|isa| isa.name).collect();
        assert_eq!(names, ISA_NAMES);
        assert!(isas.iter().all(|isa| isa.settings.parent == Some("shared")));
    }

    #[test]
    fn test_lookup() {
        let shared = base::settings::define().unwrap();
        let riscv = lookup("riscv", &shared).unwrap();
        assert_eq!(riscv.settings.settings().len(), 5);
        assert_eq!(riscv.settings.default_bytes(), vec![0b1_0000]);
        assert_eq!(lookup("intel", &shared).unwrap().settings.settings_size(), 0);

        assert!(matches!(
            lookup("mips", &shared),
            Err(MetaError::UnknownIsa { name }) if name == "mips"
        ));
    }
}
