//! RISC-V target.

use crate::cdsl::isa::TargetIsa;
use crate::cdsl::settings::SettingGroup;
use crate::core::error::MetaResult;

pub fn define(shared: &SettingGroup) -> MetaResult<TargetIsa> {
    let settings = SettingGroup::builder("riscv", "RISC-V settings")
        .parent(shared.name)
        .add_bool("supports_m", "CPU supports the 'M' extension (mul/div)", false)
        .add_bool("supports_a", "CPU supports the 'A' extension (atomics)", false)
        .add_bool("supports_f", "CPU supports the 'F' extension (float)", false)
        .add_bool("supports_d", "CPU supports the 'D' extension (double)", false)
        .add_bool(
            "enable_m",
            "Enable the use of 'M' instructions if available",
            true,
        )
        .build()?;

    Ok(TargetIsa::new("riscv", settings, vec!["base"]))
}
