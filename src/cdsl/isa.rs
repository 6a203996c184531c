//! Target ISA descriptions.

use super::settings::SettingGroup;

/// A target instruction set architecture.
#[derive(Debug, Clone)]
pub struct TargetIsa {
    pub name: &'static str,
    pub settings: SettingGroup,
    /// Names of the instruction groups available on this target.
    pub instruction_groups: Vec<&'static str>,
}

impl TargetIsa {
    pub fn new(name: &'static str, settings: SettingGroup, instruction_groups: Vec<&'static str>) -> Self {
        Self {
            name,
            settings,
            instruction_groups,
        }
    }
}
