// This module collects the target-independent definitions: the shared instruction set,
// the shared settings group and the legalization transform groups built on top of them.
// define() assembles all of them into one Definitions value that the generators and the
// metagen tool work from.

//! Target-independent definitions.

pub mod instructions;
pub mod legalize;
pub mod settings;

use crate::cdsl::instructions::InstructionGroup;
use crate::cdsl::settings::SettingGroup;
use crate::cdsl::xform::XFormGroup;
use crate::core::error::{MetaError, MetaResult};

pub use instructions::Opcodes;

/// Everything the shared definitions declare.
pub struct Definitions {
    pub settings: SettingGroup,
    pub instructions: InstructionGroup,
    pub opcodes: Opcodes,
    pub transform_groups: Vec<XFormGroup>,
}

impl Definitions {
    pub fn transform_group(&self, name: &str) -> MetaResult<&XFormGroup> {
        self.transform_groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| MetaError::UnknownTransformGroup {
                name: name.to_string(),
            })
    }
}

pub fn define() -> MetaResult<Definitions> {
    let settings = settings::define()?;

    let mut instructions = InstructionGroup::new("base", "Shared base instruction set");
    let opcodes = instructions::define(&mut instructions)?;

    let transform_groups = vec![
        legalize::narrow(&instructions, &opcodes)?,
        legalize::expand(&instructions, &opcodes)?,
    ];

    log::debug!(
        "base definitions: {} instructions, {} settings, {} transform groups",
        instructions.len(),
        settings.settings().len(),
        transform_groups.len()
    );

    Ok(Definitions {
        settings,
        instructions,
        opcodes,
        transform_groups,
    })
}
