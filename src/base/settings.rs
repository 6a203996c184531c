//! Settings shared by all targets.

use crate::cdsl::settings::SettingGroup;
use crate::core::error::MetaResult;

pub fn define() -> MetaResult<SettingGroup> {
    SettingGroup::builder("shared", "Shared settings group")
        .add_enum(
            "opt_level",
            r#"
            Optimization level:

            - default: Very profitable optimizations enabled, none slow.
            - best: Enable all optimizations
            - fastest: Optimize for compile time by disabling most optimizations.
            "#,
            &["default", "best", "fastest"],
        )
        .add_bool(
            "enable_verifier",
            r#"
            Run the IR verifier at strategic times during compilation.

            This makes compilation slower but catches many bugs. The verifier is
            disabled by default, except when reading IR from a text file.
            "#,
            false,
        )
        .add_bool("is_64bit", "Enable 64-bit code generation", false)
        .add_bool(
            "is_compressed",
            "Enable compressed instructions, if available on the target.",
            false,
        )
        .add_bool(
            "enable_float",
            r#"
            Enable the use of floating-point instructions

            Disabling use of floating-point instructions is not yet implemented.
            "#,
            true,
        )
        .add_bool(
            "enable_simd",
            "Enable the use of SIMD instructions.",
            true,
        )
        .add_bool(
            "enable_atomics",
            "Enable the use of atomic instructions",
            true,
        )
        .build()
}
