// This module describes groups of compiler settings. A setting is a boolean, an enumeration
// or a small number, each with documentation and a default (the first value for
// enumerations). Building a group fixes the byte layout used by the generated Flags
// struct: enumeration and numeric settings take one byte each in declaration order,
// followed by the booleans packed eight to a byte as numbered predicates. The default
// byte image is computed from the same layout.

//! Setting groups and their byte layout.

use hashbrown::{HashMap, HashSet};

use crate::core::error::{MetaError, MetaResult};

/// The type and default of a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingKind {
    Bool { default: bool },
    Num { default: u8 },
    /// The first value is the default.
    Enum { values: Vec<&'static str> },
}

/// A setting with its assigned storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub name: &'static str,
    pub doc: &'static str,
    pub kind: SettingKind,
    /// Byte holding the setting.
    pub byte_offset: usize,
    /// Predicate number of a boolean setting.
    pub predicate: Option<usize>,
}

impl Setting {
    pub fn is_bool(&self) -> bool {
        matches!(self.kind, SettingKind::Bool { .. })
    }

    /// Bit mask within `byte_offset` of a boolean setting.
    pub fn bit_mask(&self) -> Option<u8> {
        self.predicate.map(|p| 1u8 << (p % 8))
    }

    /// Default value as stored in the settings bytes.
    pub fn default_byte(&self) -> u8 {
        match &self.kind {
            SettingKind::Bool { default } => {
                if *default {
                    self.bit_mask().unwrap_or(0)
                } else {
                    0
                }
            }
            SettingKind::Num { default } => *default,
            SettingKind::Enum { .. } => 0,
        }
    }

    /// Short description: the first non-empty line of the documentation.
    pub fn blurb(&self) -> &str {
        super::blurb(self.doc)
    }
}

/// A laid-out group of settings.
#[derive(Debug, Clone)]
pub struct SettingGroup {
    pub name: &'static str,
    pub doc: &'static str,
    pub parent: Option<&'static str>,
    settings: Vec<Setting>,
    by_name: HashMap<&'static str, usize>,
    boolean_offset: usize,
    settings_size: usize,
}

impl SettingGroup {
    pub fn builder(name: &'static str, doc: &'static str) -> SettingGroupBuilder {
        SettingGroupBuilder {
            name,
            doc,
            parent: None,
            settings: Vec::new(),
        }
    }

    /// Settings in layout order.
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    pub fn by_name(&self, name: &str) -> Option<&Setting> {
        self.by_name.get(name).map(|&i| &self.settings[i])
    }

    /// First byte holding boolean settings.
    pub fn boolean_offset(&self) -> usize {
        self.boolean_offset
    }

    /// Bytes needed to store every setting of the group.
    pub fn settings_size(&self) -> usize {
        self.settings_size
    }

    /// The settings bytes with every setting at its default.
    pub fn default_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.settings_size];
        for setting in &self.settings {
            bytes[setting.byte_offset] |= setting.default_byte();
        }
        bytes
    }
}

/// Collects settings in declaration order.
pub struct SettingGroupBuilder {
    name: &'static str,
    doc: &'static str,
    parent: Option<&'static str>,
    settings: Vec<(&'static str, &'static str, SettingKind)>,
}

impl SettingGroupBuilder {
    /// Name the group whose settings are also available to this one.
    pub fn parent(mut self, parent: &'static str) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn add_bool(mut self, name: &'static str, doc: &'static str, default: bool) -> Self {
        self.settings.push((name, doc, SettingKind::Bool { default }));
        self
    }

    pub fn add_num(mut self, name: &'static str, doc: &'static str, default: u8) -> Self {
        self.settings.push((name, doc, SettingKind::Num { default }));
        self
    }

    pub fn add_enum(
        mut self,
        name: &'static str,
        doc: &'static str,
        values: &[&'static str],
    ) -> Self {
        self.settings.push((
            name,
            doc,
            SettingKind::Enum {
                values: values.to_vec(),
            },
        ));
        self
    }

    /// Validate the settings and compute the layout.
    pub fn build(self) -> MetaResult<SettingGroup> {
        let invalid = |name: &str, reason: &str| MetaError::InvalidSetting {
            group: self.name.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let mut seen: HashSet<&'static str> = HashSet::new();
        for (name, _, kind) in &self.settings {
            if !seen.insert(*name) {
                return Err(invalid(name, "defined more than once"));
            }
            if let SettingKind::Enum { values } = kind {
                if values.is_empty() {
                    return Err(invalid(name, "enumeration has no values"));
                }
                if values.len() > 256 {
                    return Err(invalid(name, "enumeration does not fit in a byte"));
                }
                for (i, value) in values.iter().enumerate() {
                    if values[..i].contains(value) {
                        return Err(invalid(name, "enumeration repeats a value"));
                    }
                }
            }
        }

        let (bools, bytes): (Vec<_>, Vec<_>) = self
            .settings
            .into_iter()
            .partition(|(_, _, kind)| matches!(kind, SettingKind::Bool { .. }));

        let boolean_offset = bytes.len();
        let settings_size = boolean_offset + (bools.len() + 7) / 8;

        let mut settings = Vec::with_capacity(bytes.len() + bools.len());
        for (offset, (name, doc, kind)) in bytes.into_iter().enumerate() {
            settings.push(Setting {
                name,
                doc,
                kind,
                byte_offset: offset,
                predicate: None,
            });
        }
        for (number, (name, doc, kind)) in bools.into_iter().enumerate() {
            settings.push(Setting {
                name,
                doc,
                kind,
                byte_offset: boolean_offset + number / 8,
                predicate: Some(number),
            });
        }

        let by_name = settings
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name, i))
            .collect();

        log::debug!(
            "settings group {}: {} settings in {} bytes",
            self.name,
            settings.len(),
            settings_size
        );

        Ok(SettingGroup {
            name: self.name,
            doc: self.doc,
            parent: self.parent,
            settings,
            by_name,
            boolean_offset,
            settings_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_bytes_before_bools() {
        let group = SettingGroup::builder("test", "")
            .add_bool("a", "A.", true)
            .add_enum("level", "Level.", &["low", "high"])
            .add_bool("b", "B.", false)
            .add_num("n", "N.", 7)
            .build()
            .unwrap();

        assert_eq!(group.boolean_offset(), 2);
        assert_eq!(group.settings_size(), 3);
        let names: Vec<_> = group.settings().iter().map(|s| s.name).collect();
        assert_eq!(names, ["level", "n", "a", "b"]);

        let b = group.by_name("b").unwrap();
        assert_eq!(b.predicate, Some(1));
        assert_eq!(b.bit_mask(), Some(0b10));
        assert_eq!(group.default_bytes(), vec![0, 7, 0b01]);
    }

    #[test]
    fn test_many_bools_span_bytes() {
        let names = ["b0", "b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8"];
        let mut builder = SettingGroup::builder("many", "");
        for name in names {
            builder = builder.add_bool(name, "", true);
        }
        let group = builder.build().unwrap();
        assert_eq!(group.boolean_offset(), 0);
        assert_eq!(group.settings_size(), 2);
        assert_eq!(group.by_name("b8").unwrap().byte_offset, 1);
        assert_eq!(group.default_bytes(), vec![0xff, 0x01]);
    }

    #[test]
    fn test_invalid_settings() {
        let empty_enum = SettingGroup::builder("g", "").add_enum("e", "", &[]).build();
        assert!(matches!(empty_enum, Err(MetaError::InvalidSetting { name, .. }) if name == "e"));

        let duplicate = SettingGroup::builder("g", "")
            .add_bool("x", "", false)
            .add_num("x", "", 1)
            .build();
        assert!(matches!(duplicate, Err(MetaError::InvalidSetting { .. })));
    }

    #[test]
    fn test_empty_group() {
        let group = SettingGroup::builder("intel", "").build().unwrap();
        assert_eq!(group.settings_size(), 0);
        assert!(group.default_bytes().is_empty());
    }
}
