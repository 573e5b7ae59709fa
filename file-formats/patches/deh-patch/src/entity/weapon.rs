//! Weapon records

use std::io::{self, Write};

use crate::feature::FeatureLevel;

use super::{CustomValues, DehObject, EntityKind, StateLabels, write_field};

/// Ammo type index of weapons that never consume ammo
pub const AMMO_INFINITE: i32 = 5;

/// Ammo-per-shot value that keeps the engine default
pub const DEFAULT_AMMO_PER_SHOT: i32 = -1;

/// Label of the flash-light-off state every fresh weapon points at
pub const LABEL_LIGHTDONE: &str = "lightdone";

/// Labels with a dedicated DeHackEd field, in output order
///
/// DeHackEd names the raise state "Deselect frame" and the lower state
/// "Select frame".
pub const WEAPON_LABEL_FIELDS: [(&str, &str); 5] = [
    ("select", "Deselect frame"),
    ("deselect", "Select frame"),
    ("ready", "Bobbing frame"),
    ("fire", "Shooting frame"),
    ("flash", "Firing frame"),
];

/// A player weapon
#[derive(Debug, Clone)]
pub struct DehWeapon {
    /// Display name, written in the block header only
    pub name: String,
    /// Index into the ammo table, or [`AMMO_INFINITE`]
    pub ammo_type: i32,
    /// `-1` keeps the engine default
    pub ammo_per_shot: i32,
    /// MBF21 weapon flags
    pub mbf21_flags: i32,
    /// Entry points into the state table
    pub labels: StateLabels,
    force_output: bool,
    custom: CustomValues,
}

impl Default for DehWeapon {
    fn default() -> Self {
        let mut labels = StateLabels::new();
        labels.set(LABEL_LIGHTDONE, 1);
        Self {
            name: String::new(),
            ammo_type: 0,
            ammo_per_shot: DEFAULT_AMMO_PER_SHOT,
            mbf21_flags: 0,
            labels,
            force_output: false,
            custom: CustomValues::default(),
        }
    }
}

impl DehWeapon {
    /// Create a blank weapon with a name
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// State index of a label, `0` when unset
    pub fn label(&self, label: &str) -> i32 {
        self.labels.get(label)
    }

    /// Set a label, `0` removes it
    pub fn set_label(&mut self, label: &str, index: i32) -> &mut Self {
        self.labels.set(label, index);
        self
    }
}

impl PartialEq for DehWeapon {
    fn eq(&self, other: &Self) -> bool {
        self.ammo_type == other.ammo_type
            && self.ammo_per_shot == other.ammo_per_shot
            && self.mbf21_flags == other.mbf21_flags
            && WEAPON_LABEL_FIELDS
                .iter()
                .all(|(label, _)| self.label(label) == other.label(label))
    }
}

impl DehObject for DehWeapon {
    const KIND: EntityKind = EntityKind::Weapon;

    fn is_force_output(&self) -> bool {
        self.force_output
    }

    fn set_force_output(&mut self, force: bool) {
        self.force_output = force;
    }

    fn custom_values(&self) -> &CustomValues {
        &self.custom
    }

    fn custom_values_mut(&mut self) -> &mut CustomValues {
        &mut self.custom
    }

    fn write_object<W: Write + ?Sized>(
        &self,
        out: &mut W,
        original: &Self,
        level: FeatureLevel,
    ) -> io::Result<()> {
        if self.ammo_type != original.ammo_type {
            write_field(out, "Ammo type", self.ammo_type)?;
        }

        for (label, field) in WEAPON_LABEL_FIELDS {
            let index = self.label(label);
            if index != original.label(label) {
                write_field(out, field, index)?;
            }
        }

        if level.supports(FeatureLevel::Mbf21) {
            if self.ammo_per_shot != original.ammo_per_shot {
                write_field(out, "Ammo per shot", self.ammo_per_shot)?;
            }
            if self.mbf21_flags != original.mbf21_flags {
                write_field(out, "MBF21 Bits", self.mbf21_flags)?;
            }
        }

        self.custom.write_diff(out, &original.custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_weapon_has_lightdone() {
        let weapon = DehWeapon::default();
        assert_eq!(weapon.label("LightDone"), 1);
    }

    #[test]
    fn test_select_and_deselect_swap_field_names() {
        let original = DehWeapon::default();
        let mut pistol = original.clone();
        pistol.set_label("select", 6).set_label("deselect", 5);

        let mut out = Vec::new();
        pistol
            .write_object(&mut out, &original, FeatureLevel::Doom19)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Deselect frame = 6\r\nSelect frame = 5\r\n"
        );
    }

    #[test]
    fn test_ammo_per_shot_needs_mbf21() {
        let original = DehWeapon::default();
        let mut bfg = original.clone();
        bfg.ammo_per_shot = 40;

        let mut out = Vec::new();
        bfg.write_object(&mut out, &original, FeatureLevel::Mbf).unwrap();
        assert!(out.is_empty());

        bfg.write_object(&mut out, &original, FeatureLevel::Mbf21)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Ammo per shot = 40\r\n");
    }
}
