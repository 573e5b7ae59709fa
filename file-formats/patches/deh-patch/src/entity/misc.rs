//! Miscellaneous engine values (`Misc 0`)

use std::io::{self, Write};

use crate::feature::FeatureLevel;

use super::{CustomValues, DehObject, EntityKind, write_field};

/// Value DeHackEd expects in `Monsters Infight` to enable infighting
pub const INFIGHT_ENABLED: i32 = 221;

/// The single `Misc 0` record
///
/// Field names follow the DeHackEd keys they are written as.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct DehMiscellany {
    pub monster_infighting: bool,
    pub initial_bullets: i32,
    pub initial_health: i32,
    pub green_armor_class: i32,
    pub blue_armor_class: i32,
    pub soulsphere_health: i32,
    pub max_soulsphere_health: i32,
    pub megasphere_health: i32,
    pub god_mode_health: i32,
    pub idfa_armor: i32,
    pub idfa_armor_class: i32,
    pub idkfa_armor: i32,
    pub idkfa_armor_class: i32,
    pub bfg_cells_per_shot: i32,
    pub max_health: i32,
    pub max_armor: i32,
    force_output: bool,
    custom: CustomValues,
}

impl Default for DehMiscellany {
    fn default() -> Self {
        Self {
            monster_infighting: false,
            initial_bullets: 50,
            initial_health: 100,
            green_armor_class: 1,
            blue_armor_class: 2,
            soulsphere_health: 100,
            max_soulsphere_health: 200,
            megasphere_health: 200,
            god_mode_health: 100,
            idfa_armor: 200,
            idfa_armor_class: 2,
            idkfa_armor: 200,
            idkfa_armor_class: 2,
            bfg_cells_per_shot: 40,
            max_health: 200,
            max_armor: 200,
            force_output: false,
            custom: CustomValues::default(),
        }
    }
}

impl PartialEq for DehMiscellany {
    fn eq(&self, other: &Self) -> bool {
        self.monster_infighting == other.monster_infighting
            && self.initial_bullets == other.initial_bullets
            && self.initial_health == other.initial_health
            && self.green_armor_class == other.green_armor_class
            && self.blue_armor_class == other.blue_armor_class
            && self.soulsphere_health == other.soulsphere_health
            && self.max_soulsphere_health == other.max_soulsphere_health
            && self.megasphere_health == other.megasphere_health
            && self.god_mode_health == other.god_mode_health
            && self.idfa_armor == other.idfa_armor
            && self.idfa_armor_class == other.idfa_armor_class
            && self.idkfa_armor == other.idkfa_armor
            && self.idkfa_armor_class == other.idkfa_armor_class
            && self.bfg_cells_per_shot == other.bfg_cells_per_shot
            && self.max_health == other.max_health
            && self.max_armor == other.max_armor
    }
}

impl DehObject for DehMiscellany {
    const KIND: EntityKind = EntityKind::Misc;

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
        _level: FeatureLevel,
    ) -> io::Result<()> {
        if self.monster_infighting != original.monster_infighting {
            // 202 is the conventional "off" value, written only when reverting
            let value = if self.monster_infighting { INFIGHT_ENABLED } else { 202 };
            write_field(out, "Monsters Infight", value)?;
        }

        let fields = [
            ("Initial Bullets", self.initial_bullets, original.initial_bullets),
            ("Initial Health", self.initial_health, original.initial_health),
            ("Green Armor Class", self.green_armor_class, original.green_armor_class),
            ("Blue Armor Class", self.blue_armor_class, original.blue_armor_class),
            ("Soulsphere Health", self.soulsphere_health, original.soulsphere_health),
            ("Max Soulsphere", self.max_soulsphere_health, original.max_soulsphere_health),
            ("Megasphere Health", self.megasphere_health, original.megasphere_health),
            ("God Mode Health", self.god_mode_health, original.god_mode_health),
            ("IDFA Armor", self.idfa_armor, original.idfa_armor),
            ("IDFA Armor Class", self.idfa_armor_class, original.idfa_armor_class),
            ("IDKFA Armor", self.idkfa_armor, original.idkfa_armor),
            ("IDKFA Armor Class", self.idkfa_armor_class, original.idkfa_armor_class),
            ("BFG Cells/Shot", self.bfg_cells_per_shot, original.bfg_cells_per_shot),
            ("Max Health", self.max_health, original.max_health),
            ("Max Armor", self.max_armor, original.max_armor),
        ];
        for (key, value, baseline) in fields {
            if value != baseline {
                write_field(out, key, value)?;
            }
        }

        self.custom.write_diff(out, &original.custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infighting_and_health() {
        let original = DehMiscellany::default();
        let mut misc = original.clone();
        misc.monster_infighting = true;
        misc.max_health = 400;

        let mut out = Vec::new();
        misc.write_object(&mut out, &original, FeatureLevel::Boom)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Monsters Infight = 221\r\nMax Health = 400\r\n"
        );
    }
}
