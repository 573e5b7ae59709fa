//! Thing (mobj info) records

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::feature::FeatureLevel;

use super::{CRLF, CustomValues, DehObject, EntityKind, StateLabels, write_field};

/// `MF_MISSILE`: speeds of projectiles are written as fixed point
pub const FLAG_MISSILE: i32 = 1 << 16;

/// Editor number of things that cannot be placed on a map
pub const EDITOR_NUMBER_NONE: i32 = -1;

/// Sound index meaning "no sound"
pub const SOUND_NONE: i32 = 0;

/// Labels with a dedicated DeHackEd field, in output order
pub const THING_LABEL_FIELDS: [(&str, &str); 8] = [
    ("spawn", "Initial frame"),
    ("see", "First moving frame"),
    ("pain", "Injury frame"),
    ("melee", "Close attack frame"),
    ("missile", "Far attack frame"),
    ("death", "Death frame"),
    ("xdeath", "Exploding frame"),
    ("raise", "Respawn frame"),
];

/// A thing (monster, projectile, pickup or decoration)
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct DehThing {
    /// Display name, written in the block header only
    pub name: String,
    pub editor_number: i32,
    pub health: i32,
    /// Map units per tic; fixed point on output for projectiles
    pub speed: i32,
    /// Map units
    pub radius: i32,
    /// Map units
    pub height: i32,
    pub damage: i32,
    pub reaction_time: i32,
    pub pain_chance: i32,
    pub flags: i32,
    pub mass: i32,
    pub see_sound: i32,
    pub active_sound: i32,
    pub attack_sound: i32,
    pub pain_sound: i32,
    pub death_sound: i32,
    pub mbf21_flags: i32,
    pub rip_sound: i32,
    /// `-1` means "same as speed"
    pub fast_speed: i32,
    /// Map units
    pub melee_range: i32,
    pub labels: StateLabels,
    /// Editor keys, written as `#$` comment lines
    pub editor_keys: BTreeMap<String, String>,
    force_output: bool,
    custom: CustomValues,
}

impl Default for DehThing {
    fn default() -> Self {
        Self {
            name: String::new(),
            editor_number: EDITOR_NUMBER_NONE,
            health: 0,
            speed: 0,
            radius: 0,
            height: 0,
            damage: 0,
            reaction_time: 0,
            pain_chance: 0,
            flags: 0,
            mass: 0,
            see_sound: SOUND_NONE,
            active_sound: SOUND_NONE,
            attack_sound: SOUND_NONE,
            pain_sound: SOUND_NONE,
            death_sound: SOUND_NONE,
            mbf21_flags: 0,
            rip_sound: SOUND_NONE,
            fast_speed: -1,
            melee_range: 64,
            labels: StateLabels::new(),
            editor_keys: BTreeMap::new(),
            force_output: false,
            custom: CustomValues::default(),
        }
    }
}

impl DehThing {
    /// Create a blank thing with a name
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

    fn is_projectile(&self) -> bool {
        self.flags & FLAG_MISSILE != 0
    }

    fn scaled_speed(&self, speed: i32) -> i32 {
        if self.is_projectile() && speed >= 0 { speed << 16 } else { speed }
    }
}

impl PartialEq for DehThing {
    fn eq(&self, other: &Self) -> bool {
        self.editor_number == other.editor_number
            && self.health == other.health
            && self.speed == other.speed
            && self.radius == other.radius
            && self.height == other.height
            && self.damage == other.damage
            && self.reaction_time == other.reaction_time
            && self.pain_chance == other.pain_chance
            && self.flags == other.flags
            && self.mass == other.mass
            && self.see_sound == other.see_sound
            && self.active_sound == other.active_sound
            && self.attack_sound == other.attack_sound
            && self.pain_sound == other.pain_sound
            && self.death_sound == other.death_sound
            && self.mbf21_flags == other.mbf21_flags
            && self.rip_sound == other.rip_sound
            && self.fast_speed == other.fast_speed
            && self.melee_range == other.melee_range
            && THING_LABEL_FIELDS
                .iter()
                .all(|(label, _)| self.label(label) == other.label(label))
    }
}

impl DehObject for DehThing {
    const KIND: EntityKind = EntityKind::Thing;

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

    fn has_editor_keys(&self) -> bool {
        !self.editor_keys.is_empty()
    }

    fn write_object<W: Write + ?Sized>(
        &self,
        out: &mut W,
        original: &Self,
        level: FeatureLevel,
    ) -> io::Result<()> {
        for (key, value) in &self.editor_keys {
            write!(out, "#${key} {value}{CRLF}")?;
        }

        if self.editor_number != original.editor_number {
            write_field(out, "ID #", self.editor_number)?;
        }
        if self.health != original.health {
            write_field(out, "Hit points", self.health)?;
        }
        if self.speed != original.speed || self.flags & FLAG_MISSILE != original.flags & FLAG_MISSILE {
            write_field(out, "Speed", self.scaled_speed(self.speed))?;
        }
        if self.radius != original.radius {
            write_field(out, "Width", self.radius << 16)?;
        }
        if self.height != original.height {
            write_field(out, "Height", self.height << 16)?;
        }
        if self.damage != original.damage {
            write_field(out, "Missile damage", self.damage)?;
        }
        if self.reaction_time != original.reaction_time {
            write_field(out, "Reaction time", self.reaction_time)?;
        }
        if self.pain_chance != original.pain_chance {
            write_field(out, "Pain chance", self.pain_chance)?;
        }
        if self.flags != original.flags {
            write_field(out, "Bits", self.flags)?;
        }
        if self.mass != original.mass {
            write_field(out, "Mass", self.mass)?;
        }

        for (label, field) in THING_LABEL_FIELDS {
            let index = self.label(label);
            if index != original.label(label) {
                write_field(out, field, index)?;
            }
        }

        if self.see_sound != original.see_sound {
            write_field(out, "Alert sound", self.see_sound)?;
        }
        if self.active_sound != original.active_sound {
            write_field(out, "Action sound", self.active_sound)?;
        }
        if self.attack_sound != original.attack_sound {
            write_field(out, "Attack sound", self.attack_sound)?;
        }
        if self.pain_sound != original.pain_sound {
            write_field(out, "Pain sound", self.pain_sound)?;
        }
        if self.death_sound != original.death_sound {
            write_field(out, "Death sound", self.death_sound)?;
        }

        if level.supports(FeatureLevel::Mbf21) {
            if self.mbf21_flags != original.mbf21_flags {
                write_field(out, "MBF21 Bits", self.mbf21_flags)?;
            }
            if self.rip_sound != original.rip_sound {
                write_field(out, "Rip sound", self.rip_sound)?;
            }
            if self.fast_speed != original.fast_speed {
                write_field(out, "Fast speed", self.scaled_speed(self.fast_speed))?;
            }
            if self.melee_range != original.melee_range {
                write_field(out, "Melee range", self.melee_range << 16)?;
            }
        }

        self.custom.write_diff(out, &original.custom)
    }
}
