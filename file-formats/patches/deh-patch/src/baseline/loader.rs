//! Baseline loading from JSON and YAML definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::entity::{
    DehActionPointer, DehAmmo, DehMiscellany, DehSound, DehState, DehThing, DehWeapon,
};
use crate::error::{Error, Result};
use crate::feature::ActionPointerType;

use super::{EpisodeMap, OpenTables, SourcePatch, SourcePatchBuilder};

/// Baseline definition file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BaselineDefinition {
    /// Name of the baseline, e.g. `doom19`
    pub name: String,
    /// String model
    #[serde(default)]
    pub strings: StringsDefinition,
    /// Sound table
    #[serde(default)]
    pub sounds: Vec<SoundDefinition>,
    /// Sprite names (ignored when strings are indexed)
    #[serde(default)]
    pub sprites: Vec<String>,
    /// Ammo table
    #[serde(default)]
    pub ammo: Vec<AmmoDefinition>,
    /// Weapon table
    #[serde(default)]
    pub weapons: Vec<WeaponDefinition>,
    /// Thing table
    #[serde(default)]
    pub things: Vec<ThingDefinition>,
    /// State table
    #[serde(default)]
    pub states: Vec<StateDefinition>,
    /// Action pointer catalog
    #[serde(default)]
    pub pointers: Vec<PointerDefinition>,
    /// Hosting states of fixed pointer slots; absent means one slot per state
    #[serde(default)]
    pub pointer_slots: Option<Vec<i32>>,
    /// Par times
    #[serde(default)]
    pub pars: Vec<ParDefinition>,
    /// Miscellany values
    #[serde(default)]
    pub misc: MiscDefinition,
    /// Dynamic index offsets of open-ended dialects
    #[serde(default)]
    pub open_tables: Option<OpenTables>,
}

/// String model definition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StringsDefinition {
    /// Fixed string array
    Indexed {
        /// All strings in table order
        values: Vec<String>,
        /// Position of sound 0's name
        sound_offset: usize,
        /// Position of sprite 0's name
        sprite_offset: usize,
        /// Number of sprite names
        sprite_count: usize,
    },
    /// Key/value mnemonics
    Keyed {
        /// Known keys and their stock values
        #[serde(default)]
        values: BTreeMap<String, String>,
        /// Prefixes of user-definable keys
        #[serde(default)]
        user_prefixes: Vec<String>,
    },
}

impl Default for StringsDefinition {
    fn default() -> Self {
        StringsDefinition::Keyed {
            values: BTreeMap::new(),
            user_prefixes: Vec::new(),
        }
    }
}

/// Sound entry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SoundDefinition {
    /// Explicit index (open-ended baselines only)
    pub index: Option<i32>,
    /// Lump name without the `DS` prefix
    pub name: String,
    /// Playback priority
    pub priority: i32,
    /// Single-instance flag
    pub singular: bool,
}

/// Ammo entry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AmmoDefinition {
    /// Display name
    pub name: String,
    /// Maximum carried
    pub max: i32,
    /// Small pickup amount
    pub pickup: i32,
}

/// Weapon entry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WeaponDefinition {
    /// Display name
    pub name: String,
    /// Ammo table index
    pub ammo_type: i32,
    /// Ammo consumed per shot
    pub ammo_per_shot: i32,
    /// MBF21 weapon flags
    pub mbf21_flags: i32,
    /// State labels
    pub labels: BTreeMap<String, i32>,
}

impl Default for WeaponDefinition {
    fn default() -> Self {
        let weapon = DehWeapon::default();
        Self {
            name: String::new(),
            ammo_type: weapon.ammo_type,
            ammo_per_shot: weapon.ammo_per_shot,
            mbf21_flags: 0,
            labels: BTreeMap::new(),
        }
    }
}

/// Thing entry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ThingDefinition {
    /// Explicit index (open-ended baselines only)
    pub index: Option<i32>,
    pub name: String,
    pub editor_number: i32,
    pub health: i32,
    pub speed: i32,
    pub radius: i32,
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
    pub fast_speed: i32,
    pub melee_range: i32,
    pub labels: BTreeMap<String, i32>,
}

impl Default for ThingDefinition {
    fn default() -> Self {
        let thing = DehThing::default();
        Self {
            index: None,
            name: thing.name,
            editor_number: thing.editor_number,
            health: thing.health,
            speed: thing.speed,
            radius: thing.radius,
            height: thing.height,
            damage: thing.damage,
            reaction_time: thing.reaction_time,
            pain_chance: thing.pain_chance,
            flags: thing.flags,
            mass: thing.mass,
            see_sound: thing.see_sound,
            active_sound: thing.active_sound,
            attack_sound: thing.attack_sound,
            pain_sound: thing.pain_sound,
            death_sound: thing.death_sound,
            mbf21_flags: thing.mbf21_flags,
            rip_sound: thing.rip_sound,
            fast_speed: thing.fast_speed,
            melee_range: thing.melee_range,
            labels: BTreeMap::new(),
        }
    }
}

impl ThingDefinition {
    fn to_thing(&self) -> DehThing {
        let mut thing = DehThing::named(self.name.clone());
        thing.editor_number = self.editor_number;
        thing.health = self.health;
        thing.speed = self.speed;
        thing.radius = self.radius;
        thing.height = self.height;
        thing.damage = self.damage;
        thing.reaction_time = self.reaction_time;
        thing.pain_chance = self.pain_chance;
        thing.flags = self.flags;
        thing.mass = self.mass;
        thing.see_sound = self.see_sound;
        thing.active_sound = self.active_sound;
        thing.attack_sound = self.attack_sound;
        thing.pain_sound = self.pain_sound;
        thing.death_sound = self.death_sound;
        thing.mbf21_flags = self.mbf21_flags;
        thing.rip_sound = self.rip_sound;
        thing.fast_speed = self.fast_speed;
        thing.melee_range = self.melee_range;
        for (label, &index) in &self.labels {
            thing.set_label(label, index);
        }
        thing
    }
}

/// State entry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StateDefinition {
    /// Explicit index (open-ended baselines only)
    pub index: Option<i32>,
    /// Sprite index
    pub sprite: i32,
    /// Frame letter index
    pub frame: i32,
    /// Full-bright flag
    pub bright: bool,
    /// Successor state
    pub next: i32,
    /// Tics, `-1` for forever
    pub duration: i32,
    /// Classic parameter 1
    pub misc1: i32,
    /// Classic parameter 2
    pub misc2: i32,
    /// MBF21 arguments
    pub args: Vec<i32>,
    /// MBF21 state flags
    pub flags: i32,
    /// Action mnemonic
    pub pointer: Option<String>,
}

impl Default for StateDefinition {
    fn default() -> Self {
        Self {
            index: None,
            sprite: 0,
            frame: 0,
            bright: false,
            next: 0,
            duration: -1,
            misc1: 0,
            misc2: 0,
            args: Vec::new(),
            flags: 0,
            pointer: None,
        }
    }
}

/// Action pointer catalog entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PointerDefinition {
    /// Mnemonic without `A_`
    pub mnemonic: String,
    /// Vocabulary
    #[serde(default)]
    pub kind: ActionPointerType,
    /// Weapon pointer flag
    #[serde(default)]
    pub weapon: bool,
    /// Hosting vanilla state; inferred when absent
    #[serde(default)]
    pub frame: Option<i32>,
}

/// Par time entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParDefinition {
    /// Episode, absent for `MAPxx` maps
    #[serde(default)]
    pub episode: Option<i32>,
    /// Map number
    pub map: i32,
    /// Par time in seconds
    pub seconds: i32,
}

/// Miscellany values
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct MiscDefinition {
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
}

impl Default for MiscDefinition {
    fn default() -> Self {
        let misc = DehMiscellany::default();
        Self {
            monster_infighting: misc.monster_infighting,
            initial_bullets: misc.initial_bullets,
            initial_health: misc.initial_health,
            green_armor_class: misc.green_armor_class,
            blue_armor_class: misc.blue_armor_class,
            soulsphere_health: misc.soulsphere_health,
            max_soulsphere_health: misc.max_soulsphere_health,
            megasphere_health: misc.megasphere_health,
            god_mode_health: misc.god_mode_health,
            idfa_armor: misc.idfa_armor,
            idfa_armor_class: misc.idfa_armor_class,
            idkfa_armor: misc.idkfa_armor,
            idkfa_armor_class: misc.idkfa_armor_class,
            bfg_cells_per_shot: misc.bfg_cells_per_shot,
            max_health: misc.max_health,
            max_armor: misc.max_armor,
        }
    }
}

impl MiscDefinition {
    fn to_miscellany(&self) -> DehMiscellany {
        let mut misc = DehMiscellany::default();
        misc.monster_infighting = self.monster_infighting;
        misc.initial_bullets = self.initial_bullets;
        misc.initial_health = self.initial_health;
        misc.green_armor_class = self.green_armor_class;
        misc.blue_armor_class = self.blue_armor_class;
        misc.soulsphere_health = self.soulsphere_health;
        misc.max_soulsphere_health = self.max_soulsphere_health;
        misc.megasphere_health = self.megasphere_health;
        misc.god_mode_health = self.god_mode_health;
        misc.idfa_armor = self.idfa_armor;
        misc.idfa_armor_class = self.idfa_armor_class;
        misc.idkfa_armor = self.idkfa_armor;
        misc.idkfa_armor_class = self.idkfa_armor_class;
        misc.bfg_cells_per_shot = self.bfg_cells_per_shot;
        misc.max_health = self.max_health;
        misc.max_armor = self.max_armor;
        misc
    }
}

impl BaselineDefinition {
    /// Load a definition from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a definition from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a definition from a YAML file
    #[cfg(feature = "yaml")]
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_yaml_ng::from_reader(reader)?)
    }

    /// Load a definition from a YAML string
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a definition, choosing the format from the file extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml(path),
            _ => Err(Error::baseline(format!(
                "unsupported baseline file: {}",
                path.display()
            ))),
        }
    }

    /// Convert the definition to a baseline
    pub fn to_source_patch(&self) -> Result<SourcePatch> {
        let mut builder = SourcePatchBuilder::new(&self.name);

        match &self.strings {
            StringsDefinition::Indexed {
                values,
                sound_offset,
                sprite_offset,
                sprite_count,
            } => {
                builder =
                    builder.indexed_strings(values.clone(), *sound_offset, *sprite_offset, *sprite_count);
            }
            StringsDefinition::Keyed {
                values,
                user_prefixes,
            } => {
                for (key, value) in values {
                    builder = builder.keyed_string(key, value.clone());
                }
                for prefix in user_prefixes {
                    builder = builder.user_string_prefix(prefix);
                }
            }
        }

        for sound in &self.sounds {
            let entry = DehSound::new(sound.priority, sound.singular);
            builder = match sound.index {
                Some(index) => builder.sound_at(index, sound.name.clone(), entry),
                None => builder.sound(sound.name.clone(), entry),
            };
        }
        for sprite in &self.sprites {
            builder = builder.sprite(sprite.clone());
        }
        for ammo in &self.ammo {
            builder = builder.ammo(DehAmmo::new(ammo.name.clone(), ammo.max, ammo.pickup));
        }
        for def in &self.weapons {
            let mut weapon = DehWeapon::named(def.name.clone());
            weapon.ammo_type = def.ammo_type;
            weapon.ammo_per_shot = def.ammo_per_shot;
            weapon.mbf21_flags = def.mbf21_flags;
            for (label, &index) in &def.labels {
                weapon.set_label(label, index);
            }
            builder = builder.weapon(weapon);
        }
        for def in &self.things {
            builder = match def.index {
                Some(index) => builder.thing_at(index, def.to_thing()),
                None => builder.thing(def.to_thing()),
            };
        }
        for def in &self.states {
            let mut state = DehState::new(def.sprite, def.frame, def.bright, def.next, def.duration);
            state.misc1 = def.misc1;
            state.misc2 = def.misc2;
            state.flags = def.flags;
            state.set_args(&def.args);
            let action = def.pointer.as_deref();
            builder = match def.index {
                Some(index) => builder.state_at(index, state, action),
                None => builder.state(state, action),
            };
        }
        for def in &self.pointers {
            builder = builder.action_pointer(DehActionPointer::new(
                def.mnemonic.clone(),
                def.kind,
                def.weapon,
                def.frame.unwrap_or(-1),
            ));
        }
        if let Some(slots) = &self.pointer_slots {
            builder = builder.pointer_slots(slots.clone());
        }
        for par in &self.pars {
            let key = match par.episode {
                Some(episode) => EpisodeMap::episode(episode, par.map),
                None => EpisodeMap::map(par.map),
            };
            builder = builder.par(key, par.seconds);
        }
        builder = builder.miscellany(self.misc.to_miscellany());
        if let Some(open) = self.open_tables {
            builder = builder.open_tables(open);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI: &str = r#"{
        "name": "mini",
        "strings": { "keyed": { "values": { "GOTARMOR": "Picked up the armor." } } },
        "sounds": [ { "name": "" }, { "name": "pistol", "priority": 64 } ],
        "sprites": [ "TROO" ],
        "states": [
            { "next": 0 },
            { "next": 1, "pointer": "Light0" },
            { "sprite": 0, "next": 2, "duration": 10, "pointer": "Look" }
        ],
        "pointers": [ { "mnemonic": "Light0", "weapon": true }, { "mnemonic": "Look" } ],
        "pars": [ { "episode": 1, "map": 1, "seconds": 30 }, { "map": 7, "seconds": 120 } ]
    }"#;

    #[test]
    fn test_json_definition() {
        let patch = BaselineDefinition::from_json_str(MINI)
            .unwrap()
            .to_source_patch()
            .unwrap();
        assert_eq!(patch.name(), "mini");
        assert_eq!(patch.state_count(), 3);
        assert_eq!(patch.sound_index("PISTOL"), Some(1));
        assert_eq!(patch.string("gotarmor"), Some("Picked up the armor."));
        assert_eq!(patch.par_time(EpisodeMap::map(7)), Some(120));
        assert_eq!(patch.state(2).unwrap().duration, 10);
    }

    #[test]
    fn test_unknown_extension() {
        let err = BaselineDefinition::from_file("baseline.toml").unwrap_err();
        assert!(matches!(err, Error::Baseline(_)));
    }
}
