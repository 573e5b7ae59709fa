//! Immutable per-dialect reference tables
//!
//! A [`SourcePatch`] describes the stock values of one engine dialect. Patch
//! contexts never mutate it; they shadow-copy entries on first access and the
//! writer diffs the shadow copies against it. One instance per dialect is
//! shared between contexts through `Arc`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::entity::{
    DehActionPointer, DehAmmo, DehMiscellany, DehSound, DehState, DehThing, DehWeapon,
};

mod builder;
#[cfg(feature = "serde")]
pub mod loader;
pub mod registry;

pub use builder::SourcePatchBuilder;
pub use registry::BaselineSet;

/// Episode/map key of a par time; Doom II maps have no episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeMap {
    /// Episode number, `None` for Doom II maps
    pub episode: Option<i32>,
    /// Map number
    pub map: i32,
}

impl EpisodeMap {
    /// `ExMy` key
    pub fn episode(episode: i32, map: i32) -> Self {
        Self {
            episode: Some(episode),
            map,
        }
    }

    /// `MAPxx` key
    pub fn map(map: i32) -> Self {
        Self { episode: None, map }
    }
}

impl fmt::Display for EpisodeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.episode {
            Some(episode) => write!(f, "{episode} {}", self.map),
            None => write!(f, "{}", self.map),
        }
    }
}

/// First dynamically allocated indices of an open-ended baseline
///
/// Lookups past the fixed tables resolve to blank entities instead of
/// failing, and table counts become unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenTables {
    /// First dynamic thing index
    pub thing_start: i32,
    /// First dynamic sound index
    pub sound_start: i32,
    /// First dynamic sprite index
    pub sprite_start: i32,
    /// First dynamic state index
    pub state_start: i32,
}

/// Fixed string array with embedded sound and sprite name sub-ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedStrings {
    pub(crate) values: Vec<String>,
    pub(crate) sound_offset: usize,
    pub(crate) sprite_offset: usize,
    pub(crate) sprite_count: usize,
}

impl IndexedStrings {
    /// All strings in table order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Offset of sound 0's name
    pub fn sound_offset(&self) -> usize {
        self.sound_offset
    }

    /// Offset of sprite 0's name
    pub fn sprite_offset(&self) -> usize {
        self.sprite_offset
    }

    /// Number of sprite names in the sub-range
    pub fn sprite_count(&self) -> usize {
        self.sprite_count
    }
}

/// Key/value string table of extended dialects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyedStrings {
    pub(crate) values: BTreeMap<String, String>,
    pub(crate) user_prefixes: Vec<String>,
}

impl KeyedStrings {
    /// Baseline value for a key, case-insensitive
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    /// Whether a key may be set in a patch
    pub fn is_valid_key(&self, key: &str) -> bool {
        let key = key.to_ascii_uppercase();
        self.values.contains_key(&key)
            || self
                .user_prefixes
                .iter()
                .any(|prefix| key.starts_with(prefix.as_str()))
    }

    /// Known keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// String model of a baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineStrings {
    /// Doom 1.9 executable string table
    Indexed(IndexedStrings),
    /// Boom `[STRINGS]` mnemonics
    Keyed(KeyedStrings),
}

/// How states reach their action pointers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerAddressing {
    /// Every state owns a pointer slot with the same index
    PerState,
    /// A fixed list of pointer slots, each hosted by one state
    Slots(Vec<i32>),
}

/// Immutable reference tables of one dialect
#[derive(Debug)]
pub struct SourcePatch {
    pub(crate) name: String,
    pub(crate) ammo: BTreeMap<i32, DehAmmo>,
    pub(crate) sounds: BTreeMap<i32, DehSound>,
    pub(crate) weapons: BTreeMap<i32, DehWeapon>,
    pub(crate) things: BTreeMap<i32, DehThing>,
    pub(crate) states: BTreeMap<i32, DehState>,
    pub(crate) state_pointers: BTreeMap<i32, Arc<DehActionPointer>>,
    pub(crate) addressing: PointerAddressing,
    pub(crate) slot_of_state: HashMap<i32, i32>,
    pub(crate) catalog: BTreeMap<String, Arc<DehActionPointer>>,
    pub(crate) null_pointer: Arc<DehActionPointer>,
    pub(crate) sound_names: BTreeMap<i32, String>,
    pub(crate) sprite_names: BTreeMap<i32, String>,
    pub(crate) sound_lookup: HashMap<String, i32>,
    pub(crate) sprite_lookup: HashMap<String, i32>,
    pub(crate) strings: BaselineStrings,
    pub(crate) pars: BTreeMap<EpisodeMap, i32>,
    pub(crate) misc: DehMiscellany,
    pub(crate) open_tables: Option<OpenTables>,
    pub(crate) blank_thing: DehThing,
    pub(crate) blank_sound: DehSound,
    pub(crate) blank_state: DehState,
}

fn count_of<T>(table: &BTreeMap<i32, T>) -> i32 {
    table.len() as i32
}

impl SourcePatch {
    /// Start building a baseline
    pub fn builder<S: Into<String>>(name: S) -> SourcePatchBuilder {
        SourcePatchBuilder::new(name)
    }

    /// Baseline name, e.g. `doom19`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open-table offsets, if the tables are open-ended
    pub fn open_tables(&self) -> Option<OpenTables> {
        self.open_tables
    }

    /// Whether tables grow past their fixed entries
    pub fn is_open_ended(&self) -> bool {
        self.open_tables.is_some()
    }

    fn open_count(&self, fixed: i32) -> i32 {
        if self.is_open_ended() { i32::MAX } else { fixed }
    }

    /// Number of ammo types
    pub fn ammo_count(&self) -> i32 {
        count_of(&self.ammo)
    }

    /// Number of sounds
    pub fn sound_count(&self) -> i32 {
        self.open_count(count_of(&self.sounds))
    }

    /// Number of weapons
    pub fn weapon_count(&self) -> i32 {
        count_of(&self.weapons)
    }

    /// Number of things
    pub fn thing_count(&self) -> i32 {
        self.open_count(count_of(&self.things))
    }

    /// Number of states
    pub fn state_count(&self) -> i32 {
        self.open_count(count_of(&self.states))
    }

    /// Number of sprites
    pub fn sprite_count(&self) -> i32 {
        self.open_count(self.sprite_names.len() as i32)
    }

    /// Number of action pointer slots
    pub fn action_pointer_count(&self) -> i32 {
        match &self.addressing {
            PointerAddressing::PerState => self.state_count(),
            PointerAddressing::Slots(slots) => slots.len() as i32,
        }
    }

    /// Number of entries in the fixed tables, ignoring open-endedness
    pub fn fixed_counts(&self) -> TableCounts {
        TableCounts {
            ammo: self.ammo.len(),
            sounds: self.sounds.len(),
            weapons: self.weapons.len(),
            things: self.things.len(),
            states: self.states.len(),
            sprites: self.sprite_names.len(),
            pointers: self.state_pointers.len(),
        }
    }

    /// Ammo type at an index
    pub fn ammo(&self, index: i32) -> Option<&DehAmmo> {
        self.ammo.get(&index)
    }

    /// Sound at an index
    pub fn sound(&self, index: i32) -> Option<&DehSound> {
        self.sounds
            .get(&index)
            .or_else(|| self.open_fallback(index, &self.blank_sound))
    }

    /// Weapon at an index
    pub fn weapon(&self, index: i32) -> Option<&DehWeapon> {
        self.weapons.get(&index)
    }

    /// Thing at an index
    pub fn thing(&self, index: i32) -> Option<&DehThing> {
        self.things
            .get(&index)
            .or_else(|| self.open_fallback(index, &self.blank_thing))
    }

    /// State at an index
    pub fn state(&self, index: i32) -> Option<&DehState> {
        self.states
            .get(&index)
            .or_else(|| self.open_fallback(index, &self.blank_state))
    }

    fn open_fallback<'a, T>(&self, index: i32, blank: &'a T) -> Option<&'a T> {
        (self.is_open_ended() && index >= 0).then_some(blank)
    }

    /// Pointer slot of a state, if it has one
    pub fn state_action_pointer_index(&self, state_index: i32) -> Option<i32> {
        match &self.addressing {
            PointerAddressing::PerState => self.state(state_index).map(|_| state_index),
            PointerAddressing::Slots(_) => self.slot_of_state.get(&state_index).copied(),
        }
    }

    /// State hosting a pointer slot
    pub fn action_pointer_state_index(&self, pointer_index: i32) -> Option<i32> {
        match &self.addressing {
            PointerAddressing::PerState => self.state(pointer_index).map(|_| pointer_index),
            PointerAddressing::Slots(slots) => usize::try_from(pointer_index)
                .ok()
                .and_then(|i| slots.get(i))
                .copied(),
        }
    }

    /// Pointer in a slot; `NULL` for empty slots, `None` for missing slots
    pub fn action_pointer(&self, pointer_index: i32) -> Option<Arc<DehActionPointer>> {
        let state_index = self.action_pointer_state_index(pointer_index)?;
        Some(
            self.state_pointers
                .get(&state_index)
                .cloned()
                .unwrap_or_else(|| Arc::clone(&self.null_pointer)),
        )
    }

    /// Whether states own their pointers one to one
    pub fn addressing(&self) -> &PointerAddressing {
        &self.addressing
    }

    /// Catalog pointer by mnemonic, case-insensitive
    pub fn action_pointer_by_mnemonic(&self, mnemonic: &str) -> Option<Arc<DehActionPointer>> {
        self.catalog.get(&mnemonic.to_ascii_lowercase()).cloned()
    }

    /// The shared `NULL` pointer
    pub fn null_action_pointer(&self) -> Arc<DehActionPointer> {
        Arc::clone(&self.null_pointer)
    }

    /// Every catalog pointer, sorted by mnemonic
    pub fn action_pointers(&self) -> impl Iterator<Item = &Arc<DehActionPointer>> {
        self.catalog.values()
    }

    /// Sound index by name, case-insensitive
    pub fn sound_index(&self, name: &str) -> Option<i32> {
        self.sound_lookup.get(&name.to_ascii_uppercase()).copied()
    }

    /// Sprite index by name, case-insensitive
    pub fn sprite_index(&self, name: &str) -> Option<i32> {
        self.sprite_lookup.get(&name.to_ascii_uppercase()).copied()
    }

    /// Sound name at an index
    pub fn sound_name(&self, index: i32) -> Option<&str> {
        self.sound_names.get(&index).map(String::as_str)
    }

    /// Sprite name at an index
    pub fn sprite_name(&self, index: i32) -> Option<&str> {
        self.sprite_names.get(&index).map(String::as_str)
    }

    /// String model
    pub fn strings(&self) -> &BaselineStrings {
        &self.strings
    }

    /// Number of strings in an indexed table
    pub fn string_count(&self) -> usize {
        match &self.strings {
            BaselineStrings::Indexed(table) => table.values.len(),
            BaselineStrings::Keyed(table) => table.values.len(),
        }
    }

    /// Indexed string at a position
    pub fn string_at(&self, index: usize) -> Option<&str> {
        match &self.strings {
            BaselineStrings::Indexed(table) => table.values.get(index).map(String::as_str),
            BaselineStrings::Keyed(_) => None,
        }
    }

    /// Keyed string by mnemonic
    pub fn string(&self, key: &str) -> Option<&str> {
        match &self.strings {
            BaselineStrings::Keyed(table) => table.get(key),
            BaselineStrings::Indexed(_) => None,
        }
    }

    /// Par time in seconds
    pub fn par_time(&self, key: EpisodeMap) -> Option<i32> {
        self.pars.get(&key).copied()
    }

    /// Every baseline par time
    pub fn par_times(&self) -> &BTreeMap<EpisodeMap, i32> {
        &self.pars
    }

    /// Miscellany record
    pub fn miscellany(&self) -> &DehMiscellany {
        &self.misc
    }
}

/// Fixed table sizes of a baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    /// Ammo types
    pub ammo: usize,
    /// Sounds
    pub sounds: usize,
    /// Weapons
    pub weapons: usize,
    /// Things
    pub things: usize,
    /// States
    pub states: usize,
    /// Sprite names
    pub sprites: usize,
    /// States with a non-NULL action
    pub pointers: usize,
}
