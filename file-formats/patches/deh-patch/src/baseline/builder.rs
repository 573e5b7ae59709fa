//! Consistency-checked construction of [`SourcePatch`] values

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::debug;

use crate::entity::pointer::NULL_MNEMONIC;
use crate::entity::{
    DehActionPointer, DehAmmo, DehMiscellany, DehSound, DehState, DehThing, DehWeapon,
};
use crate::error::{Error, Result};
use crate::feature::ActionPointerType;

use super::{
    BaselineStrings, EpisodeMap, IndexedStrings, KeyedStrings, OpenTables, PointerAddressing,
    SourcePatch,
};

fn next_key<T>(table: &BTreeMap<i32, T>) -> i32 {
    table.keys().next_back().map_or(0, |k| k + 1)
}

/// Builder for [`SourcePatch`]
#[derive(Debug)]
pub struct SourcePatchBuilder {
    name: String,
    ammo: BTreeMap<i32, DehAmmo>,
    sounds: BTreeMap<i32, (String, DehSound)>,
    weapons: BTreeMap<i32, DehWeapon>,
    things: BTreeMap<i32, DehThing>,
    states: BTreeMap<i32, (DehState, Option<String>)>,
    sprites: BTreeMap<i32, String>,
    catalog: Vec<DehActionPointer>,
    pointer_slots: Option<Vec<i32>>,
    indexed: Option<IndexedStrings>,
    keyed: KeyedStrings,
    pars: BTreeMap<EpisodeMap, i32>,
    misc: DehMiscellany,
    open_tables: Option<OpenTables>,
}

impl SourcePatchBuilder {
    /// Create an empty builder
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ammo: BTreeMap::new(),
            sounds: BTreeMap::new(),
            weapons: BTreeMap::new(),
            things: BTreeMap::new(),
            states: BTreeMap::new(),
            sprites: BTreeMap::new(),
            catalog: Vec::new(),
            pointer_slots: None,
            indexed: None,
            keyed: KeyedStrings::default(),
            pars: BTreeMap::new(),
            misc: DehMiscellany::default(),
            open_tables: None,
        }
    }

    /// Append an ammo type
    pub fn ammo(mut self, ammo: DehAmmo) -> Self {
        let index = next_key(&self.ammo);
        self.ammo.insert(index, ammo);
        self
    }

    /// Append a named sound
    pub fn sound<S: Into<String>>(self, name: S, sound: DehSound) -> Self {
        let index = next_key(&self.sounds);
        self.sound_at(index, name, sound)
    }

    /// Place a named sound at an explicit index
    pub fn sound_at<S: Into<String>>(mut self, index: i32, name: S, sound: DehSound) -> Self {
        self.sounds.insert(index, (name.into(), sound));
        self
    }

    /// Append a sprite name
    pub fn sprite<S: Into<String>>(mut self, name: S) -> Self {
        let index = next_key(&self.sprites);
        self.sprites.insert(index, name.into());
        self
    }

    /// Append a weapon
    pub fn weapon(mut self, weapon: DehWeapon) -> Self {
        let index = next_key(&self.weapons);
        self.weapons.insert(index, weapon);
        self
    }

    /// Append a thing
    pub fn thing(self, thing: DehThing) -> Self {
        let index = next_key(&self.things);
        self.thing_at(index, thing)
    }

    /// Place a thing at an explicit index
    pub fn thing_at(mut self, index: i32, thing: DehThing) -> Self {
        self.things.insert(index, thing);
        self
    }

    /// Append a state and the mnemonic of its action, if any
    pub fn state(self, state: DehState, action: Option<&str>) -> Self {
        let index = next_key(&self.states);
        self.state_at(index, state, action)
    }

    /// Place a state at an explicit index
    pub fn state_at(mut self, index: i32, state: DehState, action: Option<&str>) -> Self {
        self.states.insert(index, (state, action.map(str::to_owned)));
        self
    }

    /// Add a pointer to the catalog; a negative frame is inferred from states
    pub fn action_pointer(mut self, pointer: DehActionPointer) -> Self {
        self.catalog.push(pointer);
        self
    }

    /// Use fixed pointer slots hosted by the listed states
    pub fn pointer_slots(mut self, slots: Vec<i32>) -> Self {
        self.pointer_slots = Some(slots);
        self
    }

    /// Use a fixed string table with sound and sprite name sub-ranges
    ///
    /// Takes precedence over keyed strings.
    pub fn indexed_strings(
        mut self,
        values: Vec<String>,
        sound_offset: usize,
        sprite_offset: usize,
        sprite_count: usize,
    ) -> Self {
        self.indexed = Some(IndexedStrings {
            values,
            sound_offset,
            sprite_offset,
            sprite_count,
        });
        self
    }

    /// Add a keyed string
    pub fn keyed_string<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.keyed
            .values
            .insert(key.as_ref().to_ascii_uppercase(), value.into());
        self
    }

    /// Accept any keyed string whose key starts with `prefix`
    pub fn user_string_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.keyed
            .user_prefixes
            .push(prefix.as_ref().to_ascii_uppercase());
        self
    }

    /// Add a par time
    pub fn par(mut self, key: EpisodeMap, seconds: i32) -> Self {
        self.pars.insert(key, seconds);
        self
    }

    /// Set the miscellany record
    pub fn miscellany(mut self, misc: DehMiscellany) -> Self {
        self.misc = misc;
        self
    }

    /// Make the tables open-ended
    pub fn open_tables(mut self, open: OpenTables) -> Self {
        self.open_tables = Some(open);
        self
    }

    /// Validate and freeze the tables
    pub fn build(self) -> Result<SourcePatch> {
        let open = self.open_tables.is_some();
        if !open {
            check_contiguous(&self.name, "sound", &self.sounds)?;
            check_contiguous(&self.name, "thing", &self.things)?;
            check_contiguous(&self.name, "state", &self.states)?;
        }

        let null_pointer = Arc::new(DehActionPointer::new(
            NULL_MNEMONIC,
            ActionPointerType::Doom19,
            false,
            0,
        ));

        // Pointer catalog, with inferred hosting frames
        let mut catalog: BTreeMap<String, Arc<DehActionPointer>> = BTreeMap::new();
        catalog.insert(NULL_MNEMONIC.to_ascii_lowercase(), Arc::clone(&null_pointer));
        for mut pointer in self.catalog {
            if pointer.frame < 0 {
                pointer.frame = self
                    .states
                    .iter()
                    .find(|(_, (_, action))| {
                        action
                            .as_deref()
                            .is_some_and(|a| a.eq_ignore_ascii_case(&pointer.mnemonic))
                    })
                    .map_or(0, |(&index, _)| index);
            }
            catalog.insert(pointer.mnemonic.to_ascii_lowercase(), Arc::new(pointer));
        }

        let mut states = BTreeMap::new();
        let mut state_pointers = BTreeMap::new();
        for (index, (state, action)) in self.states {
            if let Some(mnemonic) = action {
                let pointer = catalog.get(&mnemonic.to_ascii_lowercase()).ok_or_else(|| {
                    Error::baseline(format!(
                        "{}: state {index} uses unknown action pointer {mnemonic}",
                        self.name
                    ))
                })?;
                if !pointer.is_null() {
                    state_pointers.insert(index, Arc::clone(pointer));
                }
            }
            states.insert(index, state);
        }

        for (index, state) in &states {
            let next = state.next_state_index;
            if !states.contains_key(&next) && !(open && next >= 0) {
                return Err(Error::baseline(format!(
                    "{}: state {index} continues to missing state {next}",
                    self.name
                )));
            }
        }

        let (addressing, slot_of_state) = match self.pointer_slots {
            None => (PointerAddressing::PerState, HashMap::new()),
            Some(slots) => {
                let mut slot_of_state = HashMap::with_capacity(slots.len());
                for (slot, &state_index) in slots.iter().enumerate() {
                    if !states.contains_key(&state_index) {
                        return Err(Error::baseline(format!(
                            "{}: pointer slot {slot} is hosted by missing state {state_index}",
                            self.name
                        )));
                    }
                    slot_of_state.insert(state_index, slot as i32);
                }
                if let Some(index) = state_pointers
                    .keys()
                    .find(|index| !slot_of_state.contains_key(*index))
                {
                    return Err(Error::baseline(format!(
                        "{}: state {index} has an action but no pointer slot",
                        self.name
                    )));
                }
                (PointerAddressing::Slots(slots), slot_of_state)
            }
        };

        let strings = match self.indexed {
            Some(table) => BaselineStrings::Indexed(table),
            None => BaselineStrings::Keyed(self.keyed),
        };

        let mut sound_names = BTreeMap::new();
        let mut sounds = BTreeMap::new();
        for (index, (name, sound)) in self.sounds {
            if !name.is_empty() {
                sound_names.insert(index, name.to_ascii_uppercase());
            }
            sounds.insert(index, sound);
        }
        let mut sprite_names: BTreeMap<i32, String> = self
            .sprites
            .into_iter()
            .map(|(i, name)| (i, name.to_ascii_uppercase()))
            .collect();

        // Fixed string tables carry the names themselves
        if let BaselineStrings::Indexed(table) = &strings {
            let sound_end = table.sound_offset + sounds.len();
            let sprite_end = table.sprite_offset + table.sprite_count;
            if sound_end > table.values.len() || sprite_end > table.values.len() {
                return Err(Error::baseline(format!(
                    "{}: name sub-ranges exceed the {} strings of the table",
                    self.name,
                    table.values.len()
                )));
            }
            sound_names = sounds
                .keys()
                .filter_map(|&i| {
                    let name = table.values.get(table.sound_offset + usize::try_from(i).ok()?)?;
                    (!name.is_empty()).then(|| (i, name.to_ascii_uppercase()))
                })
                .collect();
            sprite_names = (0..table.sprite_count)
                .map(|i| (i as i32, table.values[table.sprite_offset + i].to_ascii_uppercase()))
                .collect();
        }

        let sound_lookup = sound_names.iter().map(|(&i, n)| (n.clone(), i)).collect();
        let sprite_lookup = sprite_names.iter().map(|(&i, n)| (n.clone(), i)).collect();

        for (index, thing) in &self.things {
            if let Some((label, target)) = thing
                .labels
                .iter()
                .find(|&(_, target)| !states.contains_key(&target) && !open)
            {
                return Err(Error::baseline(format!(
                    "{}: thing {index} label {label} points at missing state {target}",
                    self.name
                )));
            }
        }

        debug!(
            "Built baseline {}: {} things, {} states, {} sounds, {} sprites",
            self.name,
            self.things.len(),
            states.len(),
            sounds.len(),
            sprite_names.len()
        );

        Ok(SourcePatch {
            name: self.name,
            ammo: self.ammo,
            sounds,
            weapons: self.weapons,
            things: self.things,
            states,
            state_pointers,
            addressing,
            slot_of_state,
            catalog,
            null_pointer,
            sound_names,
            sprite_names,
            sound_lookup,
            sprite_lookup,
            strings,
            pars: self.pars,
            misc: self.misc,
            open_tables: self.open_tables,
            blank_thing: DehThing::default(),
            blank_sound: DehSound::default(),
            blank_state: DehState::default(),
        })
    }
}

fn check_contiguous<T>(name: &str, what: &str, table: &BTreeMap<i32, T>) -> Result<()> {
    match table.keys().enumerate().find(|&(i, &k)| k != i as i32) {
        Some((expected, _)) => Err(Error::baseline(format!(
            "{name}: {what} table has a gap at index {expected}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DehThing;

    fn chain_states(builder: SourcePatchBuilder) -> SourcePatchBuilder {
        builder
            .state(DehState::new(0, 0, false, 0, -1), None)
            .state(DehState::new(0, 0, false, 1, -1), Some("Light0"))
            .state(DehState::new(1, 0, false, 2, 10), Some("Look"))
            .action_pointer(DehActionPointer::new("Light0", ActionPointerType::Doom19, true, -1))
            .action_pointer(DehActionPointer::new("Look", ActionPointerType::Doom19, false, -1))
    }

    #[test]
    fn test_infers_pointer_frames() {
        let patch = chain_states(SourcePatch::builder("t")).build().unwrap();
        assert_eq!(patch.action_pointer_by_mnemonic("look").unwrap().frame, 2);
        assert_eq!(patch.action_pointer(2).unwrap().mnemonic, "Look");
        assert!(patch.action_pointer(0).unwrap().is_null());
        assert_eq!(patch.state_action_pointer_index(1), Some(1));
    }

    #[test]
    fn test_rejects_unknown_pointer() {
        let err = SourcePatch::builder("t")
            .state(DehState::new(0, 0, false, 0, -1), Some("Bogus"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Baseline(_)));
    }

    #[test]
    fn test_rejects_dangling_successor() {
        let err = SourcePatch::builder("t")
            .state(DehState::new(0, 0, false, 7, -1), None)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("missing state 7"));
    }

    #[test]
    fn test_rejects_action_without_slot() {
        let err = chain_states(SourcePatch::builder("t"))
            .pointer_slots(vec![1])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no pointer slot"));
    }

    #[test]
    fn test_open_tables_resolve_blanks() {
        let patch = chain_states(SourcePatch::builder("t"))
            .thing(DehThing::named("Player"))
            .open_tables(OpenTables {
                thing_start: 1,
                sound_start: 1,
                sprite_start: 2,
                state_start: 3,
            })
            .build()
            .unwrap();
        assert_eq!(patch.thing_count(), i32::MAX);
        assert_eq!(patch.thing(5000), Some(&DehThing::default()));
        assert!(patch.thing(-1).is_none());
        assert_eq!(patch.state_action_pointer_index(9000), Some(9000));
    }

    #[test]
    fn test_indexed_strings_provide_names() {
        let patch = SourcePatch::builder("t")
            .sound("", DehSound::default())
            .sound("", DehSound::new(64, false))
            .indexed_strings(
                vec!["".into(), "pistol".into(), "TROO".into(), "SHTG".into()],
                0,
                2,
                2,
            )
            .build()
            .unwrap();
        assert_eq!(patch.sound_index("PISTOL"), Some(1));
        assert_eq!(patch.sprite_index("shtg"), Some(1));
        assert_eq!(patch.sprite_count(), 2);
    }
}
