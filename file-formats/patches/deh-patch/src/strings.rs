//! Per-context string, par time and name tables
//!
//! Three models exist. Doom 1.9 dialects patch a fixed executable string
//! array in place, so replacements may not grow and sound/sprite names are
//! slices of that array. Boom-family dialects set strings by mnemonic and
//! carry par times. DSDHacked and ID24 additionally mint new sound and sprite
//! names on first use.

use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::baseline::{BaselineStrings, EpisodeMap, SourcePatch};
use crate::dialect::StringModel;
use crate::error::{Error, Result};

/// Edits to a fixed string array
#[derive(Debug, Clone)]
pub struct IndexedOverlay {
    enforce_length: bool,
    changed: BTreeMap<usize, String>,
    sound_lookup: HashMap<String, i32>,
    sprite_lookup: HashMap<String, i32>,
}

/// Edits to a key/value string table plus par times
#[derive(Debug, Clone, Default)]
pub struct KeyedOverlay {
    values: BTreeMap<String, String>,
    pars: BTreeMap<EpisodeMap, i32>,
}

/// Sound and sprite names minted past the baseline tables
#[derive(Debug, Clone, Default)]
pub struct DynamicNames {
    sounds: BTreeMap<i32, String>,
    sprites: BTreeMap<i32, String>,
    sound_lookup: HashMap<String, i32>,
    sprite_lookup: HashMap<String, i32>,
    next_sound: i32,
    next_sprite: i32,
}

impl DynamicNames {
    fn new(patch: &SourcePatch) -> Self {
        let counts = patch.fixed_counts();
        let (next_sound, next_sprite) = match patch.open_tables() {
            Some(open) => (open.sound_start, open.sprite_start),
            None => (counts.sounds as i32, counts.sprites as i32),
        };
        Self {
            next_sound,
            next_sprite,
            ..Self::default()
        }
    }

    /// Minted sound names by index
    pub fn sounds(&self) -> &BTreeMap<i32, String> {
        &self.sounds
    }

    /// Minted sprite names by index
    pub fn sprites(&self) -> &BTreeMap<i32, String> {
        &self.sprites
    }
}

fn mint(
    names: &mut BTreeMap<i32, String>,
    lookup: &mut HashMap<String, i32>,
    next: &mut i32,
    name: String,
) -> i32 {
    if let Some(&index) = lookup.get(&name) {
        return index;
    }
    let index = *next;
    *next += 1;
    trace!("Minted name {name} at {index}");
    lookup.insert(name.clone(), index);
    names.insert(index, name);
    index
}

/// String tables of one patch context
#[derive(Debug, Clone)]
pub enum StringTable {
    /// Fixed executable strings
    Indexed(IndexedOverlay),
    /// Mnemonic strings and par times
    Keyed(KeyedOverlay),
    /// Mnemonic strings, par times and minted names
    Dynamic(KeyedOverlay, DynamicNames),
}

impl StringTable {
    /// Create the table a dialect's string model calls for
    pub fn new(model: StringModel, patch: &SourcePatch) -> Self {
        match model {
            StringModel::Indexed { enforce_length } => StringTable::Indexed(IndexedOverlay {
                enforce_length,
                changed: BTreeMap::new(),
                sound_lookup: patch.sound_lookup.clone(),
                sprite_lookup: patch.sprite_lookup.clone(),
            }),
            StringModel::Keyed => StringTable::Keyed(KeyedOverlay::default()),
            StringModel::KeyedDynamicNames => {
                StringTable::Dynamic(KeyedOverlay::default(), DynamicNames::new(patch))
            }
        }
    }

    fn keyed(&self) -> Option<&KeyedOverlay> {
        match self {
            StringTable::Indexed(_) => None,
            StringTable::Keyed(keyed) | StringTable::Dynamic(keyed, _) => Some(keyed),
        }
    }

    fn keyed_mut(&mut self) -> Option<&mut KeyedOverlay> {
        match self {
            StringTable::Indexed(_) => None,
            StringTable::Keyed(keyed) | StringTable::Dynamic(keyed, _) => Some(keyed),
        }
    }

    /// Current indexed string
    pub fn string_at<'a>(&'a self, patch: &'a SourcePatch, index: usize) -> Option<&'a str> {
        match self {
            StringTable::Indexed(overlay) => overlay
                .changed
                .get(&index)
                .map(String::as_str)
                .or_else(|| patch.string_at(index)),
            _ => None,
        }
    }

    /// Replace an indexed string
    ///
    /// Longer replacements are refused when the dialect enforces the
    /// original length. Rewriting a sound or sprite name slice keeps the
    /// name lookups in step.
    pub fn set_string_at(&mut self, patch: &SourcePatch, index: usize, value: &str) -> Result<()> {
        let (StringTable::Indexed(overlay), BaselineStrings::Indexed(table)) =
            (self, patch.strings())
        else {
            return Err(Error::invalid_argument(
                "indexed strings are not available in this dialect",
            ));
        };

        let original = table.values.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "string index {index} is out of range (count {})",
                table.values.len()
            ))
        })?;
        if overlay.enforce_length && value.len() > original.len() {
            return Err(Error::invalid_argument(format!(
                "string {index} may be at most {} characters, got {}",
                original.len(),
                value.len()
            )));
        }

        let previous = overlay
            .changed
            .get(&index)
            .unwrap_or(original)
            .to_ascii_uppercase();
        let sound_end = table.sound_offset + patch.fixed_counts().sounds;
        let sprite_end = table.sprite_offset + table.sprite_count;
        let name = value.to_ascii_uppercase();
        if (table.sound_offset..sound_end).contains(&index) {
            let sound = (index - table.sound_offset) as i32;
            relink(&mut overlay.sound_lookup, &previous, name, sound);
        } else if (table.sprite_offset..sprite_end).contains(&index) {
            let sprite = (index - table.sprite_offset) as i32;
            relink(&mut overlay.sprite_lookup, &previous, name, sprite);
        }

        if value == original {
            overlay.changed.remove(&index);
        } else {
            overlay.changed.insert(index, value.to_string());
        }
        Ok(())
    }

    /// Changed indexed strings as `(index, original, replacement)`
    pub fn changed_strings<'a>(
        &'a self,
        patch: &'a SourcePatch,
    ) -> impl Iterator<Item = (usize, &'a str, &'a str)> + 'a {
        let changed = match self {
            StringTable::Indexed(overlay) => Some(&overlay.changed),
            _ => None,
        };
        changed.into_iter().flatten().filter_map(|(&index, value)| {
            patch
                .string_at(index)
                .map(|original| (index, original, value.as_str()))
        })
    }

    /// Current keyed string, falling back to the baseline
    pub fn string<'a>(&'a self, patch: &'a SourcePatch, key: &str) -> Option<&'a str> {
        let keyed = self.keyed()?;
        keyed
            .values
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
            .or_else(|| patch.string(key))
    }

    /// Set a keyed string; the key must be known to the baseline
    pub fn set_string(&mut self, patch: &SourcePatch, key: &str, value: &str) -> Result<()> {
        let BaselineStrings::Keyed(table) = patch.strings() else {
            return Err(Error::invalid_argument(
                "keyed strings are not available in this dialect",
            ));
        };
        if !table.is_valid_key(key) {
            return Err(Error::invalid_argument(format!("unknown string key: {key}")));
        }
        let keyed = self
            .keyed_mut()
            .ok_or_else(|| Error::invalid_argument("keyed strings are not available"))?;
        keyed
            .values
            .insert(key.to_ascii_uppercase(), value.to_string());
        Ok(())
    }

    /// Keyed strings whose value differs from the baseline
    pub fn changed_keyed_strings<'a>(
        &'a self,
        patch: &'a SourcePatch,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.keyed()
            .into_iter()
            .flat_map(|keyed| keyed.values.iter())
            .filter(|&(key, value)| patch.string(key) != Some(value.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Current par time, falling back to the baseline
    pub fn par_time(&self, patch: &SourcePatch, key: EpisodeMap) -> Option<i32> {
        let keyed = self.keyed()?;
        keyed
            .pars
            .get(&key)
            .copied()
            .or_else(|| patch.par_time(key))
    }

    /// Set a par time
    pub fn set_par_time(&mut self, key: EpisodeMap, seconds: i32) -> Result<()> {
        if seconds < 0 {
            return Err(Error::invalid_argument(format!(
                "par time for {key} must not be negative"
            )));
        }
        let keyed = self
            .keyed_mut()
            .ok_or_else(|| Error::invalid_argument("par times are not available in this dialect"))?;
        keyed.pars.insert(key, seconds);
        Ok(())
    }

    /// Par times differing from the baseline
    pub fn changed_par_times<'a>(
        &'a self,
        patch: &'a SourcePatch,
    ) -> impl Iterator<Item = (EpisodeMap, i32)> + 'a {
        self.keyed()
            .into_iter()
            .flat_map(|keyed| keyed.pars.iter())
            .filter(|&(key, &seconds)| patch.par_time(*key) != Some(seconds))
            .map(|(&key, &seconds)| (key, seconds))
    }

    /// Sound index by name, minting one when the dialect allows it
    pub fn sound_index(&mut self, patch: &SourcePatch, name: &str) -> Option<i32> {
        let name = name.to_ascii_uppercase();
        match self {
            StringTable::Indexed(overlay) => overlay.sound_lookup.get(&name).copied(),
            StringTable::Keyed(_) => patch.sound_index(&name),
            StringTable::Dynamic(_, names) => patch.sound_index(&name).or_else(|| {
                (!name.is_empty()).then(|| {
                    let index = mint(
                        &mut names.sounds,
                        &mut names.sound_lookup,
                        &mut names.next_sound,
                        name,
                    );
                    debug!("Sound index {index} allocated");
                    index
                })
            }),
        }
    }

    /// Sprite index by name, minting one when the dialect allows it
    pub fn sprite_index(&mut self, patch: &SourcePatch, name: &str) -> Option<i32> {
        let name = name.to_ascii_uppercase();
        match self {
            StringTable::Indexed(overlay) => overlay.sprite_lookup.get(&name).copied(),
            StringTable::Keyed(_) => patch.sprite_index(&name),
            StringTable::Dynamic(_, names) => patch.sprite_index(&name).or_else(|| {
                (!name.is_empty()).then(|| {
                    let index = mint(
                        &mut names.sprites,
                        &mut names.sprite_lookup,
                        &mut names.next_sprite,
                        name,
                    );
                    debug!("Sprite index {index} allocated");
                    index
                })
            }),
        }
    }

    /// Minted names, for dialects that mint them
    pub fn dynamic_names(&self) -> Option<&DynamicNames> {
        match self {
            StringTable::Dynamic(_, names) => Some(names),
            _ => None,
        }
    }
}

fn relink(lookup: &mut HashMap<String, i32>, previous: &str, name: String, index: i32) {
    if lookup.get(previous) == Some(&index) {
        lookup.remove(previous);
    }
    if !name.is_empty() {
        lookup.insert(name, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DehSound;

    fn indexed_patch() -> SourcePatch {
        SourcePatch::builder("doom19")
            .sound("", DehSound::default())
            .sound("", DehSound::new(64, false))
            .indexed_strings(
                vec![
                    "".into(),
                    "pistol".into(),
                    "TROO".into(),
                    "SHTG".into(),
                    "OK".into(),
                ],
                0,
                2,
                2,
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_overlong_string_rejected() {
        let patch = indexed_patch();
        let mut table = StringTable::new(StringModel::Indexed { enforce_length: true }, &patch);
        let err = table.set_string_at(&patch, 4, "TOOLONGVALUE").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(table.string_at(&patch, 4), Some("OK"));
        assert_eq!(table.changed_strings(&patch).count(), 0);
    }

    #[test]
    fn test_unchecked_length() {
        let patch = indexed_patch();
        let mut table = StringTable::new(StringModel::Indexed { enforce_length: false }, &patch);
        table.set_string_at(&patch, 4, "TOOLONGVALUE").unwrap();
        assert_eq!(table.string_at(&patch, 4), Some("TOOLONGVALUE"));
    }

    #[test]
    fn test_renamed_sound_updates_lookup() {
        let patch = indexed_patch();
        let mut table = StringTable::new(StringModel::Indexed { enforce_length: true }, &patch);
        table.set_string_at(&patch, 1, "shotg").unwrap();
        assert_eq!(table.sound_index(&patch, "SHOTG"), Some(1));
        assert_eq!(table.sound_index(&patch, "pistol"), None);

        table.set_string_at(&patch, 3, "PLAY").unwrap();
        assert_eq!(table.sprite_index(&patch, "play"), Some(1));
        assert_eq!(table.sprite_index(&patch, "SHTG"), None);
    }

    #[test]
    fn test_keyed_fallback_and_validation() {
        let patch = SourcePatch::builder("boom")
            .keyed_string("GOTARMOR", "Picked up the armor.")
            .user_string_prefix("USER_")
            .build()
            .unwrap();
        let mut table = StringTable::new(StringModel::Keyed, &patch);
        assert_eq!(table.string(&patch, "gotarmor"), Some("Picked up the armor."));
        assert!(table.set_string(&patch, "NOSUCHKEY", "x").is_err());
        table.set_string(&patch, "user_hello", "Hi").unwrap();
        table.set_string(&patch, "GOTARMOR", "Picked up the armor.").unwrap();

        let changed: Vec<_> = table.changed_keyed_strings(&patch).collect();
        assert_eq!(changed, vec![("USER_HELLO", "Hi")]);
    }

    #[test]
    fn test_minting_is_idempotent() {
        let patch = SourcePatch::builder("dsdhacked")
            .sound("", DehSound::default())
            .sound("pistol", DehSound::default())
            .build()
            .unwrap();
        let mut table = StringTable::new(StringModel::KeyedDynamicNames, &patch);
        let first = table.sound_index(&patch, "NEWSND").unwrap();
        assert_eq!(first, 2);
        assert_eq!(table.sound_index(&patch, "newsnd"), Some(first));
        assert_eq!(table.sound_index(&patch, "PISTOL"), Some(1));
        assert_eq!(table.sound_index(&patch, "OTHER"), Some(3));
    }
}
