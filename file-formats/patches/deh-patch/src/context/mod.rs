//! Mutable patch overlay over an immutable baseline
//!
//! A [`PatchContext`] is created once per compilation. Entities are
//! shadow-copied from the baseline the first time they are requested; the
//! key set of each shadow table is the set of indices the writer diffs.
//!
//! # Examples
//!
//! ```no_run
//! use deh_patch::{BaselineSet, ContextOptions, Dialect, PatchContext};
//!
//! # fn main() -> Result<(), deh_patch::Error> {
//! let mut baselines = BaselineSet::from_dir("baselines");
//! let mut ctx = PatchContext::new(
//!     Dialect::Mbf21,
//!     baselines.get(Dialect::Mbf21)?,
//!     ContextOptions::default(),
//! );
//!
//! if let Some(imp) = ctx.thing(12) {
//!     imp.health = 120;
//! }
//! let freed = ctx.free_thing_states(12)?;
//! println!("{freed} states available");
//!
//! let mut out = Vec::new();
//! ctx.write_patch(&mut out, "Tougher imps")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use log::{debug, trace};

use crate::baseline::{EpisodeMap, SourcePatch};
use crate::dialect::{Dialect, DialectProfile};
use crate::entity::{
    CustomBitflag, CustomProperty, DehActionPointer, DehAmmo, DehMiscellany, DehSound, DehState,
    DehThing, DehWeapon, EntityKind,
};
use crate::error::{Error, Result};
use crate::feature::{ActionPointerType, FeatureLevel};
use crate::range_map::RangeBoolMap;
use crate::strings::StringTable;

mod allocator;
mod names;
mod options;
mod registry;

pub use allocator::Actor;
pub use names::NameMap;
pub use options::ContextOptions;

/// Mutable overlay of one compilation
#[derive(Debug, Clone)]
pub struct PatchContext {
    pub(crate) dialect: Dialect,
    pub(crate) profile: DialectProfile,
    pub(crate) baseline: Arc<SourcePatch>,

    pub(crate) ammo: BTreeMap<i32, DehAmmo>,
    pub(crate) sounds: BTreeMap<i32, DehSound>,
    pub(crate) weapons: BTreeMap<i32, DehWeapon>,
    pub(crate) things: BTreeMap<i32, DehThing>,
    pub(crate) states: BTreeMap<i32, DehState>,
    /// Pointer slot -> pointer; empty slots hold the shared `NULL` record
    pub(crate) pointers: BTreeMap<i32, Arc<DehActionPointer>>,
    pub(crate) misc: DehMiscellany,
    pub(crate) strings: StringTable,

    free_states: RangeBoolMap,
    protected_states: RangeBoolMap,
    /// Every state ever freed; never cleared
    already_free_states: RangeBoolMap,
    state_safety: bool,
    free_state_count: u64,
    free_pointer_state_count: u64,

    free_things: RangeBoolMap,
    free_weapons: RangeBoolMap,
    free_ammo: RangeBoolMap,

    pointer_mnemonics: NameMap<Arc<DehActionPointer>>,
    thing_aliases: NameMap<i32>,
    weapon_aliases: NameMap<i32>,
    ammo_aliases: NameMap<i32>,
    thing_templates: NameMap<DehThing>,
    weapon_templates: NameMap<DehWeapon>,
    ammo_templates: NameMap<DehAmmo>,
    sound_templates: NameMap<DehSound>,
    global_states: NameMap<i32>,
    custom_properties: BTreeMap<EntityKind, NameMap<CustomProperty>>,
    custom_bitflags: BTreeMap<EntityKind, NameMap<CustomBitflag>>,
}

fn index_domain(count: i32) -> RangeBoolMap {
    RangeBoolMap::new(0, i64::from(count) - 1)
}

fn shadow<'a, T: Clone>(
    kind: EntityKind,
    table: &'a mut BTreeMap<i32, T>,
    index: i32,
    source: Option<&T>,
) -> Option<&'a mut T> {
    match table.entry(index) {
        Entry::Occupied(entry) => Some(entry.into_mut()),
        Entry::Vacant(entry) => source.map(|original| {
            trace!("Shadowing {kind} {index}");
            entry.insert(original.clone())
        }),
    }
}

impl PatchContext {
    /// Create a context for a dialect over its baseline
    ///
    /// States `0` and `1` are protected, as are any listed in `options`.
    pub fn new(dialect: Dialect, baseline: Arc<SourcePatch>, options: ContextOptions) -> Self {
        let profile = dialect.profile();
        let state_count = baseline.state_count();

        let mut ctx = Self {
            dialect,
            profile,
            ammo: BTreeMap::new(),
            sounds: BTreeMap::new(),
            weapons: BTreeMap::new(),
            things: BTreeMap::new(),
            states: BTreeMap::new(),
            pointers: BTreeMap::new(),
            misc: baseline.miscellany().clone(),
            strings: StringTable::new(profile.strings, &baseline),
            free_states: index_domain(state_count),
            protected_states: index_domain(state_count),
            already_free_states: index_domain(state_count),
            state_safety: options.state_safety,
            free_state_count: 0,
            free_pointer_state_count: 0,
            free_things: index_domain(baseline.thing_count()),
            free_weapons: index_domain(baseline.weapon_count()),
            free_ammo: index_domain(baseline.ammo_count()),
            pointer_mnemonics: NameMap::new(),
            thing_aliases: NameMap::new(),
            weapon_aliases: NameMap::new(),
            ammo_aliases: NameMap::new(),
            thing_templates: NameMap::new(),
            weapon_templates: NameMap::new(),
            ammo_templates: NameMap::new(),
            sound_templates: NameMap::new(),
            global_states: NameMap::new(),
            custom_properties: BTreeMap::new(),
            custom_bitflags: BTreeMap::new(),
            baseline,
        };

        // NULL state and the gunflash Light0 state
        ctx.protected_states.set_range(0, 1, true);
        for index in options.extra_protected_states {
            ctx.protected_states.set(i64::from(index), true);
        }

        debug!(
            "Created {} context over baseline {} ({} states)",
            dialect,
            ctx.baseline.name(),
            state_count
        );
        ctx
    }

    /// Target dialect
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Shared baseline
    pub fn baseline(&self) -> &Arc<SourcePatch> {
        &self.baseline
    }

    /// Value of the `Doom version` header line
    pub fn version(&self) -> i32 {
        self.profile.doom_version
    }

    /// Highest feature tier of the dialect
    pub fn supported_feature_level(&self) -> FeatureLevel {
        self.profile.feature_level
    }

    /// Highest action-pointer vocabulary of the dialect
    pub fn supported_action_pointer_type(&self) -> ActionPointerType {
        self.profile.pointer_type
    }

    /// Whether the dialect supports a feature tier
    pub fn supports_feature(&self, level: FeatureLevel) -> bool {
        self.profile.feature_level.supports(level)
    }

    /// Whether the dialect supports an action-pointer vocabulary
    pub fn supports_pointer_type(&self, kind: ActionPointerType) -> bool {
        self.profile.pointer_type.supports(kind)
    }

    /// Enforce `0 <= index < count`; ID24 drops only the upper bound
    pub fn check_index_range(&self, kind: EntityKind, index: i32, count: i32) -> Result<()> {
        let in_range = if self.supports_feature(FeatureLevel::Id24) {
            index >= 0
        } else {
            (0..count).contains(&index)
        };
        if in_range {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds { kind, index, count })
        }
    }

    pub(crate) fn require(&self, level: FeatureLevel, operation: &str) -> Result<()> {
        if self.supports_feature(level) {
            Ok(())
        } else {
            Err(Error::unsupported(self.dialect.to_string(), operation))
        }
    }

    /// Number of ammo types
    pub fn ammo_count(&self) -> i32 {
        self.baseline.ammo_count()
    }

    /// Number of sounds
    pub fn sound_count(&self) -> i32 {
        self.baseline.sound_count()
    }

    /// Number of weapons
    pub fn weapon_count(&self) -> i32 {
        self.baseline.weapon_count()
    }

    /// Number of things
    pub fn thing_count(&self) -> i32 {
        self.baseline.thing_count()
    }

    /// Number of states
    pub fn state_count(&self) -> i32 {
        self.baseline.state_count()
    }

    /// Number of action pointer slots
    pub fn action_pointer_count(&self) -> i32 {
        self.baseline.action_pointer_count()
    }

    /// Ammo type for editing, shadow-copied on first access
    pub fn ammo(&mut self, index: i32) -> Option<&mut DehAmmo> {
        shadow(EntityKind::Ammo, &mut self.ammo, index, self.baseline.ammo(index))
    }

    /// Sound for editing, shadow-copied on first access
    pub fn sound(&mut self, index: i32) -> Option<&mut DehSound> {
        shadow(EntityKind::Sound, &mut self.sounds, index, self.baseline.sound(index))
    }

    /// Weapon for editing, shadow-copied on first access
    pub fn weapon(&mut self, index: i32) -> Option<&mut DehWeapon> {
        shadow(EntityKind::Weapon, &mut self.weapons, index, self.baseline.weapon(index))
    }

    /// Thing for editing, shadow-copied on first access
    pub fn thing(&mut self, index: i32) -> Option<&mut DehThing> {
        shadow(EntityKind::Thing, &mut self.things, index, self.baseline.thing(index))
    }

    /// State for editing, shadow-copied on first access
    pub fn state(&mut self, index: i32) -> Option<&mut DehState> {
        shadow(EntityKind::State, &mut self.states, index, self.baseline.state(index))
    }

    /// Current ammo type without shadowing it
    pub fn peek_ammo(&self, index: i32) -> Option<&DehAmmo> {
        self.ammo.get(&index).or_else(|| self.baseline.ammo(index))
    }

    /// Current sound without shadowing it
    pub fn peek_sound(&self, index: i32) -> Option<&DehSound> {
        self.sounds.get(&index).or_else(|| self.baseline.sound(index))
    }

    /// Current weapon without shadowing it
    pub fn peek_weapon(&self, index: i32) -> Option<&DehWeapon> {
        self.weapons.get(&index).or_else(|| self.baseline.weapon(index))
    }

    /// Current thing without shadowing it
    pub fn peek_thing(&self, index: i32) -> Option<&DehThing> {
        self.things.get(&index).or_else(|| self.baseline.thing(index))
    }

    /// Current state without shadowing it
    pub fn peek_state(&self, index: i32) -> Option<&DehState> {
        self.states.get(&index).or_else(|| self.baseline.state(index))
    }

    /// Miscellany record for editing
    pub fn miscellany(&mut self) -> &mut DehMiscellany {
        &mut self.misc
    }

    /// Current miscellany record
    pub fn peek_miscellany(&self) -> &DehMiscellany {
        &self.misc
    }

    /// Touched ammo indices
    pub fn used_ammo_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.ammo.keys().copied()
    }

    /// Touched sound indices
    pub fn used_sound_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.sounds.keys().copied()
    }

    /// Touched weapon indices
    pub fn used_weapon_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.weapons.keys().copied()
    }

    /// Touched thing indices
    pub fn used_thing_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.things.keys().copied()
    }

    /// Touched state indices
    pub fn used_state_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.states.keys().copied()
    }

    /// Touched action pointer slots
    pub fn used_action_pointer_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.pointers.keys().copied()
    }

    /// Pointer slot of a state, if it has one
    pub fn state_action_pointer_index(&self, state_index: i32) -> Option<i32> {
        self.baseline.state_action_pointer_index(state_index)
    }

    /// Pointer in a slot, recorded as used; `None` for a missing slot
    ///
    /// Pointers are shared records and are not deep-copied.
    pub fn action_pointer(&mut self, index: i32) -> Option<Arc<DehActionPointer>> {
        match self.pointers.entry(index) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let pointer = self.baseline.action_pointer(index)?;
                Some(Arc::clone(entry.insert(pointer)))
            }
        }
    }

    /// Pointer in a slot without recording it
    pub fn peek_action_pointer(&self, index: i32) -> Option<Arc<DehActionPointer>> {
        self.pointers
            .get(&index)
            .cloned()
            .or_else(|| self.baseline.action_pointer(index))
    }

    /// Replace the pointer in a slot
    pub fn set_action_pointer(&mut self, index: i32, pointer: Arc<DehActionPointer>) -> Result<()> {
        if self.baseline.action_pointer_state_index(index).is_none() {
            return Err(Error::IndexOutOfBounds {
                kind: EntityKind::State,
                index,
                count: self.action_pointer_count(),
            });
        }
        if !self.supports_pointer_type(pointer.kind) {
            return Err(Error::unsupported(
                self.dialect.to_string(),
                format!("{} pointer {}", pointer.kind, pointer.mnemonic),
            ));
        }
        trace!("Pointer slot {index} = {}", pointer.mnemonic);
        self.pointers.insert(index, pointer);
        Ok(())
    }

    /// Current pointer of a state; `None` when the state has no slot
    pub fn state_action_pointer(&self, state_index: i32) -> Option<Arc<DehActionPointer>> {
        self.state_action_pointer_index(state_index)
            .and_then(|slot| self.peek_action_pointer(slot))
    }

    /// Replace the pointer of a state through its slot
    pub fn set_state_action_pointer(
        &mut self,
        state_index: i32,
        pointer: Arc<DehActionPointer>,
    ) -> Result<()> {
        let slot = self.state_action_pointer_index(state_index).ok_or_else(|| {
            Error::invalid_argument(format!("state {state_index} has no action pointer slot"))
        })?;
        self.set_action_pointer(slot, pointer)
    }

    /// Indexed string (Doom 1.9 dialects)
    pub fn string_at(&self, index: usize) -> Option<&str> {
        self.strings.string_at(&self.baseline, index)
    }

    /// Replace an indexed string (Doom 1.9 dialects)
    pub fn set_string_at(&mut self, index: usize, value: &str) -> Result<()> {
        self.strings.set_string_at(&self.baseline, index, value)
    }

    /// Keyed string (Boom and later)
    pub fn string(&self, key: &str) -> Option<&str> {
        self.strings.string(&self.baseline, key)
    }

    /// Set a keyed string (Boom and later)
    pub fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.strings.set_string(&self.baseline, key, value)
    }

    /// Par time in seconds (Boom and later)
    pub fn par_time(&self, key: EpisodeMap) -> Option<i32> {
        self.strings.par_time(&self.baseline, key)
    }

    /// Set a par time (Boom and later)
    pub fn set_par_time(&mut self, key: EpisodeMap, seconds: i32) -> Result<()> {
        self.strings.set_par_time(key, seconds)
    }

    /// Sound index by name; DSDHacked and later mint unknown names
    pub fn sound_index(&mut self, name: &str) -> Option<i32> {
        self.strings.sound_index(&self.baseline, name)
    }

    /// Sprite index by name; DSDHacked and later mint unknown names
    pub fn sprite_index(&mut self, name: &str) -> Option<i32> {
        self.strings.sprite_index(&self.baseline, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DehObject;

    fn small_patch() -> Arc<SourcePatch> {
        Arc::new(
            SourcePatch::builder("doom19")
                .thing(DehThing::named("Player"))
                .state(DehState::new(0, 0, false, 0, -1), None)
                .state(DehState::new(0, 0, false, 0, -1), None)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_shadow_identity() {
        let mut ctx = PatchContext::new(Dialect::Doom19, small_patch(), ContextOptions::default());
        let first: *const DehThing = ctx.thing(0).unwrap();
        let second: *const DehThing = ctx.thing(0).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.peek_thing(0), ctx.baseline().thing(0));
        assert_eq!(ctx.used_thing_indices().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_missing_index_is_none() {
        let mut ctx = PatchContext::new(Dialect::Doom19, small_patch(), ContextOptions::default());
        assert!(ctx.thing(9).is_none());
        assert_eq!(ctx.used_thing_indices().count(), 0);
    }

    #[test]
    fn test_bounds_lifted_at_id24() {
        let patch = small_patch();
        let doom = PatchContext::new(Dialect::Doom19, Arc::clone(&patch), ContextOptions::default());
        assert!(matches!(
            doom.check_index_range(EntityKind::State, 2, 2),
            Err(Error::IndexOutOfBounds { index: 2, count: 2, .. })
        ));
        let id24 = PatchContext::new(Dialect::Id24, patch, ContextOptions::default());
        assert!(id24.check_index_range(EntityKind::State, 5000, 2).is_ok());
        assert!(matches!(
            id24.check_index_range(EntityKind::State, -1, 2),
            Err(Error::IndexOutOfBounds { index: -1, .. })
        ));
    }

    #[test]
    fn test_pointer_type_gate() {
        let mut ctx = PatchContext::new(Dialect::Doom19, small_patch(), ContextOptions::default());
        let mbf21 = Arc::new(DehActionPointer::new(
            "SpawnObject",
            ActionPointerType::Mbf21,
            false,
            0,
        ));
        assert!(matches!(
            ctx.set_action_pointer(1, mbf21),
            Err(Error::Unsupported { .. })
        ));
        assert!(ctx.action_pointer(1).unwrap().is_null());
    }

    #[test]
    fn test_miscellany_starts_at_baseline() {
        let mut ctx = PatchContext::new(Dialect::Boom, small_patch(), ContextOptions::default());
        assert_eq!(ctx.peek_miscellany(), ctx.baseline().miscellany());
        ctx.miscellany().initial_health = 150;
        assert!(!ctx.peek_miscellany().is_force_output());
        assert_ne!(ctx.peek_miscellany(), ctx.baseline().miscellany());
    }
}
