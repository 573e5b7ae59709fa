//! State, thing, weapon and ammo slot allocation
//!
//! States are either protected, free, or in use. Only free, unprotected
//! states can be filled. Animation sequences are chains of states linked by
//! their successor index; the connected-state walks below free, transform
//! or copy whole chains starting from a label.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::baseline::PointerAddressing;
use crate::dialect::FreeStateAccounting;
use crate::entity::{DehActionPointer, DehObject, DehState, EntityKind, StateLabels};
use crate::error::{Error, Result};
use crate::range_map::RangeBoolMap;

use super::PatchContext;

/// An entity whose labels point into the state table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// Thing at an index
    Thing(i32),
    /// Weapon at an index
    Weapon(i32),
}

/// Circular search of `[0, count)` starting at `start`
fn search_free(
    map: &RangeBoolMap,
    start: i32,
    count: i32,
    mut accept: impl FnMut(i32) -> bool,
) -> Option<i32> {
    let count = i64::from(count).min(map.max_index() + 1);
    let start = if (0..count).contains(&i64::from(start)) {
        i64::from(start)
    } else {
        0
    };
    map.iter_true(start, count)
        .chain(map.iter_true(0, start))
        .filter_map(|index| i32::try_from(index).ok())
        .find(|&index| accept(index))
}

impl PatchContext {
    /// Number of free states
    pub fn free_state_count(&self) -> u64 {
        match self.profile.accounting {
            FreeStateAccounting::Counted => self.free_state_count,
            FreeStateAccounting::Bitset => self.free_states.index_width(true),
        }
    }

    /// Number of free states that own an action pointer slot
    pub fn free_pointer_state_count(&self) -> u64 {
        match self.profile.accounting {
            FreeStateAccounting::Counted => self.free_pointer_state_count,
            FreeStateAccounting::Bitset => self.free_states.index_width(true),
        }
    }

    /// Whether a state is marked free
    pub fn is_free_state(&self, index: i32) -> bool {
        self.free_states.get_or_default(i64::from(index), false)
    }

    /// Whether a state is protected
    pub fn is_protected_state(&self, index: i32) -> bool {
        self.protected_states.get_or_default(i64::from(index), false)
    }

    /// Whether a state may be filled: free and not protected
    pub fn is_fillable_state(&self, index: i32) -> bool {
        self.is_free_state(index) && !self.is_protected_state(index)
    }

    /// Whether the double-free safety switch is on
    pub fn state_safety(&self) -> bool {
        self.state_safety
    }

    /// Turn the double-free safety switch on or off
    ///
    /// Freed-state history is kept while the switch is off, so turning it
    /// back on still catches states freed in between.
    pub fn set_state_safety(&mut self, enabled: bool) {
        self.state_safety = enabled;
    }

    /// Protect or unprotect a state
    pub fn set_protected_state(&mut self, index: i32, protected: bool) -> Result<()> {
        self.check_index_range(EntityKind::State, index, self.state_count())?;
        self.protected_states.set(i64::from(index), protected);
        Ok(())
    }

    /// Protect or unprotect an inclusive range of states
    pub fn set_protected_state_range(&mut self, min: i32, max: i32, protected: bool) -> Result<()> {
        let count = self.state_count();
        self.check_index_range(EntityKind::State, min, count)?;
        self.check_index_range(EntityKind::State, max, count)?;
        self.protected_states
            .set_range(i64::from(min), i64::from(max), protected);
        Ok(())
    }

    fn check_free_allowed(&self, index: i32, free: bool) -> Result<()> {
        if self.is_protected_state(index) {
            warn!("Refused to change protected state {index}");
            return Err(Error::illegal_mutation(format!(
                "state {index} is a protected state"
            )));
        }
        if free
            && self.state_safety
            && self
                .already_free_states
                .get_or_default(i64::from(index), false)
        {
            warn!("Refused to free state {index} a second time");
            return Err(Error::illegal_mutation(format!(
                "state {index} was already freed once"
            )));
        }
        Ok(())
    }

    /// Mark a state free or in use
    ///
    /// Protected states are refused, as are states freed before while the
    /// safety switch is on.
    pub fn set_free_state(&mut self, index: i32, free: bool) -> Result<()> {
        self.check_index_range(EntityKind::State, index, self.state_count())?;
        self.check_free_allowed(index, free)?;

        let key = i64::from(index);
        let previous = self.free_states.get(key);
        self.free_states.set(key, free);
        if free {
            self.already_free_states.set(key, true);
        }

        if previous != free {
            let has_slot = self.state_action_pointer_index(index).is_some();
            if free {
                self.free_state_count += 1;
                if has_slot {
                    self.free_pointer_state_count += 1;
                }
            } else {
                self.free_state_count = self.free_state_count.saturating_sub(1);
                if has_slot {
                    self.free_pointer_state_count = self.free_pointer_state_count.saturating_sub(1);
                }
            }
            trace!("State {index} free = {free}");
        }
        Ok(())
    }

    /// Mark an inclusive range of states free or in use
    ///
    /// Counted dialects apply index by index and stop at the first refusal,
    /// leaving earlier indices changed. Bitset dialects check the whole range
    /// first and change nothing on refusal.
    pub fn set_free_state_range(&mut self, min: i32, max: i32, free: bool) -> Result<()> {
        let count = self.state_count();
        self.check_index_range(EntityKind::State, min, count)?;
        self.check_index_range(EntityKind::State, max, count)?;
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };

        match self.profile.accounting {
            FreeStateAccounting::Counted => {
                for index in lo..=hi {
                    self.set_free_state(index, free)?;
                }
            }
            FreeStateAccounting::Bitset => {
                let (lo, hi) = (i64::from(lo), i64::from(hi));
                if self.protected_states.value_set(lo, hi).contains(&true) {
                    return Err(Error::illegal_mutation(format!(
                        "state range {lo} to {hi} contains a protected state"
                    )));
                }
                if free
                    && self.state_safety
                    && self.already_free_states.value_set(lo, hi).contains(&true)
                {
                    return Err(Error::illegal_mutation(format!(
                        "state range {lo} to {hi} contains a state that was already freed"
                    )));
                }
                self.free_states.set_range(lo, hi, free);
                if free {
                    self.already_free_states.set_range(lo, hi, true);
                }
            }
        }
        debug!("States {lo} to {hi} free = {free}");
        Ok(())
    }

    /// Next fillable state at or after `start`, wrapping once
    pub fn find_next_free_state(&self, start: i32) -> Option<i32> {
        search_free(&self.free_states, start, self.state_count(), |i| {
            !self.is_protected_state(i)
        })
    }

    /// Next fillable state that owns an action pointer slot
    pub fn find_next_free_action_pointer_state(&self, start: i32) -> Option<i32> {
        search_free(&self.free_states, start, self.state_count(), |i| {
            !self.is_protected_state(i) && self.state_action_pointer_index(i).is_some()
        })
    }

    /// Next fillable state without an action pointer slot
    pub fn find_next_free_non_action_pointer_state(&self, start: i32) -> Option<i32> {
        search_free(&self.free_states, start, self.state_count(), |i| {
            !self.is_protected_state(i) && self.state_action_pointer_index(i).is_none()
        })
    }

    /// Free every state of the chain starting at `start`
    ///
    /// Stops at the first protected or already free state, which also ends
    /// looping chains. Returns how many states were freed.
    pub fn free_connected_states(&mut self, start: i32) -> Result<usize> {
        let mut index = start;
        let mut freed = 0;
        while !self.is_protected_state(index) && !self.is_free_state(index) {
            let Some(next) = self.peek_state(index).map(|state| state.next_state_index) else {
                break;
            };
            self.set_free_state(index, true)?;
            freed += 1;
            index = next;
        }
        trace!("Freed {freed} connected states from {start}");
        Ok(freed)
    }

    /// Apply `transform` to every state of the chain starting at `start`
    ///
    /// Stops at protected states, at state `0`, and at states already in
    /// `visited`, which is shared across calls so converging chains are only
    /// visited once.
    pub fn transform_connected_states<F>(
        &mut self,
        start: i32,
        visited: &mut BTreeSet<i32>,
        mut transform: F,
    ) -> usize
    where
        F: FnMut(i32, &mut DehState),
    {
        let mut index = start;
        let mut count = 0;
        while index != 0 && !self.is_protected_state(index) && !visited.contains(&index) {
            let Some(state) = self.state(index) else {
                break;
            };
            transform(index, state);
            let next = state.next_state_index;
            visited.insert(index);
            count += 1;
            index = next;
        }
        count
    }

    /// Copy the chain starting at `start` into free states
    ///
    /// Every visited state is copied, with its action pointer, into the next
    /// fillable state found from `search_start`, and `old -> new` is recorded
    /// in `remap`. Returns `Ok(None)` when free states run out; the entries
    /// already copied stay in `remap`. Successors still point at the old
    /// chain until [`remap_copied_states`](Self::remap_copied_states) runs.
    ///
    /// Under fixed pointer slots (the Doom 1.9 family) a state with a
    /// non-NULL pointer only lands in a free state that has a slot, so the
    /// copy can run out while slotless free states remain.
    pub fn copy_connected_states(
        &mut self,
        start: i32,
        search_start: i32,
        copied: &mut BTreeSet<i32>,
        remap: &mut BTreeMap<i32, i32>,
    ) -> Result<Option<usize>> {
        let fixed_slots = matches!(self.baseline.addressing(), PointerAddressing::Slots(_));
        let mut index = start;
        let mut count = 0;

        while index != 0 && !self.is_protected_state(index) && !copied.contains(&index) {
            let Some(source) = self.peek_state(index).cloned() else {
                break;
            };
            let pointer = self.state_action_pointer(index);
            let needs_slot = fixed_slots && pointer.as_ref().is_some_and(|p| !p.is_null());

            let target = if needs_slot {
                self.find_next_free_action_pointer_state(search_start)
            } else {
                self.find_next_free_state(search_start)
            };
            let Some(target) = target else {
                warn!(
                    "Ran out of free states copying chain from {start} ({count} copied)"
                );
                return Ok(None);
            };

            self.fill_state(target, &source, pointer)?;
            copied.insert(index);
            remap.insert(index, target);
            trace!("Copied state {index} to {target}");
            count += 1;
            index = source.next_state_index;
        }
        Ok(Some(count))
    }

    fn fill_state(
        &mut self,
        target: i32,
        source: &DehState,
        pointer: Option<Arc<DehActionPointer>>,
    ) -> Result<()> {
        if let Some(state) = self.state(target) {
            state.copy_from(source);
        }
        if let Some(slot) = self.state_action_pointer_index(target) {
            let pointer = pointer.unwrap_or_else(|| self.baseline.null_action_pointer());
            self.pointers.insert(slot, pointer);
        }
        self.set_free_state(target, false)
    }

    /// Point every copied state's successor at the copies
    ///
    /// Successors that were not copied become `0`.
    pub fn remap_copied_states(&mut self, remap: &BTreeMap<i32, i32>) {
        for &target in remap.values() {
            if let Some(state) = self.state(target) {
                state.next_state_index = remap.get(&state.next_state_index).copied().unwrap_or(0);
            }
        }
    }

    fn actor_labels(&self, actor: Actor) -> Result<StateLabels> {
        let (kind, index, count) = match actor {
            Actor::Thing(i) => (EntityKind::Thing, i, self.thing_count()),
            Actor::Weapon(i) => (EntityKind::Weapon, i, self.weapon_count()),
        };
        self.check_index_range(kind, index, count)?;
        let labels = match actor {
            Actor::Thing(i) => self.peek_thing(i).map(|thing| thing.labels.clone()),
            Actor::Weapon(i) => self.peek_weapon(i).map(|weapon| weapon.labels.clone()),
        };
        labels.ok_or(Error::IndexOutOfBounds { kind, index, count })
    }

    /// Free the chains of every label of a thing or weapon
    pub fn free_actor_states(&mut self, actor: Actor) -> Result<usize> {
        let labels = self.actor_labels(actor)?;
        let mut freed = 0;
        for (_, start) in labels.iter() {
            freed += self.free_connected_states(start)?;
        }
        debug!("Freed {freed} states of {actor:?}");
        Ok(freed)
    }

    /// Free the chains of every label of a thing
    pub fn free_thing_states(&mut self, index: i32) -> Result<usize> {
        self.free_actor_states(Actor::Thing(index))
    }

    /// Free the chains of every label of a weapon
    pub fn free_weapon_states(&mut self, index: i32) -> Result<usize> {
        self.free_actor_states(Actor::Weapon(index))
    }

    /// Transform the chains of every label of a thing or weapon
    pub fn transform_actor_states<F>(&mut self, actor: Actor, mut transform: F) -> Result<usize>
    where
        F: FnMut(i32, &mut DehState),
    {
        let labels = self.actor_labels(actor)?;
        let mut visited = BTreeSet::new();
        let mut count = 0;
        for (_, start) in labels.iter() {
            count += self.transform_connected_states(start, &mut visited, &mut transform);
        }
        Ok(count)
    }

    /// Copy the chains of `source` and point `destination`'s labels at them
    ///
    /// Labels converging on one chain share its copy. On `Ok(None)` states
    /// copied so far stay filled and `destination` is left unchanged.
    pub fn copy_actor_states(
        &mut self,
        destination: Actor,
        source: Actor,
        search_start: i32,
    ) -> Result<Option<usize>> {
        let labels = self.actor_labels(source)?;
        self.actor_labels(destination)?;

        let mut copied = BTreeSet::new();
        let mut remap = BTreeMap::new();
        let mut count = 0;
        for (_, start) in labels.iter() {
            match self.copy_connected_states(start, search_start, &mut copied, &mut remap)? {
                Some(n) => count += n,
                None => return Ok(None),
            }
        }
        self.remap_copied_states(&remap);

        let mut relabeled = StateLabels::new();
        for (label, start) in labels.iter() {
            relabeled.set(label, remap.get(&start).copied().unwrap_or(start));
        }
        match destination {
            Actor::Thing(i) => {
                if let Some(thing) = self.thing(i) {
                    thing.labels = relabeled;
                }
            }
            Actor::Weapon(i) => {
                if let Some(weapon) = self.weapon(i) {
                    weapon.labels = relabeled;
                }
            }
        }
        debug!("Copied {count} states from {source:?} to {destination:?}");
        Ok(Some(count))
    }

    /// Copy a thing's state chains onto another thing
    pub fn copy_thing_states(
        &mut self,
        destination: i32,
        source: i32,
        search_start: i32,
    ) -> Result<Option<usize>> {
        self.copy_actor_states(Actor::Thing(destination), Actor::Thing(source), search_start)
    }

    /// Copy a weapon's state chains onto another weapon
    pub fn copy_weapon_states(
        &mut self,
        destination: i32,
        source: i32,
        search_start: i32,
    ) -> Result<Option<usize>> {
        self.copy_actor_states(Actor::Weapon(destination), Actor::Weapon(source), search_start)
    }

    /// Number of free thing slots
    pub fn free_thing_count(&self) -> u64 {
        self.free_things.index_width(true)
    }

    /// Whether a thing slot is free
    pub fn is_free_thing(&self, index: i32) -> bool {
        self.free_things.get_or_default(i64::from(index), false)
    }

    /// Mark a thing slot free or in use
    pub fn set_free_thing(&mut self, index: i32, free: bool) -> Result<()> {
        self.check_index_range(EntityKind::Thing, index, self.thing_count())?;
        self.free_things.set(i64::from(index), free);
        Ok(())
    }

    /// Next free thing slot at or after `start`, wrapping once
    pub fn find_next_free_thing(&self, start: i32) -> Option<i32> {
        search_free(&self.free_things, start, self.thing_count(), |_| true)
    }

    /// Number of free weapon slots
    pub fn free_weapon_count(&self) -> u64 {
        self.free_weapons.index_width(true)
    }

    /// Whether a weapon slot is free
    pub fn is_free_weapon(&self, index: i32) -> bool {
        self.free_weapons.get_or_default(i64::from(index), false)
    }

    /// Mark a weapon slot free or in use
    pub fn set_free_weapon(&mut self, index: i32, free: bool) -> Result<()> {
        self.check_index_range(EntityKind::Weapon, index, self.weapon_count())?;
        self.free_weapons.set(i64::from(index), free);
        Ok(())
    }

    /// Next free weapon slot at or after `start`, wrapping once
    pub fn find_next_free_weapon(&self, start: i32) -> Option<i32> {
        search_free(&self.free_weapons, start, self.weapon_count(), |_| true)
    }

    /// Number of free ammo slots
    pub fn free_ammo_count(&self) -> u64 {
        self.free_ammo.index_width(true)
    }

    /// Whether an ammo slot is free
    pub fn is_free_ammo(&self, index: i32) -> bool {
        self.free_ammo.get_or_default(i64::from(index), false)
    }

    /// Mark an ammo slot free or in use
    pub fn set_free_ammo(&mut self, index: i32, free: bool) -> Result<()> {
        self.check_index_range(EntityKind::Ammo, index, self.ammo_count())?;
        self.free_ammo.set(i64::from(index), free);
        Ok(())
    }

    /// Next free ammo slot at or after `start`, wrapping once
    pub fn find_next_free_ammo(&self, start: i32) -> Option<i32> {
        search_free(&self.free_ammo, start, self.ammo_count(), |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::SourcePatch;
    use crate::context::ContextOptions;
    use crate::dialect::Dialect;
    use crate::entity::DehThing;

    /// Ten states; 2..=5 loop 2 -> 3 -> 4 -> 5 -> 2, 6 -> 7 -> 0
    fn looping_patch() -> Arc<SourcePatch> {
        let mut builder = SourcePatch::builder("loop")
            .state(DehState::new(0, 0, false, 0, -1), None)
            .state(DehState::new(0, 0, false, 1, -1), None);
        for (index, next) in [(2, 3), (3, 4), (4, 5), (5, 2), (6, 7), (7, 0), (8, 0), (9, 0)] {
            builder = builder.state_at(index, DehState::new(1, index, false, next, 4), None);
        }
        let mut imp = DehThing::named("Imp");
        imp.set_label("spawn", 2).set_label("death", 6);
        Arc::new(builder.thing(imp).build().unwrap())
    }

    fn context(dialect: Dialect) -> PatchContext {
        PatchContext::new(dialect, looping_patch(), ContextOptions::default())
    }

    #[test]
    fn test_reserved_states_protected() {
        let mut ctx = context(Dialect::Boom);
        for index in [0, 1] {
            assert!(ctx.is_protected_state(index));
            assert!(matches!(
                ctx.set_free_state(index, true),
                Err(Error::IllegalMutation(_))
            ));
        }
        assert_eq!(ctx.free_state_count(), 0);
    }

    #[test]
    fn test_loop_stops_at_protected() {
        let mut ctx = context(Dialect::Boom);
        ctx.set_protected_state(3, true).unwrap();
        assert_eq!(ctx.free_connected_states(2).unwrap(), 1);
        assert!(ctx.is_free_state(2));
        assert!(!ctx.is_free_state(3));
    }

    #[test]
    fn test_loop_terminates() {
        let mut ctx = context(Dialect::Boom);
        assert_eq!(ctx.free_connected_states(2).unwrap(), 4);
        assert_eq!(ctx.free_state_count(), 4);
    }

    #[test]
    fn test_safety_switch_history_survives_toggle() {
        let mut ctx = context(Dialect::Mbf21);
        ctx.set_free_state(8, true).unwrap();
        ctx.set_free_state(8, false).unwrap();
        ctx.set_free_state(8, true).unwrap();
        ctx.set_free_state(8, false).unwrap();

        ctx.set_state_safety(true);
        assert!(ctx.set_free_state(8, true).is_err());
        ctx.set_state_safety(false);
        ctx.set_state_safety(true);
        assert!(ctx.set_free_state(8, true).is_err());
        assert!(ctx.set_free_state(9, true).is_ok());
    }

    #[test]
    fn test_range_free_partial_when_counted() {
        let mut ctx = context(Dialect::Mbf21);
        ctx.set_protected_state(5, true).unwrap();
        assert!(ctx.set_free_state_range(3, 7, true).is_err());
        assert!(ctx.is_free_state(3));
        assert!(ctx.is_free_state(4));
        assert!(!ctx.is_free_state(6));
        assert_eq!(ctx.free_state_count(), 2);
    }

    #[test]
    fn test_range_free_atomic_with_bitset() {
        let mut ctx = context(Dialect::DsdHacked);
        ctx.set_protected_state(5, true).unwrap();
        assert!(ctx.set_free_state_range(3, 7, true).is_err());
        assert_eq!(ctx.free_state_count(), 0);
        ctx.set_free_state_range(7, 6, true).unwrap();
        assert_eq!(ctx.free_state_count(), 2);
    }

    #[test]
    fn test_search_wraps() {
        let mut ctx = context(Dialect::Boom);
        ctx.set_free_state(3, true).unwrap();
        ctx.set_free_state(8, true).unwrap();
        assert_eq!(ctx.find_next_free_state(5), Some(8));
        assert_eq!(ctx.find_next_free_state(9), Some(3));
        ctx.set_protected_state(8, true).unwrap();
        assert_eq!(ctx.find_next_free_state(5), Some(3));
        assert!(!ctx.is_fillable_state(8));
    }

    #[test]
    fn test_copy_remaps_chain() {
        let mut ctx = context(Dialect::Boom);
        ctx.set_free_state_range(8, 9, true).unwrap();
        let mut copied = BTreeSet::new();
        let mut remap = BTreeMap::new();
        assert_eq!(
            ctx.copy_connected_states(6, 0, &mut copied, &mut remap).unwrap(),
            Some(2)
        );
        ctx.remap_copied_states(&remap);
        assert_eq!(remap, BTreeMap::from([(6, 8), (7, 9)]));
        assert_eq!(ctx.peek_state(8).unwrap().next_state_index, 9);
        assert_eq!(ctx.peek_state(9).unwrap().next_state_index, 0);
        assert_eq!(ctx.peek_state(8).unwrap().frame_index, 6);
        assert_eq!(ctx.free_state_count(), 0);
    }

    #[test]
    fn test_copy_out_of_budget() {
        let mut ctx = context(Dialect::Boom);
        ctx.set_free_state(9, true).unwrap();
        let mut copied = BTreeSet::new();
        let mut remap = BTreeMap::new();
        assert_eq!(
            ctx.copy_connected_states(2, 0, &mut copied, &mut remap).unwrap(),
            None
        );
        assert_eq!(remap, BTreeMap::from([(2, 9)]));
    }

    #[test]
    fn test_transform_visits_once() {
        let mut ctx = context(Dialect::Boom);
        let mut visited = BTreeSet::new();
        let n = ctx.transform_connected_states(2, &mut visited, |_, state| state.duration = 1);
        assert_eq!(n, 4);
        assert_eq!(ctx.transform_connected_states(4, &mut visited, |_, _| {}), 0);
        assert_eq!(ctx.peek_state(5).unwrap().duration, 1);
    }

    #[test]
    fn test_thing_slots() {
        let mut ctx = context(Dialect::Boom);
        assert_eq!(ctx.find_next_free_thing(0), None);
        ctx.set_free_thing(0, true).unwrap();
        assert_eq!(ctx.free_thing_count(), 1);
        assert_eq!(ctx.find_next_free_thing(0), Some(0));
        assert!(ctx.set_free_thing(3, true).is_err());
    }
}
