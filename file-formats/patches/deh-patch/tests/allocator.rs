//! State allocator behaviour across dialects

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::{BARON, IMP, context, context_with};
use deh_patch::{Actor, ContextOptions, Dialect, Error};
use proptest::prelude::*;
use test_case::test_case;

#[test_case(Dialect::Doom19 ; "doom19")]
#[test_case(Dialect::Boom ; "boom")]
#[test_case(Dialect::Mbf21 ; "mbf21")]
#[test_case(Dialect::DsdHacked ; "dsdhacked")]
#[test_case(Dialect::Id24 ; "id24")]
fn reserved_states_are_protected(dialect: Dialect) {
    let mut ctx = context(dialect);
    for index in [0, 1] {
        assert!(ctx.is_protected_state(index));
        let err = ctx.set_free_state(index, true).unwrap_err();
        assert!(matches!(err, Error::IllegalMutation(_)));
    }
    assert_eq!(ctx.free_state_count(), 0);
}

#[test]
fn looping_chain_stops_at_protected_state() {
    let mut ctx = context(Dialect::Boom);
    ctx.set_protected_state(3, true).unwrap();

    assert_eq!(ctx.free_connected_states(2).unwrap(), 1);
    assert!(ctx.is_free_state(2));
    assert!(!ctx.is_free_state(3));
}

#[test_case(Dialect::Doom19 ; "doom19")]
#[test_case(Dialect::Mbf21 ; "mbf21")]
#[test_case(Dialect::DsdHacked ; "dsdhacked")]
fn looping_chain_terminates(dialect: Dialect) {
    let mut ctx = context(dialect);
    assert_eq!(ctx.free_connected_states(2).unwrap(), 4);
    assert_eq!(ctx.free_state_count(), 4);
}

#[test]
fn pointer_states_counted_under_fixed_slots() {
    let mut ctx = context(Dialect::Doom19);
    // 2 and 4 host pointer slots, 3 and 5 do not
    ctx.free_thing_states(IMP).unwrap();
    assert_eq!(ctx.free_state_count(), 6);
    assert_eq!(ctx.free_pointer_state_count(), 3);

    ctx.set_free_state(4, false).unwrap();
    assert_eq!(ctx.free_state_count(), 5);
    assert_eq!(ctx.free_pointer_state_count(), 2);
}

#[test]
fn safety_switch_refuses_second_free() {
    let options = ContextOptions::new().with_state_safety(true);
    let mut ctx = context_with(Dialect::Mbf21, options);

    ctx.set_free_state(9, true).unwrap();
    ctx.set_free_state(9, false).unwrap();
    assert!(matches!(
        ctx.set_free_state(9, true),
        Err(Error::IllegalMutation(_))
    ));

    ctx.set_state_safety(false);
    ctx.set_free_state(9, true).unwrap();
}

#[test]
fn counted_range_free_keeps_earlier_indices() {
    let mut ctx = context(Dialect::Boom);
    ctx.set_protected_state(6, true).unwrap();

    assert!(ctx.set_free_state_range(4, 8, true).is_err());
    assert!(ctx.is_free_state(4));
    assert!(ctx.is_free_state(5));
    assert!(!ctx.is_free_state(7));
    assert_eq!(ctx.free_state_count(), 2);
}

#[test]
fn bitset_range_free_is_all_or_nothing() {
    let mut ctx = context(Dialect::DsdHacked);
    ctx.set_protected_state(6, true).unwrap();

    assert!(ctx.set_free_state_range(4, 8, true).is_err());
    assert!(!ctx.is_free_state(4));
    assert_eq!(ctx.free_state_count(), 0);

    ctx.set_free_state_range(2, 5, true).unwrap();
    assert_eq!(ctx.free_state_count(), 4);
}

#[test]
fn search_wraps_around() {
    let mut ctx = context(Dialect::Boom);
    ctx.set_free_state(3, true).unwrap();
    ctx.set_free_state(8, true).unwrap();

    assert_eq!(ctx.find_next_free_state(0), Some(3));
    assert_eq!(ctx.find_next_free_state(4), Some(8));
    assert_eq!(ctx.find_next_free_state(9), Some(3));
    assert_eq!(ctx.find_next_free_state(-5), Some(3));
}

#[test]
fn pointer_state_search_skips_slotless_states() {
    let mut ctx = context(Dialect::Doom19);
    ctx.set_free_state(3, true).unwrap();
    ctx.set_free_state(4, true).unwrap();

    assert_eq!(ctx.find_next_free_action_pointer_state(0), Some(4));
    assert_eq!(ctx.find_next_free_non_action_pointer_state(0), Some(3));
}

#[test]
fn pointer_state_copy_needs_a_slot() {
    let mut ctx = context(Dialect::Doom19);
    ctx.set_free_state(3, true).unwrap();
    ctx.set_free_state(5, true).unwrap();

    // 8 carries Look, and neither free state has a pointer slot
    let mut copied = BTreeSet::new();
    let mut remap = BTreeMap::new();
    assert_eq!(
        ctx.copy_connected_states(8, 0, &mut copied, &mut remap).unwrap(),
        None
    );
    assert!(remap.is_empty());
    assert_eq!(ctx.free_state_count(), 2);
}

#[test]
fn copy_remaps_successors_into_the_copy() {
    let mut ctx = context(Dialect::Mbf21);
    ctx.free_connected_states(6).unwrap();
    ctx.free_connected_states(2).unwrap();

    let mut copied = BTreeSet::new();
    let mut remap = BTreeMap::new();
    let count = ctx
        .copy_connected_states(8, 0, &mut copied, &mut remap)
        .unwrap();
    assert_eq!(count, Some(2));
    ctx.remap_copied_states(&remap);

    let targets: BTreeSet<i32> = remap.values().copied().collect();
    for &target in &targets {
        let next = ctx.peek_state(target).unwrap().next_state_index;
        assert!(next == 0 || targets.contains(&next), "{target} -> {next}");
        assert!(!ctx.is_free_state(target));
    }
    let first = remap[&8];
    assert_eq!(ctx.peek_state(first).unwrap().next_state_index, remap[&9]);
    assert_eq!(ctx.state_action_pointer(first).unwrap().mnemonic, "Look");
}

#[test]
fn copy_without_free_states_reports_exhaustion() {
    let mut ctx = context(Dialect::Boom);

    let mut copied = BTreeSet::new();
    let mut remap = BTreeMap::new();
    assert_eq!(
        ctx.copy_connected_states(8, 0, &mut copied, &mut remap).unwrap(),
        None
    );
    assert!(remap.is_empty());
}

#[test]
fn copy_keeps_partial_remap_on_exhaustion() {
    let mut ctx = context(Dialect::Boom);
    ctx.set_free_state(3, true).unwrap();

    let mut copied = BTreeSet::new();
    let mut remap = BTreeMap::new();
    assert_eq!(
        ctx.copy_connected_states(8, 0, &mut copied, &mut remap).unwrap(),
        None
    );
    assert_eq!(remap, BTreeMap::from([(8, 3)]));
}

#[test]
fn copy_thing_states_relabels_destination() {
    let mut ctx = context(Dialect::Doom19);
    ctx.free_thing_states(IMP).unwrap();

    let count = ctx.copy_thing_states(IMP, BARON, 0).unwrap();
    assert_eq!(count, Some(2));

    let spawn = ctx.peek_thing(IMP).unwrap().label("spawn");
    assert_ne!(spawn, 8);
    // Look needs a pointer slot: 2 is the first free one
    assert_eq!(spawn, 2);
    assert!(ctx.state_action_pointer_index(spawn).is_some());
    assert_eq!(ctx.peek_thing(IMP).unwrap().label("death"), 0);
    assert_eq!(ctx.peek_thing(BARON).unwrap().label("spawn"), 8);
}

#[test]
fn converging_labels_share_one_copy() {
    let mut ctx = context(Dialect::Boom);
    // spawn and see both lead into the 2 -> 3 -> 4 -> 5 -> 2 loop
    ctx.thing(IMP)
        .unwrap()
        .set_label("see", 4)
        .set_label("death", 0);
    ctx.free_connected_states(6).unwrap();
    ctx.free_connected_states(8).unwrap();
    assert_eq!(ctx.free_state_count(), 4);

    let count = ctx.copy_thing_states(BARON, IMP, 0).unwrap();
    assert_eq!(count, Some(4));
    assert_eq!(ctx.free_state_count(), 0);

    let baron = ctx.peek_thing(BARON).unwrap().clone();
    let block = BTreeSet::from([6, 7, 8, 9]);
    let spawn = baron.label("spawn");
    let see = baron.label("see");
    assert!(block.contains(&spawn));
    assert!(block.contains(&see));

    // Walk the copied loop: four distinct states, back to the start
    let mut chain = vec![spawn];
    let mut index = ctx.peek_state(spawn).unwrap().next_state_index;
    while index != spawn {
        assert!(block.contains(&index), "{index} left the copied block");
        chain.push(index);
        index = ctx.peek_state(index).unwrap().next_state_index;
    }
    assert_eq!(chain.len(), 4);
    // see pointed at the third state of the original loop
    assert_eq!(chain[2], see);

    assert_eq!(ctx.peek_thing(IMP).unwrap().label("spawn"), 2);
    assert_eq!(ctx.peek_thing(IMP).unwrap().label("see"), 4);
}

#[test]
fn copy_out_of_budget_leaves_destination_alone() {
    let mut ctx = context(Dialect::Boom);
    assert_eq!(
        ctx.copy_actor_states(Actor::Thing(IMP), Actor::Thing(BARON), 0)
            .unwrap(),
        None
    );
    assert_eq!(ctx.peek_thing(IMP).unwrap().label("spawn"), 2);
}

#[test]
fn transform_visits_each_state_once() {
    let mut ctx = context(Dialect::Mbf21);
    let mut seen = Vec::new();
    let count = ctx
        .transform_actor_states(Actor::Thing(IMP), |index, state| {
            seen.push(index);
            state.duration += 1;
        })
        .unwrap();

    assert_eq!(count, 6);
    assert_eq!(seen, vec![6, 7, 2, 3, 4, 5]);
    assert_eq!(ctx.peek_state(2).unwrap().duration, 11);
}

#[test]
fn slot_pools_track_things() {
    let mut ctx = context(Dialect::Mbf21);
    assert_eq!(ctx.free_thing_count(), 0);
    ctx.set_free_thing(BARON, true).unwrap();
    assert!(ctx.is_free_thing(BARON));
    assert_eq!(ctx.find_next_free_thing(0), Some(BARON));
    assert!(matches!(
        ctx.set_free_thing(40, true),
        Err(Error::IndexOutOfBounds { .. })
    ));
}

#[test]
fn open_ended_dialect_accepts_any_index() {
    let mut ctx = context(Dialect::Id24);
    ctx.set_free_state(5000, true).unwrap();
    assert!(ctx.is_free_state(5000));
    assert!(ctx.thing(4000).is_some());
    assert_eq!(ctx.used_thing_indices().collect::<Vec<_>>(), vec![4000]);
}

#[test]
fn open_ended_dialect_rejects_negative_index() {
    let mut ctx = context(Dialect::Id24);
    assert!(matches!(
        ctx.set_free_state(-3, true),
        Err(Error::IndexOutOfBounds { index: -3, .. })
    ));
    assert!(matches!(
        ctx.set_protected_state(-4, true),
        Err(Error::IndexOutOfBounds { index: -4, .. })
    ));
    assert!(matches!(
        ctx.set_free_thing(-1, true),
        Err(Error::IndexOutOfBounds { index: -1, .. })
    ));
    assert_eq!(ctx.free_state_count(), 0);
}

proptest! {
    #[test]
    fn free_counters_match_marked_states(
        ops in prop::collection::vec((2i32..10, any::<bool>()), 0..64)
    ) {
        let mut ctx = context(Dialect::Doom19);
        for (index, free) in ops {
            ctx.set_free_state(index, free).unwrap();
        }

        let free: Vec<i32> = (0..ctx.state_count()).filter(|&i| ctx.is_free_state(i)).collect();
        let with_slot = free
            .iter()
            .filter(|&&i| ctx.state_action_pointer_index(i).is_some())
            .count();
        prop_assert_eq!(ctx.free_state_count(), free.len() as u64);
        prop_assert_eq!(ctx.free_pointer_state_count(), with_slot as u64);
    }
}
