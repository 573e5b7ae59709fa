//! Shared baselines for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use deh_patch::baseline::OpenTables;
use deh_patch::entity::{DehActionPointer, DehAmmo, DehSound, DehState, DehThing, DehWeapon};
use deh_patch::{
    ActionPointerType, ContextOptions, Dialect, EpisodeMap, PatchContext, SourcePatch,
    SourcePatchBuilder,
};

/// Imp thing index in every fixture
pub const IMP: i32 = 1;

/// Baron thing index in every fixture
pub const BARON: i32 = 2;

/// Ten states shared by the fixtures
///
/// `2 -> 3 -> 4 -> 5 -> 2` loops (Imp spawn), `6 -> 7 -> 0` ends (Imp death),
/// `8 -> 9 -> 8` loops (Baron spawn).
fn states(builder: SourcePatchBuilder) -> SourcePatchBuilder {
    builder
        .state(DehState::new(0, 0, false, 0, -1), None)
        .state(DehState::new(0, 0, false, 1, -1), Some("Light0"))
        .state(DehState::new(0, 0, false, 3, 10), Some("Look"))
        .state(DehState::new(0, 1, false, 4, 10), None)
        .state(DehState::new(0, 2, false, 5, 3), Some("Chase"))
        .state(DehState::new(0, 3, false, 2, 3), None)
        .state(DehState::new(0, 4, false, 7, 8), Some("Scream"))
        .state(DehState::new(0, 5, true, 0, -1), None)
        .state(DehState::new(1, 0, false, 9, 10), Some("Look"))
        .state(DehState::new(1, 1, false, 8, 10), None)
        .action_pointer(DehActionPointer::new("Light0", ActionPointerType::Doom19, true, -1))
        .action_pointer(DehActionPointer::new("Look", ActionPointerType::Doom19, false, -1))
        .action_pointer(DehActionPointer::new("Chase", ActionPointerType::Doom19, false, -1))
        .action_pointer(DehActionPointer::new("Scream", ActionPointerType::Doom19, false, -1))
        .action_pointer(DehActionPointer::new("Mushroom", ActionPointerType::Mbf, false, -1))
        .action_pointer(DehActionPointer::new("RefireTo", ActionPointerType::Mbf21, true, -1))
}

fn actors(builder: SourcePatchBuilder) -> SourcePatchBuilder {
    let mut imp = DehThing::named("Imp");
    imp.health = 60;
    imp.set_label("spawn", 2).set_label("death", 6);
    let mut baron = DehThing::named("Baron of Hell");
    baron.health = 1000;
    baron.set_label("spawn", 8);

    let mut pistol = DehWeapon::named("Pistol");
    pistol.ammo_type = 0;
    pistol.set_label("ready", 1);

    builder
        .thing(DehThing::named("Player"))
        .thing(imp)
        .thing(baron)
        .weapon(pistol)
        .ammo(DehAmmo::new("Bullets", 200, 10))
}

/// Doom 1.9 style baseline: fixed pointer slots, indexed strings
pub fn doom19_patch() -> SourcePatch {
    let strings = ["OK", "You got the shotgun!", "", "PISTOL", "SHOTGN", "TROO", "BOSS"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let builder = states(SourcePatch::builder("doom19"))
        .pointer_slots(vec![1, 2, 4, 6, 8])
        .indexed_strings(strings, 2, 5, 2)
        .sound("", DehSound::new(0, false))
        .sound("", DehSound::new(64, false))
        .sound("", DehSound::new(64, false));
    actors(builder)
        .build()
        .expect("doom19 fixture builds")
}

/// Boom style baseline: per-state pointers, keyed strings and pars
pub fn boom_patch() -> SourcePatch {
    let builder = states(SourcePatch::builder("boom"))
        .keyed_string("GOTARMOR", "Picked up the armor.")
        .keyed_string("GOTSHOTGUN", "You got the shotgun!")
        .user_string_prefix("USER_")
        .par(EpisodeMap::episode(1, 1), 30)
        .par(EpisodeMap::map(1), 30)
        .sound("", DehSound::new(0, false))
        .sound("pistol", DehSound::new(64, false))
        .sprite("TROO")
        .sprite("BOSS");
    actors(builder).build().expect("boom fixture builds")
}

/// DSDHacked style baseline: open-ended tables past the fixed entries
pub fn dsdhacked_patch() -> SourcePatch {
    let builder = states(SourcePatch::builder("dsdhacked"))
        .keyed_string("GOTARMOR", "Picked up the armor.")
        .sound("", DehSound::new(0, false))
        .sound("pistol", DehSound::new(64, false))
        .sprite("TROO")
        .sprite("BOSS")
        .open_tables(OpenTables {
            thing_start: 3,
            sound_start: 500,
            sprite_start: 145,
            state_start: 1089,
        });
    actors(builder).build().expect("dsdhacked fixture builds")
}

/// Fixture matching a dialect's string model
pub fn patch_for(dialect: Dialect) -> SourcePatch {
    match dialect {
        Dialect::Doom19 | Dialect::UltimateDoom19 | Dialect::DoomUnity => doom19_patch(),
        Dialect::DsdHacked | Dialect::Id24 => dsdhacked_patch(),
        _ => boom_patch(),
    }
}

/// Fresh context over the fixture for a dialect
pub fn context(dialect: Dialect) -> PatchContext {
    context_with(dialect, ContextOptions::default())
}

/// Fresh context with options
pub fn context_with(dialect: Dialect, options: ContextOptions) -> PatchContext {
    PatchContext::new(dialect, Arc::new(patch_for(dialect)), options)
}

/// Patch text of a context
pub fn render(ctx: &PatchContext) -> String {
    let mut out = Vec::new();
    ctx.write_patch(&mut out, "test")
        .expect("writing to a Vec cannot fail");
    String::from_utf8(out).expect("patches are UTF-8")
}

/// Header every patch starts with
pub fn header(version: i32) -> String {
    format!(
        "Patch File for DeHackEd v3.0\r\n\
         # test\r\n\
         # Note: Use the pound sign ('#') to start comment lines.\r\n\
         \r\n\
         Doom version = {version}\r\n\
         Patch format = 6\r\n\
         \r\n\
         \r\n"
    )
}
