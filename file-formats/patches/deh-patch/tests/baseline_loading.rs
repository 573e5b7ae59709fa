//! Baselines loaded from definition files

use std::fs;
use std::path::{Path, PathBuf};

use deh_patch::baseline::loader::BaselineDefinition;
use deh_patch::{BaselineSet, ContextOptions, Dialect, EpisodeMap, Error, PatchContext};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/mini_boom.yaml")
}

#[test]
fn yaml_definition_builds() {
    let patch = BaselineDefinition::from_file(fixture())
        .unwrap()
        .to_source_patch()
        .unwrap();

    assert_eq!(patch.name(), "boom");
    assert_eq!(patch.thing_count(), 2);
    assert_eq!(patch.state_count(), 5);
    assert_eq!(patch.thing(1).unwrap().health, 60);
    assert_eq!(patch.thing(1).unwrap().label("spawn"), 2);
    assert_eq!(patch.sound_index("shotgn"), Some(2));
    assert_eq!(patch.sprite_index("sarg"), Some(1));
    assert_eq!(patch.string("GOTMEGA"), Some("MegaArmor!"));
    assert_eq!(patch.par_time(EpisodeMap::episode(1, 1)), Some(30));
    assert_eq!(patch.action_pointer_by_mnemonic("scream").unwrap().frame, 4);
    assert!(patch.state(4).unwrap().bright);
}

#[test]
fn baseline_set_loads_by_dialect_name() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture(), dir.path().join("boom.yaml")).unwrap();

    let mut baselines = BaselineSet::from_dir(dir.path());
    assert!(!baselines.is_loaded(Dialect::Boom));
    let first = baselines.get(Dialect::Boom).unwrap();
    let second = baselines.get(Dialect::Boom).unwrap();
    assert!(baselines.is_loaded(Dialect::Boom));
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let mut ctx = PatchContext::new(Dialect::Boom, first, ContextOptions::default());
    assert_eq!(ctx.free_thing_states(1).unwrap(), 3);
}

#[test]
fn missing_definition_is_a_baseline_error() {
    let dir = TempDir::new().unwrap();
    let mut baselines = BaselineSet::from_dir(dir.path());
    assert!(matches!(
        baselines.get(Dialect::Mbf21),
        Err(Error::Baseline(_))
    ));
}

#[test]
fn json_round_trips_through_serde() {
    let definition = BaselineDefinition::from_file(fixture()).unwrap();
    let json = serde_json::to_string(&definition).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boom.json");
    fs::write(&path, json).unwrap();

    let patch = BaselineDefinition::from_file(&path)
        .unwrap()
        .to_source_patch()
        .unwrap();
    assert_eq!(patch.state_count(), 5);
    assert_eq!(patch.string("gotarmor"), Some("Picked up the armor."));
}

#[test]
fn broken_successor_is_rejected() {
    let yaml = "name: broken\nstates:\n  - next: 0\n  - next: 7\n";
    let err = BaselineDefinition::from_yaml_str(yaml)
        .unwrap()
        .to_source_patch()
        .unwrap_err();
    assert!(matches!(err, Error::Baseline(_)));
}
