//! Baseline definition command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use deh_patch::SourcePatch;
use deh_patch::baseline::BaselineStrings;
use deh_patch::baseline::loader::BaselineDefinition;

use crate::utils::{add_table_row, create_table, format_count};

#[derive(Subcommand)]
pub enum BaselineCommands {
    /// Display table sizes and string model of a baseline definition
    Info {
        /// Path to the YAML or JSON baseline definition
        file: PathBuf,
    },

    /// Check that a baseline definition builds
    Validate {
        /// Path to the YAML or JSON baseline definition
        file: PathBuf,
    },

    /// List the action pointer catalog of a baseline definition
    Pointers {
        /// Path to the YAML or JSON baseline definition
        file: PathBuf,

        /// Only show weapon pointers
        #[arg(long)]
        weapon: bool,
    },
}

pub fn execute(command: BaselineCommands) -> Result<()> {
    match command {
        BaselineCommands::Info { file } => execute_info(&file),
        BaselineCommands::Validate { file } => execute_validate(&file),
        BaselineCommands::Pointers { file, weapon } => execute_pointers(&file, weapon),
    }
}

fn load(path: &Path) -> Result<SourcePatch> {
    let definition = BaselineDefinition::from_file(path)
        .with_context(|| format!("Failed to read baseline: {}", path.display()))?;
    definition
        .to_source_patch()
        .with_context(|| format!("Invalid baseline: {}", path.display()))
}

fn execute_info(path: &Path) -> Result<()> {
    use console::style;

    let patch = load(path)?;

    println!("{}", style("Baseline Information").bold().underlined());
    println!();
    println!("Name:        {}", patch.name());
    let model = match patch.strings() {
        BaselineStrings::Indexed(_) => "indexed",
        BaselineStrings::Keyed(_) => "keyed",
    };
    println!("Strings:     {model} ({} entries)", patch.string_count());
    println!(
        "Open-ended:  {}",
        if patch.is_open_ended() { "yes" } else { "no" }
    );
    println!();

    let fixed = patch.fixed_counts();
    let mut table = create_table(vec!["Table", "Defined", "Addressable"]);
    let rows = [
        ("Things", fixed.things, patch.thing_count()),
        ("States", fixed.states, patch.state_count()),
        ("Sounds", fixed.sounds, patch.sound_count()),
        ("Sprites", fixed.sprites, patch.sprite_count()),
        ("Weapons", fixed.weapons, patch.weapon_count()),
        ("Ammo", fixed.ammo, patch.ammo_count()),
        ("Pointer slots", fixed.pointers, patch.action_pointer_count()),
    ];
    for (name, defined, addressable) in rows {
        add_table_row(
            &mut table,
            vec![
                name.to_string(),
                defined.to_string(),
                format_count(addressable),
            ],
        );
    }
    table.printstd();

    Ok(())
}

fn execute_validate(path: &Path) -> Result<()> {
    use console::style;

    let patch = load(path)?;
    let fixed = patch.fixed_counts();
    println!(
        "{} {}: {} things, {} states, {} sounds",
        style("✓").green().bold(),
        patch.name(),
        fixed.things,
        fixed.states,
        fixed.sounds
    );
    Ok(())
}

fn execute_pointers(path: &Path, weapon_only: bool) -> Result<()> {
    let patch = load(path)?;

    let mut table = create_table(vec!["Mnemonic", "Type", "Weapon", "Frame"]);
    let mut shown = 0;
    for pointer in patch.action_pointers() {
        if weapon_only && !pointer.weapon {
            continue;
        }
        add_table_row(
            &mut table,
            vec![
                pointer.mnemonic.clone(),
                pointer.kind.to_string(),
                if pointer.weapon { "yes" } else { "no" }.to_string(),
                pointer.frame.to_string(),
            ],
        );
        shown += 1;
    }
    table.printstd();
    println!("{shown} pointers");

    Ok(())
}
