//! Patch generation command implementations

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use deh_patch::{Actor, BaselineSet, ContextOptions, Dialect, PatchContext};

#[derive(Args)]
pub struct TargetArgs {
    /// Target dialect (e.g., "doom19", "boom", "mbf21", "dsdhacked")
    #[arg(short, long)]
    pub dialect: Dialect,

    /// Directory holding `<baseline>.yaml` or `<baseline>.json` definitions
    #[arg(short, long, env = "DEHACKED_BASELINES", default_value = "baselines")]
    pub baselines: PathBuf,

    /// Disable the state safety switch (allows freeing a state twice)
    #[arg(long)]
    pub no_safety: bool,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Write the patch here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comment line written in the patch header
    #[arg(long, default_value = "Created with dehacked-rs")]
    pub comment: String,
}

#[derive(Subcommand)]
pub enum PatchCommands {
    /// Write a patch with no changes
    Blank {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Free the states of things and weapons and report what is available
    Free {
        #[command(flatten)]
        target: TargetArgs,

        /// Thing whose states to free (can be repeated)
        #[arg(long = "thing", value_name = "INDEX")]
        things: Vec<i32>,

        /// Weapon whose states to free (can be repeated)
        #[arg(long = "weapon", value_name = "INDEX")]
        weapons: Vec<i32>,
    },

    /// Give one actor a private copy of another actor's states
    Copy {
        #[command(flatten)]
        target: TargetArgs,

        /// Actor whose states are copied
        #[arg(long)]
        from: i32,

        /// Actor that receives the copies
        #[arg(long)]
        to: i32,

        /// Copy between weapons instead of things
        #[arg(long)]
        weapons: bool,

        /// Thing whose states are freed first to make room (can be repeated)
        #[arg(long = "free", value_name = "INDEX")]
        free: Vec<i32>,

        /// State index to start searching for free states at
        #[arg(long, default_value_t = 0)]
        search_start: i32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replace strings, as KEY=VALUE for keyed dialects or INDEX=VALUE for Doom 1.9
    Strings {
        #[command(flatten)]
        target: TargetArgs,

        /// Replacement (can be repeated)
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

pub fn execute(command: PatchCommands) -> Result<()> {
    match command {
        PatchCommands::Blank { target, output } => {
            let ctx = open_context(&target)?;
            write_patch(&ctx, &output)
        }
        PatchCommands::Free {
            target,
            things,
            weapons,
        } => execute_free(&target, &things, &weapons),
        PatchCommands::Copy {
            target,
            from,
            to,
            weapons,
            free,
            search_start,
            output,
        } => {
            let (destination, source) = if weapons {
                (Actor::Weapon(to), Actor::Weapon(from))
            } else {
                (Actor::Thing(to), Actor::Thing(from))
            };
            execute_copy(&target, destination, source, &free, search_start, &output)
        }
        PatchCommands::Strings {
            target,
            assignments,
            output,
        } => execute_strings(&target, &assignments, &output),
    }
}

fn open_context(target: &TargetArgs) -> Result<PatchContext> {
    let mut baselines = BaselineSet::from_dir(&target.baselines);
    let baseline = baselines
        .get(target.dialect)
        .with_context(|| format!("Failed to load the {} baseline", target.dialect))?;
    let options = ContextOptions::new().with_state_safety(!target.no_safety);
    Ok(PatchContext::new(target.dialect, baseline, options))
}

fn write_patch(ctx: &PatchContext, output: &OutputArgs) -> Result<()> {
    match &output.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            ctx.write_patch(&mut writer, &output.comment)
                .with_context(|| format!("Failed to write patch: {}", path.display()))?;
            writer.flush()?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            ctx.write_patch(stdout.lock(), &output.comment)
                .context("Failed to write patch")?;
        }
    }
    Ok(())
}

fn execute_free(target: &TargetArgs, things: &[i32], weapons: &[i32]) -> Result<()> {
    use console::style;

    if things.is_empty() && weapons.is_empty() {
        bail!("Nothing to free: pass --thing or --weapon");
    }

    let mut ctx = open_context(target)?;
    for &thing in things {
        let freed = ctx
            .free_thing_states(thing)
            .with_context(|| format!("Failed to free states of thing {thing}"))?;
        println!("Thing {thing}: {freed} states freed");
    }
    for &weapon in weapons {
        let freed = ctx
            .free_weapon_states(weapon)
            .with_context(|| format!("Failed to free states of weapon {weapon}"))?;
        println!("Weapon {weapon}: {freed} states freed");
    }

    println!();
    println!(
        "{} {} free states, {} with action pointer slots",
        style("Total:").bold(),
        ctx.free_state_count(),
        ctx.free_pointer_state_count()
    );
    Ok(())
}

fn execute_copy(
    target: &TargetArgs,
    destination: Actor,
    source: Actor,
    free: &[i32],
    search_start: i32,
    output: &OutputArgs,
) -> Result<()> {
    let mut ctx = open_context(target)?;
    for &thing in free {
        ctx.free_thing_states(thing)
            .with_context(|| format!("Failed to free states of thing {thing}"))?;
    }

    match ctx.copy_actor_states(destination, source, search_start)? {
        Some(count) => info!("Copied {count} states from {source:?} to {destination:?}"),
        None => bail!(
            "Not enough free states to copy {source:?} ({} free)",
            ctx.free_state_count()
        ),
    }

    write_patch(&ctx, output)
}

fn execute_strings(target: &TargetArgs, assignments: &[String], output: &OutputArgs) -> Result<()> {
    let mut ctx = open_context(target)?;
    let indexed = target.dialect.is_doom19_family();

    for assignment in assignments {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Expected KEY=VALUE, got {assignment:?}");
        };
        if indexed {
            let index: usize = key
                .trim()
                .parse()
                .with_context(|| format!("{} strings are addressed by index", target.dialect))?;
            ctx.set_string_at(index, value)
                .with_context(|| format!("Failed to set string {index}"))?;
        } else {
            let key = key.trim();
            ctx.set_string(key, value)
                .with_context(|| format!("Failed to set string {key}"))?;
        }
    }

    write_patch(&ctx, output)
}
