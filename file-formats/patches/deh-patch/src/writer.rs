//! DeHackEd text output
//!
//! Only differences from the baseline are written. Blocks come in a fixed
//! order (things, frames, sounds, weapons, ammo, misc) followed by the
//! dialect's extension sections. Every line ends in CRLF.

use std::collections::BTreeMap;
use std::io::Write;

use log::debug;

use crate::baseline::SourcePatch;
use crate::context::PatchContext;
use crate::entity::{CRLF, DehActionPointer, DehObject};
use crate::error::Result;
use crate::feature::FeatureLevel;
use crate::strings::StringTable;

/// First line of every patch
pub const PATCH_BANNER: &str = "Patch File for DeHackEd v3.0";

/// Value of the `Patch format` header line
pub const PATCH_FORMAT: i32 = 6;

/// Serializes a [`PatchContext`] as a DeHackEd patch
#[derive(Debug)]
pub struct PatchWriter<W: Write> {
    out: W,
    blocks: usize,
}

impl<W: Write> PatchWriter<W> {
    /// Wrap an output sink
    pub fn new(out: W) -> Self {
        Self { out, blocks: 0 }
    }

    /// Number of blocks written so far
    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    /// Give back the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the header, every changed entity, and the dialect sections
    pub fn write_patch(&mut self, ctx: &PatchContext, comment: &str) -> Result<()> {
        let level = ctx.supported_feature_level();
        let base = ctx.baseline().as_ref();

        self.write_header(ctx.version(), comment)?;

        self.write_table(&ctx.things, level, |i| base.thing(i), |i, thing| {
            format!("Thing {i} ({})", thing.name)
        })?;
        self.write_table(&ctx.states, level, |i| base.state(i), |i, _| {
            format!("Frame {i}")
        })?;
        // Sound 0 is the blank sound and has no DeHackEd number
        let numbered_sound = |i: i32| if i > 0 { base.sound(i) } else { None };
        self.write_table(&ctx.sounds, level, numbered_sound, |i, _| {
            format!("Sound {}", i - 1)
        })?;
        self.write_table(&ctx.weapons, level, |i| base.weapon(i), |i, weapon| {
            format!("Weapon {i} ({})", weapon.name)
        })?;
        self.write_table(&ctx.ammo, level, |i| base.ammo(i), |i, ammo| {
            format!("Ammo {i} ({})", ammo.name)
        })?;

        let misc = ctx.peek_miscellany();
        if needs_block(misc, Some(base.miscellany())) {
            write!(self.out, "Misc 0{CRLF}")?;
            misc.write_object(&mut self.out, base.miscellany(), level)?;
            write!(self.out, "{CRLF}")?;
            self.blocks += 1;
        }

        match &ctx.strings {
            StringTable::Indexed(_) => {
                self.write_pointer_blocks(ctx, base)?;
                self.write_text_blocks(&ctx.strings, base)?;
            }
            StringTable::Keyed(_) => self.write_boom_sections(ctx, base)?,
            StringTable::Dynamic(_, names) => {
                self.write_boom_sections(ctx, base)?;
                self.write_name_section("SPRITES", names.sprites(), |i| base.sprite_name(i))?;
                self.write_name_section("SOUNDS", names.sounds(), |i| base.sound_name(i))?;
            }
        }

        self.out.flush()?;
        debug!("Wrote {} patch blocks for {}", self.blocks, ctx.dialect());
        Ok(())
    }

    fn write_header(&mut self, version: i32, comment: &str) -> Result<()> {
        write!(self.out, "{PATCH_BANNER}{CRLF}")?;
        write!(self.out, "# {comment}{CRLF}")?;
        write!(
            self.out,
            "# Note: Use the pound sign ('#') to start comment lines.{CRLF}"
        )?;
        write!(self.out, "{CRLF}")?;
        write!(self.out, "Doom version = {version}{CRLF}")?;
        write!(self.out, "Patch format = {PATCH_FORMAT}{CRLF}")?;
        write!(self.out, "{CRLF}{CRLF}")?;
        Ok(())
    }

    fn write_table<'a, T, F, H>(
        &mut self,
        table: &'a BTreeMap<i32, T>,
        level: FeatureLevel,
        original: F,
        header: H,
    ) -> Result<()>
    where
        T: DehObject + 'a,
        F: Fn(i32) -> Option<&'a T>,
        H: Fn(i32, &T) -> String,
    {
        for (&index, object) in table {
            // Entities without a baseline counterpart have no block
            let baseline = original(index);
            if !needs_block(object, baseline) {
                continue;
            }
            let Some(baseline) = baseline else {
                continue;
            };
            write!(self.out, "{}{CRLF}", header(index, object))?;
            object.write_object(&mut self.out, baseline, level)?;
            write!(self.out, "{CRLF}")?;
            self.blocks += 1;
        }
        Ok(())
    }

    fn changed_pointers<'a>(
        ctx: &'a PatchContext,
        base: &'a SourcePatch,
    ) -> impl Iterator<Item = (i32, &'a DehActionPointer, i32)> + 'a {
        ctx.pointers.iter().filter_map(move |(&slot, pointer)| {
            let original = base.action_pointer(slot)?;
            if original.same_action(pointer) {
                return None;
            }
            let state = base.action_pointer_state_index(slot)?;
            Some((slot, pointer.as_ref(), state))
        })
    }

    fn write_pointer_blocks(&mut self, ctx: &PatchContext, base: &SourcePatch) -> Result<()> {
        for (slot, pointer, state) in Self::changed_pointers(ctx, base) {
            write!(self.out, "Pointer {slot} (Frame {state}){CRLF}")?;
            write!(self.out, "Codep Frame = {}{CRLF}", pointer.frame)?;
            write!(self.out, "{CRLF}")?;
            self.blocks += 1;
        }
        Ok(())
    }

    fn write_text_blocks(&mut self, strings: &StringTable, base: &SourcePatch) -> Result<()> {
        for (_, original, replacement) in strings.changed_strings(base) {
            write!(
                self.out,
                "Text {} {}{CRLF}{original}{replacement}{CRLF}",
                original.len(),
                replacement.len()
            )?;
            self.blocks += 1;
        }
        Ok(())
    }

    fn write_boom_sections(&mut self, ctx: &PatchContext, base: &SourcePatch) -> Result<()> {
        let pointers: Vec<_> = Self::changed_pointers(ctx, base).collect();
        if !pointers.is_empty() {
            write!(self.out, "[CODEPTR]{CRLF}")?;
            for (_, pointer, state) in pointers {
                write!(self.out, "FRAME {state} = {}{CRLF}", pointer.mnemonic)?;
            }
            write!(self.out, "{CRLF}")?;
            self.blocks += 1;
        }

        let strings: Vec<_> = ctx.strings.changed_keyed_strings(base).collect();
        if !strings.is_empty() {
            write!(self.out, "[STRINGS]{CRLF}")?;
            for (key, value) in strings {
                write!(self.out, "{key} = {}{CRLF}", escape(value))?;
            }
            write!(self.out, "{CRLF}")?;
            self.blocks += 1;
        }

        let pars: Vec<_> = ctx.strings.changed_par_times(base).collect();
        if !pars.is_empty() {
            write!(self.out, "[PARS]{CRLF}")?;
            for (key, seconds) in pars {
                write!(self.out, "par {key} {seconds}{CRLF}")?;
            }
            write!(self.out, "{CRLF}")?;
            self.blocks += 1;
        }
        Ok(())
    }

    fn write_name_section<'a, F>(
        &mut self,
        section: &str,
        names: &BTreeMap<i32, String>,
        original: F,
    ) -> Result<()>
    where
        F: Fn(i32) -> Option<&'a str>,
    {
        let changed: Vec<_> = names
            .iter()
            .filter(|&(&index, name)| original(index) != Some(name.as_str()))
            .collect();
        if changed.is_empty() {
            return Ok(());
        }
        write!(self.out, "[{section}]{CRLF}")?;
        for (index, name) in changed {
            write!(self.out, "{index} = {name}{CRLF}")?;
        }
        write!(self.out, "{CRLF}")?;
        self.blocks += 1;
        Ok(())
    }
}

fn needs_block<T: DehObject>(object: &T, original: Option<&T>) -> bool {
    object.is_force_output()
        || original != Some(object)
        || object.has_custom_properties()
        || object.has_editor_keys()
}

/// Escape a `[STRINGS]` value
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

impl PatchContext {
    /// Write this context as a DeHackEd patch
    pub fn write_patch<W: Write>(&self, out: W, comment: &str) -> Result<()> {
        PatchWriter::new(out).write_patch(self, comment)
    }
}
