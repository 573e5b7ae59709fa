//! Animation state (frame) records

use std::io::{self, Write};

use crate::feature::FeatureLevel;

use super::{CustomValues, DehObject, EntityKind, write_field};

/// Number of MBF21 state arguments
pub const MAX_ARGS: usize = 8;

/// Bright bit of the `Sprite subnumber` field
pub const FRAME_BRIGHT: i32 = 0x8000;

/// One state of the engine's state table
#[derive(Debug, Clone)]
pub struct DehState {
    pub sprite_index: i32,
    pub frame_index: i32,
    pub bright: bool,
    /// Successor in the animation chain
    pub next_state_index: i32,
    /// Tics, `-1` for forever
    pub duration: i32,
    pub misc1: i32,
    pub misc2: i32,
    args: [i32; MAX_ARGS],
    /// MBF21 state flags
    pub flags: i32,
    force_output: bool,
    custom: CustomValues,
}

impl Default for DehState {
    fn default() -> Self {
        Self {
            sprite_index: 0,
            frame_index: 0,
            bright: false,
            next_state_index: 0,
            duration: -1,
            misc1: 0,
            misc2: 0,
            args: [0; MAX_ARGS],
            flags: 0,
            force_output: false,
            custom: CustomValues::default(),
        }
    }
}

impl DehState {
    /// Create a state with the classic five fields
    pub fn new(sprite_index: i32, frame_index: i32, bright: bool, next_state_index: i32, duration: i32) -> Self {
        Self {
            sprite_index,
            frame_index,
            bright,
            next_state_index,
            duration,
            ..Self::default()
        }
    }

    /// MBF21 argument `n` (zero-based), `0` past the end
    pub fn arg(&self, n: usize) -> i32 {
        self.args.get(n).copied().unwrap_or(0)
    }

    /// All MBF21 arguments
    pub fn args(&self) -> &[i32; MAX_ARGS] {
        &self.args
    }

    /// Set MBF21 arguments from the start; missing trailing values become `0`
    pub fn set_args(&mut self, values: &[i32]) -> &mut Self {
        self.args = [0; MAX_ARGS];
        for (slot, value) in self.args.iter_mut().zip(values) {
            *slot = *value;
        }
        self
    }

    /// Value of the `Sprite subnumber` field
    pub fn sprite_subnumber(&self) -> i32 {
        self.frame_index | if self.bright { FRAME_BRIGHT } else { 0 }
    }
}

impl PartialEq for DehState {
    fn eq(&self, other: &Self) -> bool {
        self.sprite_index == other.sprite_index
            && self.frame_index == other.frame_index
            && self.bright == other.bright
            && self.next_state_index == other.next_state_index
            && self.duration == other.duration
            && self.misc1 == other.misc1
            && self.misc2 == other.misc2
            && self.args == other.args
            && self.flags == other.flags
    }
}

impl DehObject for DehState {
    const KIND: EntityKind = EntityKind::State;

    fn is_force_output(&self) -> bool {
        self.force_output
    }

    fn set_force_output(&mut self, force: bool) {
        self.force_output = force;
    }

    fn custom_values(&self) -> &CustomValues {
        &self.custom
    }

    fn custom_values_mut(&mut self) -> &mut CustomValues {
        &mut self.custom
    }

    fn write_object<W: Write + ?Sized>(
        &self,
        out: &mut W,
        original: &Self,
        level: FeatureLevel,
    ) -> io::Result<()> {
        if self.sprite_index != original.sprite_index {
            write_field(out, "Sprite number", self.sprite_index)?;
        }
        if self.frame_index != original.frame_index || self.bright != original.bright {
            write_field(out, "Sprite subnumber", self.sprite_subnumber())?;
        }
        if self.next_state_index != original.next_state_index {
            write_field(out, "Next frame", self.next_state_index)?;
        }
        if self.duration != original.duration {
            write_field(out, "Duration", self.duration)?;
        }
        if self.misc1 != original.misc1 {
            write_field(out, "Unknown 1", self.misc1)?;
        }
        if self.misc2 != original.misc2 {
            write_field(out, "Unknown 2", self.misc2)?;
        }

        if level.supports(FeatureLevel::Mbf21) {
            for (i, (arg, orig)) in self.args.iter().zip(original.args.iter()).enumerate() {
                if arg != orig {
                    write_field(out, &format!("Args{}", i + 1), arg)?;
                }
            }
            if self.flags != original.flags {
                write_field(out, "MBF21 Bits", self.flags)?;
            }
        }

        self.custom.write_diff(out, &original.custom)
    }
}
