//! Entity value records edited by a patch context
//!
//! Every record is a plain value: the baseline owns one copy per index, the
//! context owns a shadow copy once an index is touched, and the writer diffs
//! the two through [`DehObject::write_object`].

use std::fmt;
use std::io::{self, Write};

use crate::feature::FeatureLevel;

pub mod ammo;
pub mod custom;
pub mod labels;
pub mod misc;
pub mod pointer;
pub mod sound;
pub mod state;
pub mod thing;
pub mod weapon;

pub use ammo::DehAmmo;
pub use custom::{CustomBitflag, CustomProperty, CustomValue, CustomValues, ValueType};
pub use labels::StateLabels;
pub use misc::DehMiscellany;
pub use pointer::DehActionPointer;
pub use sound::DehSound;
pub use state::DehState;
pub use thing::DehThing;
pub use weapon::DehWeapon;

/// Line terminator of the DeHackEd format
pub const CRLF: &str = "\r\n";

/// Kinds of entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntityKind {
    /// Monster, projectile or decoration
    Thing,
    /// Player weapon
    Weapon,
    /// Ammo type
    Ammo,
    /// Sound effect
    Sound,
    /// Animation state (frame)
    State,
    /// Miscellaneous engine values
    Misc,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Thing => write!(f, "Thing"),
            EntityKind::Weapon => write!(f, "Weapon"),
            EntityKind::Ammo => write!(f, "Ammo"),
            EntityKind::Sound => write!(f, "Sound"),
            EntityKind::State => write!(f, "State"),
            EntityKind::Misc => write!(f, "Misc"),
        }
    }
}

/// Common behaviour of all patchable entity records
pub trait DehObject: Clone + PartialEq + fmt::Debug {
    /// Table this record lives in
    const KIND: EntityKind;

    /// Replace every field with the fields of `source`
    fn copy_from(&mut self, source: &Self) {
        self.clone_from(source);
    }

    /// Whether the record must be written even when equal to its baseline
    fn is_force_output(&self) -> bool;

    /// Set the sticky force-output flag
    fn set_force_output(&mut self, force: bool);

    /// User-defined property values carried by this record
    fn custom_values(&self) -> &CustomValues;

    /// Mutable access to the user-defined property values
    fn custom_values_mut(&mut self) -> &mut CustomValues;

    /// Whether any user-defined property value is set
    fn has_custom_properties(&self) -> bool {
        !self.custom_values().is_empty()
    }

    /// Whether the record carries editor keys
    fn has_editor_keys(&self) -> bool {
        false
    }

    /// Write the body lines that differ from `original`, gated by `level`
    fn write_object<W: Write + ?Sized>(
        &self,
        out: &mut W,
        original: &Self,
        level: FeatureLevel,
    ) -> io::Result<()>;
}

/// Write one `Key = value` body line
pub(crate) fn write_field<W: Write + ?Sized>(
    out: &mut W,
    key: &str,
    value: impl fmt::Display,
) -> io::Result<()> {
    write!(out, "{key} = {value}{CRLF}")
}
