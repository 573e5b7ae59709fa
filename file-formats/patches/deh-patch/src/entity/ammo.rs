//! Ammo type records

use std::io::{self, Write};

use crate::feature::FeatureLevel;

use super::{CustomValues, DehObject, EntityKind, write_field};

/// An ammo type
#[derive(Debug, Clone, Default)]
pub struct DehAmmo {
    /// Display name, written in the block header only
    pub name: String,
    /// Maximum carried amount
    pub max: i32,
    /// Amount given by a small pickup
    pub pickup: i32,
    force_output: bool,
    custom: CustomValues,
}

impl DehAmmo {
    /// Create an ammo type
    pub fn new<S: Into<String>>(name: S, max: i32, pickup: i32) -> Self {
        Self {
            name: name.into(),
            max,
            pickup,
            ..Self::default()
        }
    }
}

impl PartialEq for DehAmmo {
    fn eq(&self, other: &Self) -> bool {
        self.max == other.max && self.pickup == other.pickup
    }
}

impl DehObject for DehAmmo {
    const KIND: EntityKind = EntityKind::Ammo;

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
        _level: FeatureLevel,
    ) -> io::Result<()> {
        if self.max != original.max {
            write_field(out, "Max ammo", self.max)?;
        }
        if self.pickup != original.pickup {
            write_field(out, "Per ammo", self.pickup)?;
        }
        self.custom.write_diff(out, &original.custom)
    }
}
