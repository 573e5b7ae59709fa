//! Sound effect records

use std::io::{self, Write};

use crate::feature::FeatureLevel;

use super::{CustomValues, DehObject, EntityKind, write_field};

/// A sound effect entry
#[derive(Debug, Clone, Default)]
pub struct DehSound {
    /// Playback priority
    pub priority: i32,
    /// Whether only one instance may play at a time
    pub singular: bool,
    force_output: bool,
    custom: CustomValues,
}

impl DehSound {
    /// Create a sound entry
    pub fn new(priority: i32, singular: bool) -> Self {
        Self {
            priority,
            singular,
            ..Self::default()
        }
    }
}

impl PartialEq for DehSound {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.singular == other.singular
    }
}

impl DehObject for DehSound {
    const KIND: EntityKind = EntityKind::Sound;

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
        if self.force_output || self.priority != original.priority {
            write_field(out, "Value", self.priority)?;
        }
        if self.force_output || self.singular != original.singular {
            write_field(out, "Zero/One", i32::from(self.singular))?;
        }
        self.custom.write_diff(out, &original.custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_sound_writes_all_fields() {
        let original = DehSound::new(64, false);
        let mut sound = original.clone();
        sound.set_force_output(true);
        assert_eq!(sound, original);

        let mut out = Vec::new();
        sound
            .write_object(&mut out, &original, FeatureLevel::Doom19)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Value = 64\r\nZero/One = 0\r\n"
        );
    }
}
