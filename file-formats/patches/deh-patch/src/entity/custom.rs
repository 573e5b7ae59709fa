//! User-defined entity properties and flag mnemonics

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use crate::error::{Error, Result};

use super::write_field;

/// Value domain of a user-defined property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueType {
    /// 0 or 1
    Bool,
    /// 0 to 255
    UByte,
    /// -128 to 127
    Byte,
    /// -32768 to 32767
    Short,
    /// 0 to 65535
    UShort,
    /// Any 32-bit integer
    Int,
    /// Non-negative 32-bit integer
    UInt,
    /// Degrees, -359 to 359
    AngleInt,
    /// Degrees, 0 to 359
    AngleUInt,
    /// 16.16 fixed point angle, strictly inside one turn
    AngleFixed,
    /// 16.16 fixed point
    Fixed,
    /// State index
    State,
    /// Thing index
    Thing,
    /// Thing index of a projectile
    ThingMissile,
    /// Weapon index
    Weapon,
    /// Sound index
    Sound,
    /// Bit field
    Flags,
    /// Free text
    String,
}

impl ValueType {
    /// Inclusive bounds for integer-valued types
    pub fn bounds(self) -> Option<(i32, i32)> {
        match self {
            ValueType::Bool => Some((0, 1)),
            ValueType::UByte => Some((0, 255)),
            ValueType::Byte => Some((-128, 127)),
            ValueType::Short => Some((-32768, 32767)),
            ValueType::UShort => Some((0, 65535)),
            ValueType::Int | ValueType::Fixed | ValueType::Flags => Some((i32::MIN, i32::MAX)),
            ValueType::AngleInt => Some((-359, 359)),
            ValueType::AngleUInt => Some((0, 359)),
            ValueType::AngleFixed => Some(((-360 << 16) + 1, (360 << 16) - 1)),
            ValueType::UInt
            | ValueType::State
            | ValueType::Thing
            | ValueType::ThingMissile
            | ValueType::Weapon
            | ValueType::Sound => Some((0, i32::MAX)),
            ValueType::String => None,
        }
    }

    /// Check a value against this type
    pub fn accepts(self, value: &CustomValue) -> bool {
        match (self.bounds(), value) {
            (Some((min, max)), CustomValue::Int(v)) => (min..=max).contains(v),
            (None, CustomValue::Text(_)) => true,
            _ => false,
        }
    }
}

/// A user-defined property declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomProperty {
    /// Keyword used by the driver
    pub keyword: String,
    /// Field name written into the patch
    pub dehacked_label: String,
    /// Accepted values
    pub value_type: ValueType,
}

impl CustomProperty {
    /// Create a property declaration
    pub fn new<K: Into<String>, L: Into<String>>(
        keyword: K,
        dehacked_label: L,
        value_type: ValueType,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            dehacked_label: dehacked_label.into(),
            value_type,
        }
    }
}

/// A user-defined flag mnemonic bound to a property bit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBitflag {
    /// Flag name used by the driver
    pub mnemonic: String,
    /// Keyword of the property the bit belongs to
    pub property: String,
    /// Bit value
    pub value: i32,
}

impl CustomBitflag {
    /// Create a flag mnemonic
    pub fn new<M: Into<String>, P: Into<String>>(mnemonic: M, property: P, value: i32) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            property: property.into(),
            value,
        }
    }
}

/// Value of a user-defined property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomValue {
    /// Integer valued
    Int(i32),
    /// Text valued
    Text(String),
}

impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomValue::Int(v) => write!(f, "{v}"),
            CustomValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    label: String,
    value: CustomValue,
}

/// Property values set on one entity, keyed by lower-case keyword
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomValues {
    values: BTreeMap<String, Slot>,
}

impl CustomValues {
    /// Set a value after checking it against the declaration
    pub fn set(&mut self, property: &CustomProperty, value: CustomValue) -> Result<()> {
        if !property.value_type.accepts(&value) {
            return Err(Error::invalid_argument(format!(
                "value {value} is not valid for property {} ({:?})",
                property.keyword, property.value_type
            )));
        }
        self.values.insert(
            property.keyword.to_ascii_lowercase(),
            Slot {
                label: property.dehacked_label.clone(),
                value,
            },
        );
        Ok(())
    }

    /// Value of a property, by keyword
    pub fn get(&self, keyword: &str) -> Option<&CustomValue> {
        self.values
            .get(&keyword.to_ascii_lowercase())
            .map(|slot| &slot.value)
    }

    /// Remove a value, by keyword
    pub fn remove(&mut self, keyword: &str) -> Option<CustomValue> {
        self.values
            .remove(&keyword.to_ascii_lowercase())
            .map(|slot| slot.value)
    }

    /// Whether no value is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values set
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Write every value not present, or different, in `original`
    pub fn write_diff<W: Write + ?Sized>(&self, out: &mut W, original: &CustomValues) -> io::Result<()> {
        for (keyword, slot) in &self.values {
            if original.values.get(keyword).map(|o| &o.value) != Some(&slot.value) {
                write_field(out, &slot.label, &slot.value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_bounds() {
        assert!(ValueType::UByte.accepts(&CustomValue::Int(255)));
        assert!(!ValueType::UByte.accepts(&CustomValue::Int(256)));
        assert!(!ValueType::AngleUInt.accepts(&CustomValue::Int(-1)));
        assert!(ValueType::String.accepts(&CustomValue::Text("hello".into())));
        assert!(!ValueType::Int.accepts(&CustomValue::Text("12".into())));
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let prop = CustomProperty::new("gibhealth", "Gib health", ValueType::Short);
        let mut values = CustomValues::default();
        assert!(values.set(&prop, CustomValue::Int(40000)).is_err());
        assert!(values.is_empty());
        values.set(&prop, CustomValue::Int(-50)).unwrap();
        assert_eq!(values.get("GibHealth"), Some(&CustomValue::Int(-50)));
    }

    #[test]
    fn test_write_diff_skips_unchanged() {
        let a = CustomProperty::new("a", "Alpha", ValueType::Int);
        let b = CustomProperty::new("b", "Beta", ValueType::Int);
        let mut original = CustomValues::default();
        original.set(&a, CustomValue::Int(1)).unwrap();
        let mut edited = original.clone();
        edited.set(&b, CustomValue::Int(2)).unwrap();

        let mut out = Vec::new();
        edited.write_diff(&mut out, &original).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Beta = 2\r\n");
    }
}
