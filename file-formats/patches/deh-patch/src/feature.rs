//! Capability tiers shared by dialects, entities and action pointers

use std::fmt;

/// Ordered feature tiers of the DeHackEd family
///
/// A dialect declares the highest tier it understands; it supports every
/// tier less than or equal to that one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FeatureLevel {
    /// Vanilla Doom 1.9 executable patching
    #[default]
    Doom19,
    /// Boom extensions (`[CODEPTR]`, `[STRINGS]`, `[PARS]`)
    Boom,
    /// Marine's Best Friend
    Mbf,
    /// DEHEXTRA / DHE extended tables
    Extended,
    /// MBF21 (state args, MBF21 bits, fast speed, melee range)
    Mbf21,
    /// DSDHacked open-ended sprite, sound, state and thing tables
    DsdHacked,
    /// ID24 (unbounded, possibly negative, indices)
    Id24,
}

impl FeatureLevel {
    /// Check whether this tier includes `other`
    pub fn supports(self, other: FeatureLevel) -> bool {
        other <= self
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureLevel::Doom19 => write!(f, "Doom 1.9"),
            FeatureLevel::Boom => write!(f, "Boom"),
            FeatureLevel::Mbf => write!(f, "MBF"),
            FeatureLevel::Extended => write!(f, "Extended"),
            FeatureLevel::Mbf21 => write!(f, "MBF21"),
            FeatureLevel::DsdHacked => write!(f, "DSDHacked"),
            FeatureLevel::Id24 => write!(f, "ID24"),
        }
    }
}

/// Ordered action-pointer vocabularies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ActionPointerType {
    /// Vanilla code pointers
    #[default]
    Doom19,
    /// MBF code pointers (misc1/misc2 parameters)
    Mbf,
    /// MBF21 code pointers (state args)
    Mbf21,
}

impl ActionPointerType {
    /// Check whether this vocabulary includes `other`
    pub fn supports(self, other: ActionPointerType) -> bool {
        other <= self
    }

    /// Whether pointers of this type read their parameters from state args
    pub fn uses_args(self) -> bool {
        self == ActionPointerType::Mbf21
    }
}

impl fmt::Display for ActionPointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPointerType::Doom19 => write!(f, "Doom 1.9"),
            ActionPointerType::Mbf => write!(f, "MBF"),
            ActionPointerType::Mbf21 => write!(f, "MBF21"),
        }
    }
}
