//! Target engine dialects

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::feature::{ActionPointerType, FeatureLevel};

/// String handling of a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringModel {
    /// Fixed executable string table; `enforce_length` rejects longer values
    Indexed {
        /// Reject replacements longer than the original
        enforce_length: bool,
    },
    /// Key/value `[STRINGS]` with par times
    Keyed,
    /// Key/value strings plus sound and sprite names minted on demand
    KeyedDynamicNames,
}

/// How the free-state counters are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FreeStateAccounting {
    /// Incremental counters; range frees apply index by index
    Counted,
    /// Counts read from the bitset; range frees are checked then applied whole
    Bitset,
}

/// Per-dialect behaviour carried as data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialectProfile {
    /// Value of the `Doom version` header line
    pub doom_version: i32,
    /// Highest supported feature tier
    pub feature_level: FeatureLevel,
    /// Highest supported action-pointer vocabulary
    pub pointer_type: ActionPointerType,
    /// String handling
    pub strings: StringModel,
    /// Free-state bookkeeping
    pub accounting: FreeStateAccounting,
    /// Name of the baseline definition
    pub baseline: &'static str,
}

/// Supported DeHackEd dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dialect {
    /// Doom 1.9
    Doom19,
    /// Ultimate Doom 1.9
    UltimateDoom19,
    /// Doom re-release (Unity port), no string length limit
    DoomUnity,
    /// Boom
    Boom,
    /// Marine's Best Friend
    Mbf,
    /// DEHEXTRA extended tables
    Extended,
    /// MBF21
    Mbf21,
    /// DSDHacked
    DsdHacked,
    /// ID24
    Id24,
}

impl Dialect {
    /// Every dialect, oldest first
    pub const ALL: [Dialect; 9] = [
        Dialect::Doom19,
        Dialect::UltimateDoom19,
        Dialect::DoomUnity,
        Dialect::Boom,
        Dialect::Mbf,
        Dialect::Extended,
        Dialect::Mbf21,
        Dialect::DsdHacked,
        Dialect::Id24,
    ];

    /// Behaviour table of the dialect
    pub fn profile(self) -> DialectProfile {
        use FreeStateAccounting::{Bitset, Counted};

        let (doom_version, feature_level, pointer_type, strings, accounting, baseline) = match self {
            Dialect::Doom19 => (
                19,
                FeatureLevel::Doom19,
                ActionPointerType::Doom19,
                StringModel::Indexed { enforce_length: true },
                Counted,
                "doom19",
            ),
            Dialect::UltimateDoom19 => (
                19,
                FeatureLevel::Doom19,
                ActionPointerType::Doom19,
                StringModel::Indexed { enforce_length: true },
                Counted,
                "udoom19",
            ),
            Dialect::DoomUnity => (
                19,
                FeatureLevel::Doom19,
                ActionPointerType::Doom19,
                StringModel::Indexed { enforce_length: false },
                Counted,
                "doomunity",
            ),
            Dialect::Boom => (
                21,
                FeatureLevel::Boom,
                ActionPointerType::Doom19,
                StringModel::Keyed,
                Counted,
                "boom",
            ),
            Dialect::Mbf => (
                21,
                FeatureLevel::Mbf,
                ActionPointerType::Mbf,
                StringModel::Keyed,
                Counted,
                "mbf",
            ),
            Dialect::Extended => (
                21,
                FeatureLevel::Extended,
                ActionPointerType::Mbf,
                StringModel::Keyed,
                Counted,
                "extended",
            ),
            Dialect::Mbf21 => (
                21,
                FeatureLevel::Mbf21,
                ActionPointerType::Mbf21,
                StringModel::Keyed,
                Counted,
                "mbf21",
            ),
            Dialect::DsdHacked => (
                2021,
                FeatureLevel::DsdHacked,
                ActionPointerType::Mbf21,
                StringModel::KeyedDynamicNames,
                Bitset,
                "dsdhacked",
            ),
            Dialect::Id24 => (
                2024,
                FeatureLevel::Id24,
                ActionPointerType::Mbf21,
                StringModel::KeyedDynamicNames,
                Bitset,
                "id24",
            ),
        };

        DialectProfile {
            doom_version,
            feature_level,
            pointer_type,
            strings,
            accounting,
            baseline,
        }
    }

    /// Value of the `Doom version` header line
    pub fn doom_version(self) -> i32 {
        self.profile().doom_version
    }

    /// Highest supported feature tier
    pub fn feature_level(self) -> FeatureLevel {
        self.profile().feature_level
    }

    /// Highest supported action-pointer vocabulary
    pub fn action_pointer_type(self) -> ActionPointerType {
        self.profile().pointer_type
    }

    /// Name of the baseline definition, also the file stem it is loaded from
    pub fn baseline_name(self) -> &'static str {
        self.profile().baseline
    }

    /// Whether the dialect uses the fixed Doom 1.9 string table
    pub fn is_doom19_family(self) -> bool {
        matches!(self.profile().strings, StringModel::Indexed { .. })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Doom19 => write!(f, "Doom 1.9"),
            Dialect::UltimateDoom19 => write!(f, "Ultimate Doom 1.9"),
            Dialect::DoomUnity => write!(f, "Doom Unity"),
            Dialect::Boom => write!(f, "Boom"),
            Dialect::Mbf => write!(f, "MBF"),
            Dialect::Extended => write!(f, "Extended"),
            Dialect::Mbf21 => write!(f, "MBF21"),
            Dialect::DsdHacked => write!(f, "DSDHacked"),
            Dialect::Id24 => write!(f, "ID24"),
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doom19" | "doom" | "1.9" => Ok(Dialect::Doom19),
            "udoom19" | "ultimatedoom19" | "ultimate" => Ok(Dialect::UltimateDoom19),
            "doomunity" | "unity" => Ok(Dialect::DoomUnity),
            "boom" => Ok(Dialect::Boom),
            "mbf" => Ok(Dialect::Mbf),
            "extended" | "dehextra" => Ok(Dialect::Extended),
            "mbf21" => Ok(Dialect::Mbf21),
            "dsdhacked" => Ok(Dialect::DsdHacked),
            "id24" => Ok(Dialect::Id24),
            _ => Err(Error::invalid_argument(format!("unknown dialect: {s}"))),
        }
    }
}
