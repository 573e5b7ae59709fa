//! Action pointers (state code functions)

use std::fmt;

use crate::feature::ActionPointerType;

/// Mnemonic written for a state with no action
pub const NULL_MNEMONIC: &str = "NULL";

/// A named engine behaviour attachable to a state
///
/// Pointers are shared between baseline and overlay through `Arc` and never
/// edited in place; replacing a state's action swaps the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DehActionPointer {
    /// Name without the `A_` prefix, e.g. `Chase`
    pub mnemonic: String,
    /// Vocabulary the pointer belongs to
    pub kind: ActionPointerType,
    /// Whether the pointer is meant for player weapon states
    pub weapon: bool,
    /// Vanilla state that hosts this pointer, used by `Codep Frame`
    pub frame: i32,
}

impl DehActionPointer {
    /// Create a pointer record
    pub fn new<S: Into<String>>(mnemonic: S, kind: ActionPointerType, weapon: bool, frame: i32) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            kind,
            weapon,
            frame,
        }
    }

    /// Whether this record is the explicit no-op pointer
    pub fn is_null(&self) -> bool {
        self.mnemonic.eq_ignore_ascii_case(NULL_MNEMONIC)
    }

    /// Case-insensitive mnemonic comparison
    pub fn same_action(&self, other: &DehActionPointer) -> bool {
        self.mnemonic.eq_ignore_ascii_case(&other.mnemonic)
    }
}

impl fmt::Display for DehActionPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)
    }
}
