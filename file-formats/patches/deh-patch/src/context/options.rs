//! Construction options for patch contexts

/// Options applied when a [`PatchContext`](super::PatchContext) is created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Initial state of the double-free safety switch
    pub state_safety: bool,
    /// States protected in addition to `0` and `1`
    pub extra_protected_states: Vec<i32>,
}

impl ContextOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the safety switch
    pub fn with_state_safety(mut self, enabled: bool) -> Self {
        self.state_safety = enabled;
        self
    }

    /// Protect an additional state at construction
    pub fn with_protected_state(mut self, index: i32) -> Self {
        self.extra_protected_states.push(index);
        self
    }
}
