//! Command implementations

pub mod baseline;
pub mod patch;
