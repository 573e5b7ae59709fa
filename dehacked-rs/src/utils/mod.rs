//! Shared utilities for the dehacked-rs CLI

pub mod table;

pub use table::*;
