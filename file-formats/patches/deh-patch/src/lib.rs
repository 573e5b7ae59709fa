//! # deh_patch - DeHackEd Patch Engine
//!
//! Patch context and resource allocator for DeHackEd patches, the text
//! format Doom source ports read to alter monsters, weapons, sounds, frames
//! and engine values without touching the executable.
//!
//! ## Features
//!
//! - Doom 1.9, Ultimate Doom, Doom Unity, Boom, MBF, Extended, MBF21,
//!   DSDHacked and ID24 dialects
//! - Copy-on-write overlay over an immutable, shared baseline
//! - Free/protected state allocator with connected-state free, transform and
//!   copy operations
//! - Diff-minimal DeHackEd output with dialect extension sections
//! - Baselines loaded from YAML or JSON definitions
//!
//! ## Examples
//!
//! ### Freeing and reusing states
//!
//! ```no_run
//! use deh_patch::{BaselineSet, ContextOptions, Dialect, PatchContext};
//!
//! # fn main() -> Result<(), deh_patch::Error> {
//! let mut baselines = BaselineSet::from_dir("baselines");
//! let baseline = baselines.get(Dialect::Doom19)?;
//! let mut ctx = PatchContext::new(Dialect::Doom19, baseline, ContextOptions::default());
//!
//! // Give up the Cyberdemon's animations
//! let freed = ctx.free_thing_states(21)?;
//! println!("{freed} states freed, {} free in total", ctx.free_state_count());
//!
//! // Give the Imp a copy of the Baron's
//! match ctx.copy_thing_states(12, 15, 0)? {
//!     Some(count) => println!("copied {count} states"),
//!     None => eprintln!("not enough free states"),
//! }
//!
//! ctx.write_patch(std::io::stdout(), "Imps are barons now")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Building a baseline in code
//!
//! ```
//! use deh_patch::{SourcePatch, entity::{DehState, DehThing}};
//!
//! # fn main() -> Result<(), deh_patch::Error> {
//! let patch = SourcePatch::builder("tiny")
//!     .thing(DehThing::named("Player"))
//!     .state(DehState::new(0, 0, false, 0, -1), None)
//!     .state(DehState::new(0, 0, false, 1, -1), None)
//!     .build()?;
//! assert_eq!(patch.state_count(), 2);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod baseline;
pub mod context;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod feature;
pub mod range_map;
pub mod strings;
pub mod writer;

pub use baseline::{BaselineSet, EpisodeMap, SourcePatch, SourcePatchBuilder};
pub use context::{Actor, ContextOptions, PatchContext};
pub use dialect::Dialect;
pub use entity::EntityKind;
pub use error::{Error, Result};
pub use feature::{ActionPointerType, FeatureLevel};
pub use range_map::RangeBoolMap;
pub use writer::PatchWriter;
