//! Shared baseline instances, one per dialect

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::dialect::Dialect;
use crate::error::{Error, Result};

use super::SourcePatch;

/// Loads each dialect's baseline at most once and hands out shared copies
///
/// Definitions are read from `<dir>/<baseline name>.yaml`, `.yml` or
/// `.json`. Baselines can also be registered directly, which is how tests
/// and embedders without definition files use it.
#[derive(Debug, Default)]
pub struct BaselineSet {
    dir: Option<PathBuf>,
    loaded: HashMap<Dialect, Arc<SourcePatch>>,
}

impl BaselineSet {
    /// Create an empty set with no definition directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set that loads definitions from a directory
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
            loaded: HashMap::new(),
        }
    }

    /// Register a baseline for a dialect, replacing any previous one
    pub fn insert(&mut self, dialect: Dialect, patch: SourcePatch) -> Arc<SourcePatch> {
        let patch = Arc::new(patch);
        self.loaded.insert(dialect, Arc::clone(&patch));
        patch
    }

    /// Whether a dialect's baseline is already available
    pub fn is_loaded(&self, dialect: Dialect) -> bool {
        self.loaded.contains_key(&dialect)
    }

    /// Shared baseline of a dialect, loading it on first use
    pub fn get(&mut self, dialect: Dialect) -> Result<Arc<SourcePatch>> {
        if let Some(patch) = self.loaded.get(&dialect) {
            return Ok(Arc::clone(patch));
        }

        let path = self.definition_path(dialect)?;
        info!("Loading {} baseline from {}", dialect, path.display());
        let patch = load_definition(&path)?;
        debug!("Baseline {} ready", patch.name());
        Ok(self.insert(dialect, patch))
    }

    fn definition_path(&self, dialect: Dialect) -> Result<PathBuf> {
        let dir = self.dir.as_ref().ok_or_else(|| {
            Error::baseline(format!("no baseline registered for {dialect}"))
        })?;
        let stem = dialect.baseline_name();
        ["yaml", "yml", "json"]
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                Error::baseline(format!(
                    "no baseline definition for {dialect} in {}",
                    dir.display()
                ))
            })
    }
}

#[cfg(feature = "serde")]
fn load_definition(path: &Path) -> Result<SourcePatch> {
    super::loader::BaselineDefinition::from_file(path)?.to_source_patch()
}

#[cfg(not(feature = "serde"))]
fn load_definition(path: &Path) -> Result<SourcePatch> {
    Err(Error::baseline(format!(
        "cannot read {} without the serde feature",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_baseline_is_shared() {
        let mut set = BaselineSet::new();
        set.insert(Dialect::Boom, SourcePatch::builder("boom").build().unwrap());
        let a = set.get(Dialect::Boom).unwrap();
        let b = set.get(Dialect::Boom).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_baseline() {
        let mut set = BaselineSet::new();
        assert!(matches!(set.get(Dialect::Mbf21), Err(Error::Baseline(_))));
    }
}
