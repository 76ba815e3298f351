//! Fixed, ordered list of catalog image paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, ensure};

/// Placeholder substituted with the 1-based page number.
pub const PAGE_NUMBER_PLACEHOLDER: &str = "{n}";

/// Immutable, ordered asset list shared between the preloader and viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    entries: Arc<[PathBuf]>,
}

impl AssetManifest {
    /// Wrap an explicit list of paths.
    #[must_use]
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Expand `pattern` for pages `1..=count` under `root`.
    ///
    /// `images/test{n}.png` with a count of 3 yields `test1.png` through
    /// `test3.png`.
    ///
    /// # Errors
    /// Returns an error if `pattern` has no `{n}` placeholder.
    pub fn from_pattern(root: &Path, pattern: &str, count: usize) -> Result<Self> {
        ensure!(
            pattern.contains(PAGE_NUMBER_PLACEHOLDER),
            "image pattern {:?} must contain {}",
            pattern,
            PAGE_NUMBER_PLACEHOLDER
        );
        let entries = (1..=count)
            .map(|n| root.join(pattern.replace(PAGE_NUMBER_PLACEHOLDER, &n.to_string())))
            .collect();
        Ok(Self::new(entries))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(PathBuf::as_path)
    }
}
