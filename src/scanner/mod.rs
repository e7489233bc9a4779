//! Capability scanning: enumerating candidate types from module locations.

use std::path::{Path, PathBuf};

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::candidate::CandidateType;
use crate::key::Key;

mod loader;

pub use loader::{DynamicLibraryLoader, ModuleEntryPoint, ModuleLoader, ENTRY_SYMBOL};

fn default_pattern() -> String {
    format!("*.{}", std::env::consts::DLL_EXTENSION)
}

/// A directory searched for loadable modules.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::ModuleLocation;
///
/// trait Plugin: Send + Sync {}
///
/// let location = ModuleLocation::new("plugins")
///     .with_pattern("*_ext.so")
///     .recursive()
///     .requesting::<dyn Plugin>();
/// assert_eq!(location.pattern, "*_ext.so");
/// assert!(location.recursive);
/// assert_eq!(location.requested.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct ModuleLocation {
    pub directory: PathBuf,
    /// Glob matched against file names, defaults to the platform's dynamic library extension
    #[cfg_attr(feature = "config", serde(default = "default_pattern"))]
    pub pattern: String,
    #[cfg_attr(feature = "config", serde(default))]
    pub recursive: bool,
    /// Contracts attached to every candidate found here
    #[cfg_attr(feature = "config", serde(skip))]
    pub requested: Vec<Key>,
}

impl ModuleLocation {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            pattern: default_pattern(),
            recursive: false,
            requested: Vec::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    pub fn requesting<C: ?Sized + 'static>(mut self) -> Self {
        let contract = Key::of::<C>();
        if !self.requested.contains(&contract) {
            self.requested.push(contract);
        }
        self
    }
}

/// Enumerates candidate types from module locations.
///
/// Scanning never fails as a whole. Missing directories are skipped, and a
/// module that fails to load is logged and skipped while the rest of the
/// location is still scanned. Candidates are returned in location order, then
/// file-name order within a location, with no de-duplication. Each candidate
/// remembers the module file it came from.
pub struct Scanner<'a> {
    loader: &'a dyn ModuleLoader,
}

impl<'a> Scanner<'a> {
    pub fn new(loader: &'a dyn ModuleLoader) -> Self {
        Self { loader }
    }

    pub fn scan(&self, locations: &[ModuleLocation]) -> Vec<CandidateType> {
        locations
            .iter()
            .flat_map(|location| self.scan_location(location))
            .collect()
    }

    pub fn scan_location(&self, location: &ModuleLocation) -> Vec<CandidateType> {
        let mut candidates = Vec::new();
        for path in module_paths(location) {
            match self.loader.load(&path) {
                Ok(found) => {
                    candidates.extend(found.into_iter().map(|mut candidate| {
                        candidate.set_source(&path);
                        for contract in &location.requested {
                            candidate.request(*contract);
                        }
                        candidate
                    }));
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping module that failed to load");
                }
            }
        }
        tracing::debug!(
            directory = %location.directory.display(),
            candidates = candidates.len(),
            "scanned module location"
        );
        candidates
    }
}

/// Module files under `location`, sorted by file name.
pub(crate) fn module_paths(location: &ModuleLocation) -> Vec<PathBuf> {
    if !location.directory.is_dir() {
        tracing::debug!(
            directory = %location.directory.display(),
            "module location does not exist, skipping"
        );
        return Vec::new();
    }

    let pattern = match glob::Pattern::new(&location.pattern) {
        Ok(pattern) => pattern,
        Err(error) => {
            tracing::warn!(pattern = %location.pattern, %error, "invalid module pattern");
            return Vec::new();
        }
    };

    let max_depth = if location.recursive { usize::MAX } else { 1 };
    WalkDir::new(&location.directory)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::warn!(%error, "failed to read module location entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matches_name(&pattern, entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

fn matches_name(pattern: &glob::Pattern, path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.matches(name))
}
