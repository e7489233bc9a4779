//! Plugins: services with an ordered, idempotent load/unload lifecycle.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::error::DiError;

mod manager;

pub use manager::PluginManager;

/// Priority of a plugin that does not override [`Plugin::priority`].
pub const DEFAULT_PRIORITY: u32 = 9999;

/// Failure reported by a plugin hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("{0}")]
    Failed(String),
    #[error("panicked: {0}")]
    Panicked(String),
}

impl PluginError {
    pub fn failed(reason: impl Into<String>) -> Self {
        PluginError::Failed(reason.into())
    }
}

/// A service that takes part in the host's load/unload passes.
///
/// Plugins are registered like any other service under the `dyn Plugin`
/// contract. Load state is tracked by the [`PluginManager`], so hooks only
/// run on real transitions: `on_load` while unloaded, `on_unload` while
/// loaded. A hook that returns an error or panics leaves the state unchanged.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Plugin, PluginError};
///
/// struct Toolbar;
///
/// impl Plugin for Toolbar {
///     fn name(&self) -> &str { "toolbar" }
///     fn author(&self) -> &str { "ui team" }
///     fn version(&self) -> &str { "1.4.0" }
///     fn priority(&self) -> u32 { 10 }
///     fn is_unloadable(&self) -> bool { false }
///     fn on_load(&self) -> Result<(), PluginError> { Ok(()) }
/// }
/// ```
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Fully qualified implementation type, for diagnostics.
    fn qualified_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn author(&self) -> &str {
        ""
    }

    fn version(&self) -> &str {
        ""
    }

    fn description(&self) -> &str {
        ""
    }

    /// Lower values load earlier within the same unloadability group.
    fn priority(&self) -> u32 {
        DEFAULT_PRIORITY
    }

    /// Plugins that are not unloadable load before all unloadable ones.
    fn is_unloadable(&self) -> bool {
        true
    }

    fn on_load(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_unload(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Snapshot of one plugin and its identity metadata.
#[derive(Clone)]
pub struct PluginRecord {
    pub plugin: Arc<dyn Plugin>,
    /// Registration index among the `dyn Plugin` descriptors
    pub descriptor: usize,
    pub name: String,
    pub qualified_name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    /// Module file the plugin was scanned from
    pub source: Option<PathBuf>,
    pub priority: u32,
    pub unloadable: bool,
    pub loaded: bool,
}

impl PluginRecord {
    pub(crate) fn new(
        descriptor: usize,
        plugin: Arc<dyn Plugin>,
        source: Option<PathBuf>,
        loaded: bool,
    ) -> Self {
        Self {
            descriptor,
            name: plugin.name().to_string(),
            qualified_name: plugin.qualified_name().to_string(),
            author: plugin.author().to_string(),
            version: plugin.version().to_string(),
            description: plugin.description().to_string(),
            source,
            priority: plugin.priority(),
            unloadable: plugin.is_unloadable(),
            plugin,
            loaded,
        }
    }
}

impl fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRecord")
            .field("descriptor", &self.descriptor)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("source", &self.source)
            .field("priority", &self.priority)
            .field("unloadable", &self.unloadable)
            .field("loaded", &self.loaded)
            .finish()
    }
}

/// A plugin that did not transition during a pass.
#[derive(Debug, Clone)]
pub struct PluginFailure {
    pub record: PluginRecord,
    pub error: DiError,
}

/// Outcome of a load or unload pass.
#[derive(Debug, Clone, Default)]
pub struct PluginPassReport {
    /// Plugins that transitioned, in the order they were attempted
    pub transitioned: Vec<PluginRecord>,
    /// Plugins whose hook failed or panicked
    pub failures: Vec<PluginFailure>,
    /// Plugin descriptors that could not be resolved at all
    pub unresolved: Vec<DiError>,
}

impl PluginPassReport {
    pub fn transitioned_names(&self) -> Vec<&str> {
        self.transitioned.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.record.name.as_str()).collect()
    }

    /// True when nothing failed and every descriptor resolved.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }
}
