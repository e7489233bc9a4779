//! Ordered load/unload passes over the registered plugins.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Plugin, PluginError, PluginFailure, PluginPassReport, PluginRecord};
use crate::error::{DiError, DiResult};
use crate::internal::panic_message;
use crate::key::Key;
use crate::provider::ServiceProvider;

/// Drives load/unload passes for every service registered as `dyn Plugin`.
///
/// Load state is kept per `dyn Plugin` descriptor. The first instance
/// resolved for a descriptor is kept for the manager's lifetime and reused by
/// every later pass, so a transient plugin loads once like a singleton does.
/// A descriptor that fails to resolve is retried on the next pass.
///
/// Passes are meant to run one at a time. Nothing prevents two concurrent
/// passes, but they may then attempt the same transition twice.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateType, Lifetime, Plugin, PluginManager, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Menu;
/// impl Plugin for Menu {
///     fn name(&self) -> &str { "menu" }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_candidate(
///     &CandidateType::of_default::<Menu>()
///         .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
///         .injectable::<dyn Plugin>(Lifetime::Transient)
///         .build(),
/// );
/// let plugins = PluginManager::new(services.build());
///
/// assert_eq!(plugins.load_all().transitioned_names(), vec!["menu"]);
/// assert!(plugins.load_all().transitioned.is_empty());
/// assert_eq!(plugins.unload_all().transitioned_names(), vec!["menu"]);
/// ```
#[derive(Clone)]
pub struct PluginManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    provider: ServiceProvider,
    table: Mutex<PluginTable>,
}

#[derive(Default)]
struct PluginTable {
    // Instance kept for each descriptor, by registration index
    pinned: Vec<Option<Arc<dyn Plugin>>>,
    // Loaded descriptor indices in load order
    loaded: Vec<usize>,
}

impl PluginTable {
    fn pinned(&self, descriptor: usize) -> Option<&Arc<dyn Plugin>> {
        self.pinned.get(descriptor).and_then(Option::as_ref)
    }

    fn is_loaded(&self, descriptor: usize) -> bool {
        self.loaded.contains(&descriptor)
    }
}

fn same_instance(a: &Arc<dyn Plugin>, b: &Arc<dyn Plugin>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl PluginManager {
    pub fn new(provider: ServiceProvider) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                provider,
                table: Mutex::new(PluginTable::default()),
            }),
        }
    }

    pub fn is_loaded(&self, plugin: &Arc<dyn Plugin>) -> bool {
        let table = self.inner.table.lock();
        table.loaded.iter().any(|&descriptor| {
            table
                .pinned(descriptor)
                .is_some_and(|loaded| same_instance(loaded, plugin))
        })
    }

    /// Number of plugins currently loaded.
    pub fn loaded_count(&self) -> usize {
        self.inner.table.lock().loaded.len()
    }

    /// Resolves the plugins and returns their records in load order.
    pub fn records(&self) -> Vec<PluginRecord> {
        let (mut records, _) = self.resolve_records();
        order_for_load(&mut records);
        records
    }

    /// Loads every unloaded plugin.
    ///
    /// Plugins that are not unloadable go first, then unloadable ones, each
    /// group by ascending priority with ties kept in registration order. A
    /// failing or panicking plugin is recorded in the report and the pass
    /// continues.
    pub fn load_all(&self) -> PluginPassReport {
        let (mut records, unresolved) = self.resolve_records();
        order_for_load(&mut records);

        let mut report = PluginPassReport {
            unresolved,
            ..Default::default()
        };
        for mut record in records {
            if self.inner.table.lock().is_loaded(record.descriptor) {
                tracing::debug!(plugin = %record.name, "plugin already loaded");
                continue;
            }
            let plugin = record.plugin.clone();
            match run_hook(&record, "load", || plugin.on_load()) {
                Ok(()) => {
                    let mut table = self.inner.table.lock();
                    if !table.is_loaded(record.descriptor) {
                        table.loaded.push(record.descriptor);
                    }
                    drop(table);
                    record.loaded = true;
                    tracing::info!(
                        plugin = %record.name,
                        version = %record.version,
                        author = %record.author,
                        source = ?record.source,
                        priority = record.priority,
                        "plugin loaded"
                    );
                    report.transitioned.push(record);
                }
                Err(error) => {
                    tracing::warn!(
                        plugin = %record.name,
                        version = %record.version,
                        %error,
                        "plugin failed to load"
                    );
                    report.failures.push(PluginFailure { record, error });
                }
            }
        }
        report
    }

    /// Unloads every loaded plugin in registration order.
    ///
    /// Only plugins this manager loaded are visited; nothing new is resolved.
    pub fn unload_all(&self) -> PluginPassReport {
        let mut report = PluginPassReport::default();
        for mut record in self.loaded_records() {
            let plugin = record.plugin.clone();
            match run_hook(&record, "unload", || plugin.on_unload()) {
                Ok(()) => {
                    self.inner
                        .table
                        .lock()
                        .loaded
                        .retain(|&descriptor| descriptor != record.descriptor);
                    record.loaded = false;
                    tracing::info!(
                        plugin = %record.name,
                        version = %record.version,
                        source = ?record.source,
                        "plugin unloaded"
                    );
                    report.transitioned.push(record);
                }
                Err(error) => {
                    tracing::warn!(
                        plugin = %record.name,
                        version = %record.version,
                        %error,
                        "plugin failed to unload"
                    );
                    report.failures.push(PluginFailure { record, error });
                }
            }
        }
        report
    }

    /// Runs [`load_all`](Self::load_all) on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn spawn_load_all(&self) -> tokio::task::JoinHandle<PluginPassReport> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.load_all())
    }

    /// Runs [`unload_all`](Self::unload_all) on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn spawn_unload_all(&self) -> tokio::task::JoinHandle<PluginPassReport> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.unload_all())
    }

    /// Records for every resolvable plugin in registration order, plus resolution errors.
    fn resolve_records(&self) -> (Vec<PluginRecord>, Vec<DiError>) {
        let key = Key::of::<dyn Plugin>();
        let count = self.inner.provider.descriptor_count(&key);
        let mut records = Vec::with_capacity(count);
        let mut unresolved = Vec::new();
        for descriptor in 0..count {
            match self.pinned_or_resolve(&key, descriptor) {
                Ok(plugin) => records.push(self.record(&key, descriptor, plugin)),
                Err(error) => {
                    tracing::warn!(descriptor, %error, "failed to resolve plugin");
                    unresolved.push(error);
                }
            }
        }
        (records, unresolved)
    }

    /// Records for the loaded plugins in registration order.
    fn loaded_records(&self) -> Vec<PluginRecord> {
        let key = Key::of::<dyn Plugin>();
        let mut loaded: Vec<(usize, Arc<dyn Plugin>)> = {
            let table = self.inner.table.lock();
            table
                .loaded
                .iter()
                .filter_map(|&descriptor| Some((descriptor, table.pinned(descriptor)?.clone())))
                .collect()
        };
        loaded.sort_by_key(|(descriptor, _)| *descriptor);
        loaded
            .into_iter()
            .map(|(descriptor, plugin)| self.record(&key, descriptor, plugin))
            .collect()
    }

    fn record(&self, key: &Key, descriptor: usize, plugin: Arc<dyn Plugin>) -> PluginRecord {
        let source = self
            .inner
            .provider
            .descriptor_at(key, descriptor)
            .and_then(|d| d.source);
        let loaded = self.inner.table.lock().is_loaded(descriptor);
        PluginRecord::new(descriptor, plugin, source, loaded)
    }

    fn pinned_or_resolve(&self, key: &Key, descriptor: usize) -> DiResult<Arc<dyn Plugin>> {
        let pinned = self.inner.table.lock().pinned(descriptor).cloned();
        if let Some(plugin) = pinned {
            return Ok(plugin);
        }

        let plugin = resolve_isolated(&self.inner.provider, key, descriptor)?;
        let mut table = self.inner.table.lock();
        if table.pinned.len() <= descriptor {
            table.pinned.resize(descriptor + 1, None);
        }
        // A concurrent pass may have pinned one first
        let pinned = table.pinned[descriptor].get_or_insert(plugin).clone();
        Ok(pinned)
    }
}

/// Resolves one plugin descriptor, turning a panicking constructor into an error.
fn resolve_isolated(
    provider: &ServiceProvider,
    key: &Key,
    descriptor: usize,
) -> DiResult<Arc<dyn Plugin>> {
    panic::catch_unwind(AssertUnwindSafe(|| provider.resolve_at(key, descriptor)))
        .unwrap_or_else(|payload| {
            let implementation = provider
                .descriptor_at(key, descriptor)
                .map_or(key.display_name(), |d| d.implementation_name());
            Err(DiError::Construction {
                implementation,
                reason: format!("constructor panicked: {}", panic_message(&*payload)),
            })
        })
        .and_then(|instance| instance.service::<dyn Plugin>())
}

/// Not-unloadable before unloadable, then ascending priority; stable.
fn order_for_load(records: &mut [PluginRecord]) {
    records.sort_by_key(|record| (record.unloadable, record.priority));
}

fn run_hook(
    record: &PluginRecord,
    operation: &'static str,
    hook: impl FnOnce() -> Result<(), PluginError>,
) -> Result<(), DiError> {
    panic::catch_unwind(AssertUnwindSafe(hook))
        .unwrap_or_else(|payload| Err(PluginError::Panicked(panic_message(&*payload))))
        .map_err(|error| DiError::PluginOperation {
            plugin: record.name.clone(),
            operation,
            reason: error.to_string(),
        })
}
