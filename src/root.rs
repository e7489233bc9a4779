//! Composition root: wiring scanner, classifier, registry and plugins together.

use std::sync::Arc;

use crate::collection::ModuleRegistrar;
use crate::config::{CompositionConfig, ExplicitRegistration};
use crate::internal::BoxFutureUnit;
use crate::plugin::{PluginManager, PluginPassReport};
use crate::registration::Instance;
use crate::scanner::{DynamicLibraryLoader, ModuleLoader, Scanner};
use crate::traits::{Resolver, ResolverCore};
use crate::{DiResult, Key, Scope, ServiceCollection, ServiceProvider};

/// Owns the frozen registry and the plugin manager for the host.
///
/// Built once from a [`CompositionConfig`]; nothing is registered afterwards.
/// The root is passed explicitly to whoever needs it, there is no global
/// instance.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateType, CompositionConfig, CompositionRoot, Lifetime, Plugin};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// #[derive(Default)]
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// #[derive(Default)]
/// struct StatusBar;
/// impl Plugin for StatusBar {
///     fn name(&self) -> &str { "status-bar" }
/// }
///
/// let config = CompositionConfig::new()
///     .register::<dyn Clock>(
///         CandidateType::of_default::<FixedClock>().implements::<dyn Clock>(|c| c as Arc<dyn Clock>),
///         Lifetime::Singleton,
///     )
///     .candidate(
///         CandidateType::of_default::<StatusBar>()
///             .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
///             .injectable::<dyn Plugin>(Lifetime::Singleton),
///     );
///
/// let root = CompositionRoot::build(config);
/// assert_eq!(root.resolve::<dyn Clock>().unwrap().now(), 42);
/// assert_eq!(root.load_plugins().transitioned_names(), vec!["status-bar"]);
/// assert_eq!(root.unload_plugins().transitioned_names(), vec!["status-bar"]);
/// root.dispose();
/// ```
pub struct CompositionRoot {
    provider: ServiceProvider,
    plugins: PluginManager,
}

impl CompositionRoot {
    /// Builds the root, loading modules with [`DynamicLibraryLoader`].
    pub fn build(config: CompositionConfig) -> Self {
        Self::build_with_loader(config, &DynamicLibraryLoader)
    }

    pub fn build_with_loader(config: CompositionConfig, loader: &dyn ModuleLoader) -> Self {
        let CompositionConfig {
            locations,
            modules,
            candidates,
            registrations,
        } = config;

        let mut services = ServiceCollection::new();

        let scanned = Scanner::new(loader).scan(&locations);
        let from_scan = services.add_candidates(&scanned);

        for module in modules {
            let mut registrar = ModuleRegistrar::new();
            match module(&mut registrar) {
                Ok(()) => {
                    services.add_candidates(&registrar.into_candidates());
                }
                Err(error) => tracing::warn!(%error, "static module failed to register"),
            }
        }

        services.add_candidates(&candidates);

        for ExplicitRegistration {
            contract,
            candidate,
            lifetime,
            mode,
            is_factory,
        } in registrations
        {
            if is_factory {
                services.add_factory(contract, &candidate, lifetime, mode);
            } else {
                services.add_explicit(contract, &candidate, lifetime.unwrap_or_default(), mode);
            }
        }

        tracing::info!(
            locations = locations.len(),
            scanned = scanned.len(),
            from_scan,
            descriptors = services.len(),
            "composition root built"
        );

        let provider = services.build();
        for missing in provider.missing_dependencies() {
            tracing::warn!(
                implementation = %missing.implementation,
                dependency = %missing.dependency,
                "declared dependency has no registration"
            );
        }

        Self {
            plugins: PluginManager::new(provider.clone()),
            provider,
        }
    }

    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// First-registered implementation of `C`.
    pub fn resolve<C: ?Sized + 'static>(&self) -> DiResult<Arc<C>>
    where
        Arc<C>: Send + Sync,
    {
        self.provider.get::<C>()
    }

    /// Every implementation of `C` in registration order; empty when none.
    pub fn resolve_all<C: ?Sized + 'static>(&self) -> DiResult<Vec<Arc<C>>>
    where
        Arc<C>: Send + Sync,
    {
        self.provider.get_all::<C>()
    }

    /// The first `C` whose concrete type is `I`.
    pub fn resolve_impl<C: ?Sized + 'static, I: Send + Sync + 'static>(&self) -> DiResult<Arc<I>> {
        self.provider.get_impl::<C, I>()
    }

    pub fn create_scope(&self) -> Scope {
        self.provider.create_scope()
    }

    pub fn load_plugins(&self) -> PluginPassReport {
        self.plugins.load_all()
    }

    pub fn unload_plugins(&self) -> PluginPassReport {
        self.plugins.unload_all()
    }

    /// Runs the provider's sync disposal hooks. Plugins are not unloaded.
    pub fn dispose(&self) {
        self.provider.dispose();
    }

    /// Runs the provider's async then sync disposal hooks. Plugins are not unloaded.
    pub async fn dispose_async(&self) {
        self.provider.dispose_async().await;
    }
}

impl ResolverCore for CompositionRoot {
    fn resolve_any(&self, key: &Key) -> DiResult<Instance> {
        self.provider.resolve_any(key)
    }

    fn resolve_each(&self, key: &Key) -> Vec<DiResult<Instance>> {
        self.provider.resolve_each(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.provider.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.provider.push_async_disposer(f);
    }
}

impl Resolver for CompositionRoot {}
