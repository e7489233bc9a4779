//! Service provider: the frozen registry and its root scope.

use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::internal::{with_circular_catch, BoxFutureUnit, Disposer};
use crate::registration::{Instance, Registry};
use crate::traits::{Resolver, ResolverCore};
use crate::{DiError, DiResult, Key};

pub mod context;
pub mod scope;

pub use context::ResolverContext;
pub use scope::Scope;
use scope::ScopeState;

/// A declared dependency with no registration behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingDependency {
    pub contract: Key,
    pub implementation: Key,
    pub dependency: Key,
}

/// Service provider resolving from the frozen registry.
///
/// The provider doubles as the root scope: scoped services resolved directly
/// from it are cached for the provider's lifetime. Cloning is cheap and all
/// clones share the same registry, singleton cache and root scope.
///
/// # Thread Safety
///
/// The registry is immutable after [`ServiceCollection::build`](crate::ServiceCollection::build).
/// Singleton creation is guarded so concurrent first resolutions block until
/// one instance exists and then all observe it.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{CandidateType, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Registry;
/// #[derive(Default)]
/// struct Ticket;
///
/// let mut services = ServiceCollection::new();
/// services.add_candidate(
///     &CandidateType::of_default::<Registry>()
///         .as_self()
///         .injectable::<Registry>(Lifetime::Singleton)
///         .build(),
/// );
/// services.add_candidate(
///     &CandidateType::of_default::<Ticket>()
///         .as_self()
///         .injectable::<Ticket>(Lifetime::Transient)
///         .build(),
/// );
///
/// let provider = services.build();
/// assert!(Arc::ptr_eq(&provider.get::<Registry>().unwrap(), &provider.get::<Registry>().unwrap()));
/// assert!(!Arc::ptr_eq(&provider.get::<Ticket>().unwrap(), &provider.get::<Ticket>().unwrap()));
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
    root_scope: ScopeState,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry) -> Self {
        let root_scope = ScopeState::new(registry.scoped_count, "provider");
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                root_scope,
            }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Creates a new scope with its own scoped-instance cache.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner.registry.descriptors()
    }

    /// Whether any descriptor is registered for contract `C`.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.contains_contract(&Key::of::<C>())
    }

    /// Declared dependencies that no descriptor satisfies.
    ///
    /// Only dependencies declared with
    /// [`CandidateBuilder::depends_on`](crate::CandidateBuilder::depends_on) are checked.
    pub fn missing_dependencies(&self) -> Vec<MissingDependency> {
        let registry = &self.inner.registry;
        self.descriptors()
            .into_iter()
            .flat_map(|descriptor| {
                descriptor
                    .dependencies
                    .iter()
                    .filter(|dependency| !registry.contains_contract(dependency))
                    .map(|dependency| MissingDependency {
                        contract: descriptor.contract,
                        implementation: descriptor.implementation,
                        dependency: *dependency,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Runs the root scope's synchronous disposal hooks in LIFO order.
    ///
    /// This releases singleton and root-scoped resources. Async hooks are left
    /// for [`dispose_async`](Self::dispose_async).
    ///
    /// A disposed provider no longer hands out instances: every later
    /// resolution, through the provider or any of its scopes, fails with
    /// [`DiError::Disposed`].
    pub fn dispose(&self) {
        self.inner.root_scope.dispose();
    }

    /// Runs all async disposal hooks, then all sync hooks, each in LIFO order.
    ///
    /// Marks the provider disposed like [`dispose`](Self::dispose).
    pub async fn dispose_async(&self) {
        self.inner.root_scope.dispose_async().await;
    }

    /// Number of descriptors registered for `key`.
    pub(crate) fn descriptor_count(&self, key: &Key) -> usize {
        self.inner.registry.all(key).len()
    }

    /// Descriptor `index` of `key`, in registration order.
    pub(crate) fn descriptor_at(&self, key: &Key, index: usize) -> Option<ServiceDescriptor> {
        self.inner
            .registry
            .all(key)
            .get(index)
            .map(|reg| reg.descriptor.clone())
    }

    /// Resolves only descriptor `index` of `key` from the root scope.
    pub(crate) fn resolve_at(&self, key: &Key, index: usize) -> DiResult<Instance> {
        self.ensure_live(&self.inner.root_scope)?;
        with_circular_catch(key.display_name(), || {
            let reg = self
                .inner
                .registry
                .all(key)
                .get(index)
                .ok_or(DiError::UnregisteredContract(key.display_name()))?;
            self.inner.root_scope.resolve(self, self, reg)
        })
    }

    fn ensure_live(&self, state: &ScopeState) -> DiResult<()> {
        let root = &self.inner.root_scope;
        if root.is_disposed() {
            return Err(DiError::Disposed(root.label()));
        }
        if state.is_disposed() {
            return Err(DiError::Disposed(state.label()));
        }
        Ok(())
    }

    pub(crate) fn resolve_first_in(
        &self,
        owner: &dyn ResolverCore,
        state: &ScopeState,
        key: &Key,
    ) -> DiResult<Instance> {
        self.ensure_live(state)?;
        with_circular_catch(key.display_name(), || {
            let reg = self
                .inner
                .registry
                .first(key)
                .ok_or(DiError::UnregisteredContract(key.display_name()))?;
            state.resolve(self, owner, reg)
        })
    }

    pub(crate) fn resolve_each_in(
        &self,
        owner: &dyn ResolverCore,
        state: &ScopeState,
        key: &Key,
    ) -> Vec<DiResult<Instance>> {
        let regs = self.inner.registry.all(key);
        if regs.is_empty() {
            return Vec::new();
        }
        if let Err(err) = self.ensure_live(state) {
            return vec![Err(err)];
        }
        let resolved = with_circular_catch(key.display_name(), || {
            Ok(regs
                .iter()
                .map(|reg| state.resolve(self, owner, reg))
                .collect::<Vec<_>>())
        });
        resolved.unwrap_or_else(|err| vec![Err(err)])
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("descriptors", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<Instance> {
        self.resolve_first_in(self, &self.inner.root_scope, key)
    }

    fn resolve_each(&self, key: &Key) -> Vec<DiResult<Instance>> {
        self.resolve_each_in(self, &self.inner.root_scope, key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.root_scope.push(Disposer::Sync(f));
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.inner.root_scope.push(Disposer::Async(f));
    }
}

impl Resolver for ServiceProvider {}
