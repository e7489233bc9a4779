//! Scoped service resolution and lifecycle management.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::{ResolverContext, ServiceProvider};
use crate::internal::{BoxFutureUnit, DisposeBag, Disposer};
use crate::registration::{Instance, Registration};
use crate::traits::{Resolver, ResolverCore};
use crate::{DiResult, Key, Lifetime};

/// Per-scope cache slots and disposal hooks.
///
/// The provider owns one of these as its root scope; every [`Scope`] owns its own.
pub(crate) struct ScopeState {
    cells: Box<[OnceCell<Instance>]>,
    disposers: Mutex<DisposeBag>,
    disposed: AtomicBool,
    label: &'static str,
}

impl ScopeState {
    pub(crate) fn new(scoped_count: usize, label: &'static str) -> Self {
        Self {
            cells: (0..scoped_count).map(|_| OnceCell::new()).collect(),
            disposers: Mutex::new(DisposeBag::default()),
            disposed: AtomicBool::new(false),
            label,
        }
    }

    /// Materializes `reg` according to its lifetime.
    ///
    /// Singletons are built against `root` so their dependencies and disposers
    /// belong to the provider. Scoped and transient instances are built against
    /// `owner`.
    pub(crate) fn resolve(
        &self,
        root: &ServiceProvider,
        owner: &dyn ResolverCore,
        reg: &Registration,
    ) -> DiResult<Instance> {
        match reg.lifetime() {
            Lifetime::Singleton => reg
                .singleton
                .get_or_try_init(|| reg.instantiate(&ResolverContext::new(root)))
                .cloned(),
            Lifetime::Scoped => match reg.scoped_slot.and_then(|slot| self.cells.get(slot)) {
                Some(cell) => cell
                    .get_or_try_init(|| reg.instantiate(&ResolverContext::new(owner)))
                    .cloned(),
                None => reg.instantiate(&ResolverContext::new(owner)),
            },
            Lifetime::Transient => reg.instantiate(&ResolverContext::new(owner)),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label
    }

    pub(crate) fn push(&self, disposer: Disposer) {
        self.disposers.lock().push(disposer);
    }

    /// Runs the synchronous hooks in LIFO order, leaving async hooks pending.
    pub(crate) fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        let (mut sync, pending) = {
            let mut bag = self.disposers.lock();
            (bag.take_sync(), bag.pending_async())
        };
        let ran = sync.run_all_sync_reverse();
        if pending > 0 {
            tracing::warn!(
                scope = self.label,
                pending,
                "async disposers left pending, use dispose_async"
            );
        }
        tracing::debug!(scope = self.label, ran, "ran sync disposers");
    }

    /// Runs async hooks then sync hooks, each in LIFO order.
    pub(crate) async fn dispose_async(&self) {
        self.disposed.store(true, Ordering::Release);
        let mut bag = std::mem::take(&mut *self.disposers.lock());
        let ran_async = bag.run_all_async_reverse().await;
        let ran_sync = bag.run_all_sync_reverse();
        tracing::debug!(scope = self.label, ran_async, ran_sync, "ran disposers");
    }
}

impl Drop for ScopeState {
    fn drop(&mut self) {
        let bag = self.disposers.get_mut();
        if bag.is_empty() {
            return;
        }
        let pending = bag.pending_async();
        if pending > 0 {
            tracing::warn!(
                scope = self.label,
                pending,
                "dropped with pending async disposers, call dispose_async before dropping"
            );
        }
        bag.run_all_sync_reverse();
    }
}

/// Scoped service container.
///
/// A `Scope` caches its own scoped instances while singletons are shared with
/// the root provider:
///
/// - **Singleton**: resolved and cached by the root provider
/// - **Scoped**: resolved and cached within this scope
/// - **Transient**: created fresh on every resolution
///
/// Disposal hooks of scoped and transient instances created here run when the
/// scope is disposed or dropped.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{CandidateType, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Session;
///
/// let mut services = ServiceCollection::new();
/// services.add_candidate(
///     &CandidateType::of_default::<Session>()
///         .as_self()
///         .injectable::<Session>(Lifetime::Scoped)
///         .build(),
/// );
/// let provider = services.build();
///
/// let first = provider.create_scope();
/// let second = provider.create_scope();
/// let a = first.get::<Session>().unwrap();
/// assert!(Arc::ptr_eq(&a, &first.get::<Session>().unwrap()));
/// assert!(!Arc::ptr_eq(&a, &second.get::<Session>().unwrap()));
/// ```
pub struct Scope {
    pub(crate) root: ServiceProvider,
    pub(crate) state: ScopeState,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        let state = ScopeState::new(root.inner().registry.scoped_count, "scope");
        Self { root, state }
    }

    /// The provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.root
    }

    /// Runs this scope's synchronous disposal hooks in LIFO order.
    ///
    /// Afterwards every resolution through this scope fails with
    /// [`DiError::Disposed`](crate::DiError::Disposed).
    pub fn dispose(&self) {
        self.state.dispose();
    }

    /// Runs this scope's async disposal hooks, then its sync hooks, each in LIFO order.
    pub async fn dispose_async(&self) {
        self.state.dispose_async().await;
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<Instance> {
        self.root.resolve_first_in(self, &self.state, key)
    }

    fn resolve_each(&self, key: &Key) -> Vec<DiResult<Instance>> {
        self.root.resolve_each_in(self, &self.state, key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.state.push(Disposer::Sync(f));
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.state.push(Disposer::Async(f));
    }
}

impl Resolver for Scope {}
