//! Candidate types: implementations offered for registration.
//!
//! A [`CandidateType`] is the explicit stand-in for a reflected type. It
//! carries the implementation's constructor, the contracts it can be viewed
//! as, and its optional [`Injectable`] metadata. Candidates come from scanned
//! modules (via [`ModuleRegistrar`](crate::ModuleRegistrar)) or from the host.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::{BoxFutureUnit, Disposer};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Constructor, DisposeHook, Registration, ResolverContext, Upcast};
use crate::traits::{AsyncDispose, Dispose};

type MetadataFn = Arc<dyn Fn() -> DiResult<Injectable> + Send + Sync>;

/// Injectable metadata: the contract a type registers under and its lifetime.
///
/// `contract: None` defers the contract to whatever the scanning location
/// requested for its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Injectable {
    pub contract: Option<Key>,
    pub lifetime: Lifetime,
}

impl Injectable {
    pub fn of<C: ?Sized + 'static>(lifetime: Lifetime) -> Self {
        Self {
            contract: Some(Key::of::<C>()),
            lifetime,
        }
    }

    pub fn unbound(lifetime: Lifetime) -> Self {
        Self {
            contract: None,
            lifetime,
        }
    }
}

/// A type offered for registration.
///
/// Cheap to clone; all behavior is shared behind `Arc`s.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateType, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync {
///     fn name(&self) -> &str;
/// }
/// trait Report: Send + Sync {
///     fn title(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct MemoryStore;
/// impl Store for MemoryStore {
///     fn name(&self) -> &str { "memory" }
/// }
///
/// struct DailyReport {
///     store: Arc<dyn Store>,
/// }
/// impl Report for DailyReport {
///     fn title(&self) -> String { format!("daily from {}", self.store.name()) }
/// }
///
/// let store = CandidateType::of_default::<MemoryStore>()
///     .implements::<dyn Store>(|s| s as Arc<dyn Store>)
///     .injectable::<dyn Store>(Lifetime::Singleton)
///     .build();
///
/// let report = CandidateType::of(|ctx| Ok(DailyReport { store: ctx.get::<dyn Store>()? }))
///     .implements::<dyn Report>(|r| r as Arc<dyn Report>)
///     .injectable::<dyn Report>(Lifetime::Transient)
///     .depends_on::<dyn Store>()
///     .build();
///
/// let mut services = ServiceCollection::new();
/// services.add_candidates([&store, &report]);
/// let provider = services.build();
///
/// assert_eq!(provider.get::<dyn Report>().unwrap().title(), "daily from memory");
/// assert!(provider.missing_dependencies().is_empty());
/// ```
#[derive(Clone)]
pub struct CandidateType {
    implementation: Key,
    is_abstract: bool,
    ctor: Option<Constructor>,
    casts: Vec<(Key, Upcast)>,
    metadata: Option<MetadataFn>,
    requested: Vec<Key>,
    dependencies: Vec<Key>,
    dispose: Option<DisposeHook>,
    source: Option<PathBuf>,
}

impl CandidateType {
    /// Starts a concrete candidate for `I` built by `ctor`.
    pub fn of<I, F>(ctor: F) -> CandidateBuilder<I>
    where
        I: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<I> + Send + Sync + 'static,
    {
        let ctor: Constructor =
            Arc::new(move |ctx: &ResolverContext<'_>| ctor(ctx).map(|i| Arc::new(i) as AnyArc));
        CandidateBuilder {
            inner: Self::bare(Key::of::<I>(), false, Some(ctor)),
            _marker: PhantomData,
        }
    }

    /// Starts a concrete candidate for `I` built with `I::default()`.
    pub fn of_default<I>() -> CandidateBuilder<I>
    where
        I: Default + Send + Sync + 'static,
    {
        Self::of(|_| Ok(I::default()))
    }

    /// A candidate that can never be instantiated, such as a trait or base type
    /// a module exports alongside its implementations.
    pub fn abstract_type<I: ?Sized + 'static>(metadata: Option<Injectable>) -> Self {
        let mut candidate = Self::bare(Key::of::<I>(), true, None);
        candidate.metadata =
            metadata.map(|m| Arc::new(move || -> DiResult<Injectable> { Ok(m) }) as MetadataFn);
        candidate
    }

    fn bare(implementation: Key, is_abstract: bool, ctor: Option<Constructor>) -> Self {
        Self {
            implementation,
            is_abstract,
            ctor,
            casts: Vec::new(),
            metadata: None,
            requested: Vec::new(),
            dependencies: Vec::new(),
            dispose: None,
            source: None,
        }
    }

    /// Adds `C` to the contracts requested for this candidate.
    ///
    /// Requested contracts only matter when the metadata leaves the contract unbound.
    pub fn requesting<C: ?Sized + 'static>(mut self) -> Self {
        self.request(Key::of::<C>());
        self
    }

    pub(crate) fn request(&mut self, contract: Key) {
        if !self.requested.contains(&contract) {
            self.requested.push(contract);
        }
    }

    pub fn implementation(&self) -> Key {
        self.implementation
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Whether instances of this candidate can be viewed as `contract`.
    pub fn satisfies(&self, contract: &Key) -> bool {
        self.casts.iter().any(|(key, _)| key == contract)
    }

    /// Contracts this candidate can be viewed as, in declaration order.
    pub fn contracts(&self) -> impl Iterator<Item = Key> + '_ {
        self.casts.iter().map(|(key, _)| *key)
    }

    pub fn requested(&self) -> &[Key] {
        &self.requested
    }

    pub fn dependencies(&self) -> &[Key] {
        &self.dependencies
    }

    /// Module file this candidate was scanned from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub(crate) fn set_source(&mut self, path: &Path) {
        self.source = Some(path.to_path_buf());
    }

    /// Evaluates the injectable metadata, if any is declared.
    pub(crate) fn evaluate_metadata(&self) -> Option<DiResult<Injectable>> {
        self.metadata.as_ref().map(|metadata| metadata())
    }

    /// Builds the registration binding this candidate to `contract`.
    ///
    /// `None` when the candidate is abstract or cannot be viewed as `contract`.
    pub(crate) fn registration(
        &self,
        contract: Key,
        lifetime: Lifetime,
        is_factory: bool,
    ) -> Option<Registration> {
        if self.is_abstract {
            return None;
        }
        let ctor = self.ctor.clone()?;
        let (_, upcast) = self.casts.iter().find(|(key, _)| *key == contract)?;

        let descriptor = ServiceDescriptor {
            contract,
            implementation: self.implementation,
            lifetime,
            is_factory,
            dependencies: self.dependencies.clone(),
            source: self.source.clone(),
        };
        Some(Registration::new(
            descriptor,
            ctor,
            upcast.clone(),
            self.dispose.clone(),
        ))
    }
}

impl fmt::Debug for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateType")
            .field("implementation", &self.implementation)
            .field("is_abstract", &self.is_abstract)
            .field("contracts", &self.contracts().collect::<Vec<_>>())
            .field("requested", &self.requested)
            .field("has_metadata", &self.metadata.is_some())
            .field("source", &self.source)
            .finish()
    }
}

/// Typed builder for a concrete [`CandidateType`].
pub struct CandidateBuilder<I> {
    inner: CandidateType,
    _marker: PhantomData<fn() -> I>,
}

impl<I: Send + Sync + 'static> CandidateBuilder<I> {
    /// Declares that `I` can be viewed as contract `C` through `cast`.
    ///
    /// For trait contracts the cast is just an unsizing coercion:
    /// `|i| i as Arc<dyn Contract>`.
    pub fn implements<C: ?Sized + 'static>(
        mut self,
        cast: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self
    where
        Arc<C>: Send + Sync,
    {
        let upcast: Upcast = Arc::new(move |concrete: &AnyArc| -> DiResult<AnyArc> {
            let concrete = concrete
                .clone()
                .downcast::<I>()
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<I>()))?;
            Ok(Arc::new(cast(concrete)) as AnyArc)
        });
        let contract = Key::of::<C>();
        self.inner.casts.retain(|(key, _)| *key != contract);
        self.inner.casts.push((contract, upcast));
        self
    }

    /// Declares that `I` can be resolved as itself.
    pub fn as_self(self) -> Self {
        self.implements::<I>(|i| i)
    }

    /// Injectable metadata binding `I` to contract `C`.
    pub fn injectable<C: ?Sized + 'static>(self, lifetime: Lifetime) -> Self {
        let injectable = Injectable::of::<C>(lifetime);
        self.injectable_with(move || Ok(injectable))
    }

    /// Injectable metadata with no contract of its own.
    pub fn injectable_unbound(self, lifetime: Lifetime) -> Self {
        let injectable = Injectable::unbound(lifetime);
        self.injectable_with(move || Ok(injectable))
    }

    /// Injectable metadata computed at classification time, which may fail.
    pub fn injectable_with(
        mut self,
        metadata: impl Fn() -> DiResult<Injectable> + Send + Sync + 'static,
    ) -> Self {
        self.inner.metadata = Some(Arc::new(metadata));
        self
    }

    pub fn requesting<C: ?Sized + 'static>(mut self) -> Self {
        self.inner.request(Key::of::<C>());
        self
    }

    /// Declares a contract the constructor resolves.
    pub fn depends_on<D: ?Sized + 'static>(mut self) -> Self {
        let dependency = Key::of::<D>();
        if !self.inner.dependencies.contains(&dependency) {
            self.inner.dependencies.push(dependency);
        }
        self
    }

    pub fn build(self) -> CandidateType {
        self.inner
    }
}

impl<I: Dispose> CandidateBuilder<I> {
    /// Registers [`Dispose::dispose`] with the owning resolver for every instance created.
    pub fn disposable(mut self) -> Self {
        self.inner.dispose = Some(Arc::new(|concrete: &AnyArc| {
            let instance = concrete.clone().downcast::<I>().ok()?;
            Some(Disposer::Sync(Box::new(move || instance.dispose())))
        }));
        self
    }
}

impl<I: AsyncDispose> CandidateBuilder<I> {
    /// Registers [`AsyncDispose::dispose`] with the owning resolver for every instance created.
    pub fn async_disposable(mut self) -> Self {
        self.inner.dispose = Some(Arc::new(|concrete: &AnyArc| {
            let instance = concrete.clone().downcast::<I>().ok()?;
            Some(Disposer::Async(Box::new(move || {
                Box::pin(async move { instance.dispose().await }) as BoxFutureUnit
            })))
        }));
        self
    }
}

impl<I> From<CandidateBuilder<I>> for CandidateType {
    fn from(builder: CandidateBuilder<I>) -> Self {
        builder.inner
    }
}
