//! Service collection: assembling descriptors before the registry is frozen.
//!
//! A [`ServiceCollection`] is filled single-threaded from classified
//! candidates, explicit registrations, factories and fixed instances, then
//! turned into an immutable [`ServiceProvider`] by [`ServiceCollection::build`].

use std::sync::Arc;

use crate::candidate::CandidateType;
use crate::descriptors::ServiceDescriptor;
use crate::registration::{AnyArc, Constructor, Registration, Registry, ResolverContext, Upcast};
use crate::{DiResult, Key, Lifetime, ServiceProvider};

pub mod classify;
pub mod module_system;

pub use classify::classify;
pub use module_system::*;

/// How an explicit registration treats descriptors already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistrationMode {
    /// Always add another descriptor for the contract
    #[default]
    Append,
    /// Add only if the contract has no descriptor yet
    TryAdd,
    /// Add only if this (contract, implementation) pair is not registered yet
    TryAddEnumerable,
}

/// Mutable descriptor table, frozen by [`build`](Self::build).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateType, Key, Lifetime, RegistrationMode, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Sink: Send + Sync {
///     fn id(&self) -> u32;
/// }
///
/// #[derive(Default)]
/// struct Console;
/// impl Sink for Console {
///     fn id(&self) -> u32 { 1 }
/// }
///
/// #[derive(Default)]
/// struct File;
/// impl Sink for File {
///     fn id(&self) -> u32 { 2 }
/// }
///
/// let console = CandidateType::of_default::<Console>()
///     .implements::<dyn Sink>(|s| s as Arc<dyn Sink>)
///     .build();
/// let file = CandidateType::of_default::<File>()
///     .implements::<dyn Sink>(|s| s as Arc<dyn Sink>)
///     .build();
///
/// let mut services = ServiceCollection::new();
/// let sink = Key::of::<dyn Sink>();
/// assert!(services.add_explicit(sink, &console, Lifetime::Singleton, RegistrationMode::TryAdd));
/// assert!(!services.add_explicit(sink, &file, Lifetime::Singleton, RegistrationMode::TryAdd));
/// assert!(services.add_explicit(sink, &file, Lifetime::Singleton, RegistrationMode::TryAddEnumerable));
/// assert!(!services.add_explicit(sink, &file, Lifetime::Singleton, RegistrationMode::TryAddEnumerable));
///
/// let provider = services.build();
/// let ids: Vec<u32> = provider.get_all::<dyn Sink>().unwrap().iter().map(|s| s.id()).collect();
/// assert_eq!(ids, vec![1, 2]);
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    registry: Registry,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `candidate` and appends every descriptor it yields.
    ///
    /// Returns the number of descriptors added. Rejected candidates add none.
    pub fn add_candidate(&mut self, candidate: &CandidateType) -> usize {
        let registrations = classify::classify_registrations(candidate);
        let added = registrations.len();
        for registration in registrations {
            self.insert(registration);
        }
        added
    }

    /// Classifies and appends each candidate in order.
    pub fn add_candidates<'a>(
        &mut self,
        candidates: impl IntoIterator<Item = &'a CandidateType>,
    ) -> usize {
        candidates
            .into_iter()
            .map(|candidate| self.add_candidate(candidate))
            .sum()
    }

    /// Registers `candidate` under `contract` with an explicit lifetime,
    /// bypassing its injectable metadata.
    ///
    /// Returns `false` when the candidate cannot be viewed as `contract`, is
    /// abstract, or `mode` finds an existing descriptor.
    pub fn add_explicit(
        &mut self,
        contract: Key,
        candidate: &CandidateType,
        lifetime: Lifetime,
        mode: RegistrationMode,
    ) -> bool {
        self.add_with_mode(contract, candidate, lifetime, false, mode)
    }

    /// Registers a host-supplied factory: the candidate's constructor is the
    /// factory and its result is viewed as `contract`.
    ///
    /// Without an explicit lifetime the candidate's injectable lifetime is used,
    /// and without usable metadata the lifetime falls back to
    /// [`Lifetime::Scoped`].
    pub fn add_factory(
        &mut self,
        contract: Key,
        factory: &CandidateType,
        lifetime: Option<Lifetime>,
        mode: RegistrationMode,
    ) -> bool {
        let lifetime = lifetime.unwrap_or_else(|| {
            factory
                .has_metadata()
                .then(|| classify::evaluate_metadata(factory))
                .flatten()
                .map(|injectable| injectable.lifetime)
                .unwrap_or_default()
        });
        self.add_with_mode(contract, factory, lifetime, true, mode)
    }

    /// Registers an existing instance as a singleton for contract `C`.
    pub fn add_instance<C: ?Sized + 'static>(&mut self, instance: Arc<C>) -> &mut Self
    where
        Arc<C>: Send + Sync,
    {
        let stored: AnyArc = Arc::new(instance);
        let ctor: Constructor =
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(stored.clone()) });
        let upcast: Upcast = Arc::new(|any: &AnyArc| -> DiResult<AnyArc> { Ok(any.clone()) });
        let descriptor = ServiceDescriptor {
            contract: Key::of::<C>(),
            implementation: Key::of::<C>(),
            lifetime: Lifetime::Singleton,
            is_factory: false,
            dependencies: Vec::new(),
            source: None,
        };
        self.insert(Registration::new(descriptor, ctor, upcast, None));
        self
    }

    /// Registers a statically linked module's candidates in place.
    pub fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        let mut registrar = ModuleRegistrar::new();
        module.register_services(&mut registrar)?;
        self.add_candidates(&registrar.into_candidates());
        Ok(self)
    }

    /// Whether any descriptor is registered for contract `C`.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.registry.contains_contract(&Key::of::<C>())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.descriptors()
    }

    /// Freezes the descriptor table into a provider.
    pub fn build(mut self) -> ServiceProvider {
        self.registry.finalize();
        tracing::debug!(descriptors = self.registry.len(), "service registry built");
        ServiceProvider::new(self.registry)
    }

    fn add_with_mode(
        &mut self,
        contract: Key,
        candidate: &CandidateType,
        lifetime: Lifetime,
        is_factory: bool,
        mode: RegistrationMode,
    ) -> bool {
        let implementation = candidate.implementation();
        let skip = match mode {
            RegistrationMode::Append => false,
            RegistrationMode::TryAdd => self.registry.contains_contract(&contract),
            RegistrationMode::TryAddEnumerable => {
                self.registry.contains_pair(&contract, &implementation)
            }
        };
        if skip {
            tracing::debug!(
                contract = %contract,
                implementation = %implementation,
                ?mode,
                "registration skipped, already registered"
            );
            return false;
        }

        match candidate.registration(contract, lifetime, is_factory) {
            Some(registration) => {
                self.insert(registration);
                true
            }
            None => {
                tracing::warn!(
                    contract = %contract,
                    implementation = %implementation,
                    "explicit registration rejected, implementation does not satisfy contract"
                );
                false
            }
        }
    }

    fn insert(&mut self, registration: Registration) {
        tracing::debug!(
            contract = %registration.descriptor.contract,
            implementation = %registration.descriptor.implementation,
            lifetime = %registration.descriptor.lifetime,
            "registered descriptor"
        );
        self.registry.insert(registration);
    }
}
