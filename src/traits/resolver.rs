//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::BoxFutureUnit;
use crate::key::Key;
use crate::registration::Instance;
use crate::traits::{AsyncDispose, Dispose};

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider),
/// [`Scope`](crate::Scope) and the [`ResolverContext`](crate::ResolverContext)
/// handed to constructors. Every method goes through the thread-local
/// resolution stack, so a cycle anywhere below surfaces as
/// [`DiError::Circular`] instead of overflowing the stack.
///
/// Most callers want the generic [`Resolver`] methods built on top of this.
pub trait ResolverCore: Send + Sync {
    /// Resolves the first-registered descriptor for `key`.
    ///
    /// Fails with [`DiError::UnregisteredContract`] when nothing is registered.
    fn resolve_any(&self, key: &Key) -> DiResult<Instance>;

    /// Resolves every descriptor for `key` in registration order, one result per
    /// descriptor. A failing descriptor does not prevent the others from being
    /// materialized. Unregistered contracts yield an empty vector.
    fn resolve_each(&self, key: &Key) -> Vec<DiResult<Instance>>;

    /// Resolves every descriptor for `key`, failing on the first error.
    fn resolve_many(&self, key: &Key) -> DiResult<Vec<Instance>> {
        self.resolve_each(key).into_iter().collect()
    }

    /// Registers a synchronous disposal hook on the owning scope or provider.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook on the owning scope or provider.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);
}

/// High-level resolver interface with generic methods for type-safe resolution.
///
/// Contracts are usually trait objects (`dyn Greeter`) but any `'static`
/// type registered as a contract works, including concrete structs registered
/// "as self".
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{CandidateType, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// #[derive(Default)]
/// struct French;
/// impl Greeter for French {
///     fn greet(&self) -> String { "bonjour".into() }
/// }
///
/// let mut services = ServiceCollection::new();
/// for candidate in [
///     CandidateType::of_default::<English>()
///         .implements::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
///         .injectable::<dyn Greeter>(Lifetime::Singleton)
///         .build(),
///     CandidateType::of_default::<French>()
///         .implements::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
///         .injectable::<dyn Greeter>(Lifetime::Transient)
///         .build(),
/// ] {
///     services.add_candidate(&candidate);
/// }
///
/// let provider = services.build();
/// assert_eq!(provider.get::<dyn Greeter>().unwrap().greet(), "hello");
/// assert_eq!(provider.get_all::<dyn Greeter>().unwrap().len(), 2);
///
/// let french = provider.get_impl::<dyn Greeter, French>().unwrap();
/// assert_eq!(french.greet(), "bonjour");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the first-registered implementation of contract `C`.
    fn get<C: ?Sized + 'static>(&self) -> DiResult<Arc<C>>
    where
        Arc<C>: Send + Sync,
    {
        self.resolve_any(&Key::of::<C>())?.service::<C>()
    }

    /// Resolves every implementation of `C` in registration order.
    ///
    /// Returns an empty vector when `C` is not registered.
    fn get_all<C: ?Sized + 'static>(&self) -> DiResult<Vec<Arc<C>>>
    where
        Arc<C>: Send + Sync,
    {
        self.resolve_many(&Key::of::<C>())?
            .iter()
            .map(Instance::service::<C>)
            .collect()
    }

    /// Like [`get_all`](Self::get_all) but keeps going past failing descriptors.
    fn get_each<C: ?Sized + 'static>(&self) -> Vec<DiResult<Arc<C>>>
    where
        Arc<C>: Send + Sync,
    {
        self.resolve_each(&Key::of::<C>())
            .into_iter()
            .map(|instance| instance.and_then(|i| i.service::<C>()))
            .collect()
    }

    /// Resolves the first instance in the `C` collection whose concrete type is `I`.
    ///
    /// Other implementations that fail to construct are skipped.
    fn get_impl<C, I>(&self) -> DiResult<Arc<I>>
    where
        C: ?Sized + 'static,
        I: Send + Sync + 'static,
    {
        self.resolve_each(&Key::of::<C>())
            .iter()
            .filter_map(|instance| instance.as_ref().ok())
            .find_map(Instance::concrete::<I>)
            .ok_or(DiError::ImplementationNotFound {
                contract: std::any::type_name::<C>(),
                implementation: std::any::type_name::<I>(),
            })
    }

    /// Resolves contract `C`, panicking if it cannot be resolved.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error when `C` is missing or fails to construct.
    fn get_required<C: ?Sized + 'static>(&self) -> Arc<C>
    where
        Arc<C>: Send + Sync,
    {
        match self.get::<C>() {
            Ok(service) => service,
            Err(err) => panic!("failed to resolve {}: {err}", std::any::type_name::<C>()),
        }
    }

    /// Registers `service` for synchronous disposal with this resolver's owner.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers `service` for asynchronous disposal with this resolver's owner.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move { service.dispose().await }) as BoxFutureUnit
        }));
    }
}
