//! Resolver context handed to constructors.

use crate::error::DiResult;
use crate::internal::BoxFutureUnit;
use crate::key::Key;
use crate::registration::Instance;
use crate::traits::{Resolver, ResolverCore};

/// Context passed to constructors and factories for resolving dependencies.
///
/// Wraps whichever resolver is materializing the instance: the provider for
/// singletons, the owning scope for scoped services, the caller for
/// transients. Disposal hooks pushed through the context land on that same
/// owner.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{CandidateType, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Settings { retries: u32 }
/// struct Client { settings: Arc<Settings> }
///
/// let mut services = ServiceCollection::new();
/// services.add_candidate(
///     &CandidateType::of(|_| Ok(Settings { retries: 3 }))
///         .as_self()
///         .injectable::<Settings>(Lifetime::Singleton)
///         .build(),
/// );
/// services.add_candidate(
///     &CandidateType::of(|ctx| Ok(Client { settings: ctx.get::<Settings>()? }))
///         .as_self()
///         .injectable::<Client>(Lifetime::Transient)
///         .build(),
/// );
///
/// let provider = services.build();
/// assert_eq!(provider.get::<Client>().unwrap().settings.retries, 3);
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(resolver: &'a dyn ResolverCore) -> Self {
        Self { resolver }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<Instance> {
        self.resolver.resolve_any(key)
    }

    fn resolve_each(&self, key: &Key) -> Vec<DiResult<Instance>> {
        self.resolver.resolve_each(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.resolver.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.resolver.push_async_disposer(f);
    }
}

impl Resolver for ResolverContext<'_> {}
