//! Disposal traits for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing a
/// buffer, closing a handle). Mark the candidate with
/// [`CandidateBuilder::disposable`](crate::CandidateBuilder::disposable) and
/// every instance it creates registers a hook on the resolver that owns it.
/// Hooks run in LIFO order when the owning scope or provider is disposed.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{CandidateType, Dispose, Lifetime, Resolver, ServiceCollection};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// static FLUSHED: AtomicBool = AtomicBool::new(false);
///
/// #[derive(Default)]
/// struct Journal;
///
/// impl Dispose for Journal {
///     fn dispose(&self) {
///         FLUSHED.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_candidate(
///     &CandidateType::of_default::<Journal>()
///         .as_self()
///         .injectable::<Journal>(Lifetime::Singleton)
///         .disposable()
///         .build(),
/// );
///
/// let provider = services.build();
/// let _journal: Arc<Journal> = provider.get::<Journal>().unwrap();
/// provider.dispose();
/// assert!(FLUSHED.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// Async hooks run before sync hooks, both in LIFO order, when
/// `dispose_async` is awaited on the owning scope or provider.
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
