//! Service descriptors for introspection and diagnostics.

use std::path::PathBuf;

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Registration record binding a contract to an implementation and a lifetime.
///
/// Descriptors are produced by classification (or by explicit registration)
/// while the registry is assembled and are never mutated afterwards. They are
/// exposed read-only for diagnostics through
/// [`ServiceCollection::descriptors`](crate::ServiceCollection::descriptors)
/// and [`ServiceProvider::descriptors`](crate::ServiceProvider::descriptors).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateType, Lifetime, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {}
/// #[derive(Default)]
/// struct English;
/// impl Greeter for English {}
///
/// let mut services = ServiceCollection::new();
/// services.add_candidate(
///     &CandidateType::of_default::<English>()
///         .implements::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
///         .injectable::<dyn Greeter>(Lifetime::Singleton)
///         .build(),
/// );
///
/// let descriptors = services.descriptors();
/// assert_eq!(descriptors.len(), 1);
/// assert!(descriptors[0].contract_name().contains("Greeter"));
/// assert!(descriptors[0].implementation_name().contains("English"));
/// assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
/// assert!(!descriptors[0].is_factory);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The contract this descriptor satisfies
    pub contract: Key,
    /// The concrete implementation type
    pub implementation: Key,
    /// Instance-sharing policy
    pub lifetime: Lifetime,
    /// Whether the descriptor came from an explicit factory
    pub is_factory: bool,
    /// Contracts the implementation declared it resolves at construction
    pub dependencies: Vec<Key>,
    /// Module file the implementation was loaded from, `None` for host types
    pub source: Option<PathBuf>,
}

impl ServiceDescriptor {
    pub fn contract_name(&self) -> &'static str {
        self.contract.display_name()
    }

    pub fn implementation_name(&self) -> &'static str {
        self.implementation.display_name()
    }
}
