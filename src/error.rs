//! Error types for the composition runtime.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, registering, resolving or driving plugins.
///
/// Only the resolution variants (`UnregisteredContract`, `ImplementationNotFound`,
/// `TypeMismatch`, `Circular`, `DepthExceeded`, `Disposed`, `Construction`) ever
/// reach a caller of `get*`. Discovery and classification failures are logged and swallowed by the
/// scanner and the classifier; plugin failures are collected into a
/// [`PluginPassReport`](crate::PluginPassReport).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{DiError, ServiceCollection, Resolver};
///
/// trait Clock: Send + Sync {}
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<dyn Clock>() {
///     Err(DiError::UnregisteredContract(name)) => assert!(name.contains("Clock")),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No descriptor is registered for the contract
    #[error("no service registered for contract {0}")]
    UnregisteredContract(&'static str),
    /// The contract is registered but none of its instances has the requested concrete type
    #[error("no implementation {implementation} registered for contract {contract}")]
    ImplementationNotFound {
        contract: &'static str,
        implementation: &'static str,
    },
    /// Type-erased instance could not be downcast
    #[error("type mismatch for {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// The provider or scope was disposed and no longer hands out instances
    #[error("{0} has been disposed")]
    Disposed(&'static str),
    /// A constructor or factory reported its own failure
    #[error("failed to construct {implementation}: {reason}")]
    Construction {
        implementation: &'static str,
        reason: String,
    },
    /// A module could not be opened or did not expose a usable entry point
    #[error("failed to load module {path}: {reason}")]
    ModuleLoad { path: PathBuf, reason: String },
    /// Injectable metadata of a candidate could not be evaluated
    #[error("failed to classify {candidate}: {reason}")]
    Classification {
        candidate: &'static str,
        reason: String,
    },
    /// A plugin load or unload hook failed
    #[error("plugin {plugin} failed to {operation}: {reason}")]
    PluginOperation {
        plugin: String,
        operation: &'static str,
        reason: String,
    },
}

impl DiError {
    /// Builds a [`DiError::Construction`] for implementation `I`.
    pub fn construction<I: ?Sized>(reason: impl Into<String>) -> Self {
        DiError::Construction {
            implementation: std::any::type_name::<I>(),
            reason: reason.into(),
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
