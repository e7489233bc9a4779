//! # ferrous-ioc
//!
//! Plugin composition runtime: discover candidate types in module directories,
//! register them from their injectable metadata, resolve them with
//! lifetime-aware caching, and drive an ordered load/unload lifecycle for the
//! services that act as plugins.
//!
//! ## Features
//!
//! - **Module scanning**: directories of dynamic libraries, each exporting one fixed entry point
//! - **Metadata-driven registration**: a candidate declares its contract and lifetime
//! - **Lifetimes**: Singleton, Scoped and Transient, with the provider acting as the root scope
//! - **Deterministic resolution**: first-registered wins, collections keep registration order
//! - **Plugin lifecycle**: priority-ordered, idempotent load/unload with per-plugin failure isolation
//! - **Circular dependency detection**: cycles surface as errors carrying the full path
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{CandidateType, Lifetime, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//!
//! #[derive(Default)]
//! struct Postgres;
//! impl Repository for Postgres {
//!     fn url(&self) -> &str { "postgres://localhost" }
//! }
//!
//! struct Accounts {
//!     repo: Arc<dyn Repository>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_candidate(
//!     &CandidateType::of_default::<Postgres>()
//!         .implements::<dyn Repository>(|r| r as Arc<dyn Repository>)
//!         .injectable::<dyn Repository>(Lifetime::Singleton)
//!         .build(),
//! );
//! services.add_candidate(
//!     &CandidateType::of(|ctx| Ok(Accounts { repo: ctx.get::<dyn Repository>()? }))
//!         .as_self()
//!         .injectable::<Accounts>(Lifetime::Transient)
//!         .build(),
//! );
//!
//! let provider = services.build();
//! let accounts = provider.get::<Accounts>().unwrap();
//! assert_eq!(accounts.repo.url(), "postgres://localhost");
//! ```
//!
//! ## Plugins
//!
//! ```rust
//! use ferrous_ioc::{CandidateType, CompositionConfig, CompositionRoot, Lifetime, Plugin};
//! use std::sync::Arc;
//!
//! struct Panel(&'static str, u32);
//! impl Plugin for Panel {
//!     fn name(&self) -> &str { self.0 }
//!     fn priority(&self) -> u32 { self.1 }
//! }
//!
//! let panel = |name: &'static str, priority: u32| {
//!     CandidateType::of(move |_| Ok(Panel(name, priority)))
//!         .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
//!         .injectable::<dyn Plugin>(Lifetime::Singleton)
//! };
//!
//! let root = CompositionRoot::build(
//!     CompositionConfig::new()
//!         .candidate(panel("footer", 20))
//!         .candidate(panel("header", 10)),
//! );
//! assert_eq!(root.load_plugins().transitioned_names(), vec!["header", "footer"]);
//! ```
//!
//! ## Dynamic modules
//!
//! A module crate built as a `cdylib` exports its candidates with
//! [`export_module!`]; the host points a [`ModuleLocation`] at the directory.

pub mod candidate;
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod plugin;
pub mod provider;
pub mod root;
pub mod scanner;
pub mod traits;

// Internal modules
mod internal;
mod registration;

pub use candidate::{CandidateBuilder, CandidateType, Injectable};
pub use collection::{
    classify, ModuleRegistrar, RegistrationMode, ServiceCollection, ServiceCollectionExt,
    ServiceModule,
};
pub use config::{CompositionConfig, MODULE_PATH_ENV};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use internal::CircularPanic;
pub use key::{key_of, Key};
pub use lifetime::Lifetime;
pub use plugin::{
    Plugin, PluginError, PluginFailure, PluginManager, PluginPassReport, PluginRecord,
    DEFAULT_PRIORITY,
};
pub use provider::{MissingDependency, ResolverContext, Scope, ServiceProvider};
pub use registration::Instance;
pub use root::CompositionRoot;
pub use scanner::{
    DynamicLibraryLoader, ModuleEntryPoint, ModuleLoader, ModuleLocation, Scanner, ENTRY_SYMBOL,
};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    trait Counter: Send + Sync {
        fn id(&self) -> usize;
    }

    struct Numbered(usize);
    impl Counter for Numbered {
        fn id(&self) -> usize {
            self.0
        }
    }

    fn counting(lifetime: Lifetime, created: Arc<AtomicUsize>) -> CandidateType {
        CandidateType::of(move |_| Ok(Numbered(created.fetch_add(1, Ordering::SeqCst))))
            .implements::<dyn Counter>(|n| n as Arc<dyn Counter>)
            .injectable::<dyn Counter>(lifetime)
            .build()
    }

    #[test]
    fn test_singleton_resolution() {
        let created = Arc::new(AtomicUsize::new(0));
        let mut sc = ServiceCollection::new();
        sc.add_candidate(&counting(Lifetime::Singleton, created.clone()));

        let sp = sc.build();
        let a = sp.get::<dyn Counter>().unwrap();
        let b = sp.create_scope().get::<dyn Counter>().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_resolution() {
        let created = Arc::new(AtomicUsize::new(0));
        let mut sc = ServiceCollection::new();
        sc.add_candidate(&counting(Lifetime::Transient, created.clone()));

        let sp = sc.build();
        let a = sp.get::<dyn Counter>().unwrap();
        let b = sp.get::<dyn Counter>().unwrap();

        assert_eq!((a.id(), b.id()), (0, 1));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_scoped_resolution() {
        let created = Arc::new(AtomicUsize::new(0));
        let mut sc = ServiceCollection::new();
        sc.add_candidate(&counting(Lifetime::Scoped, created.clone()));

        let sp = sc.build();

        let scope1 = sp.create_scope();
        let s1a = scope1.get::<dyn Counter>().unwrap();
        let s1b = scope1.get::<dyn Counter>().unwrap();
        assert!(Arc::ptr_eq(&s1a, &s1b));

        let scope2 = sp.create_scope();
        let s2 = scope2.get::<dyn Counter>().unwrap();
        assert!(!Arc::ptr_eq(&s1a, &s2));

        // The provider is the root scope
        let root_a = sp.get::<dyn Counter>().unwrap();
        let root_b = sp.get::<dyn Counter>().unwrap();
        assert!(Arc::ptr_eq(&root_a, &root_b));
        assert!(!Arc::ptr_eq(&root_a, &s1a));
    }

    #[test]
    fn test_unregistered_contract() {
        let sp = ServiceCollection::new().build();
        assert!(matches!(
            sp.get::<dyn Counter>(),
            Err(DiError::UnregisteredContract(_))
        ));
        assert!(sp.get_all::<dyn Counter>().unwrap().is_empty());
    }
}
