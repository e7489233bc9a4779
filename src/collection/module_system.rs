//! Module registration: how a module hands its candidate types to the host.
//!
//! Dynamic modules receive a [`ModuleRegistrar`] through their exported entry
//! point; statically linked code implements [`ServiceModule`] and feeds the
//! same registrar.

use crate::candidate::CandidateType;
use crate::{DiResult, ServiceCollection};

/// Collects the candidate types one module exports.
#[derive(Debug, Default)]
pub struct ModuleRegistrar {
    candidates: Vec<CandidateType>,
}

impl ModuleRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers one candidate type, concrete or abstract.
    pub fn add(&mut self, candidate: impl Into<CandidateType>) -> &mut Self {
        self.candidates.push(candidate.into());
        self
    }

    /// Lets a statically linked module register into this registrar.
    pub fn add_module<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_candidates(self) -> Vec<CandidateType> {
        self.candidates
    }
}

/// A module that registers its candidate types with a [`ModuleRegistrar`].
///
/// # Example
///
/// ```rust
/// use ferrous_ioc::{
///     CandidateType, DiResult, Lifetime, ModuleRegistrar, Resolver, ServiceCollection,
///     ServiceCollectionExt, ServiceModule,
/// };
/// use std::sync::Arc;
///
/// trait Exporter: Send + Sync {
///     fn format(&self) -> &'static str;
/// }
///
/// #[derive(Default)]
/// struct CsvExporter;
/// impl Exporter for CsvExporter {
///     fn format(&self) -> &'static str { "csv" }
/// }
///
/// struct ExportModule;
///
/// impl ServiceModule for ExportModule {
///     fn register_services(self, registrar: &mut ModuleRegistrar) -> DiResult<()> {
///         registrar.add(
///             CandidateType::of_default::<CsvExporter>()
///                 .implements::<dyn Exporter>(|e| e as Arc<dyn Exporter>)
///                 .injectable::<dyn Exporter>(Lifetime::Singleton),
///         );
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = ServiceCollection::new().add_module(ExportModule)?.build();
/// assert_eq!(provider.get::<dyn Exporter>()?.format(), "csv");
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's candidate types.
    fn register_services(self, registrar: &mut ModuleRegistrar) -> DiResult<()>;
}

/// Extension trait for chaining module registration on a [`ServiceCollection`].
pub trait ServiceCollectionExt {
    /// Classifies and registers every candidate `module` offers.
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        self.add_module_mut(module)?;
        Ok(self)
    }
}
