//! Composition configuration: everything the root needs before building.

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::candidate::CandidateType;
use crate::collection::{ModuleRegistrar, RegistrationMode, ServiceModule};
use crate::{DiResult, Key, Lifetime, ModuleLocation};

/// Environment variable read by [`CompositionConfig::search_from_env`] by default.
pub const MODULE_PATH_ENV: &str = "FERROUS_IOC_MODULE_PATH";

type ModuleHook = Box<dyn FnOnce(&mut ModuleRegistrar) -> DiResult<()>>;

pub(crate) struct ExplicitRegistration {
    pub(crate) contract: Key,
    pub(crate) candidate: CandidateType,
    pub(crate) lifetime: Option<Lifetime>,
    pub(crate) mode: RegistrationMode,
    pub(crate) is_factory: bool,
}

/// Search locations, explicit registrations and factories for a
/// [`CompositionRoot`](crate::CompositionRoot).
///
/// The configuration is assembled once and consumed by
/// [`CompositionRoot::build`](crate::CompositionRoot::build). Descriptors are
/// registered in this order: scanned modules, static modules, explicit
/// candidates, then explicit registrations and factories as they were added.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateType, CompositionConfig, Lifetime, ModuleLocation};
/// use std::sync::Arc;
///
/// trait Theme: Send + Sync {}
/// #[derive(Default)]
/// struct Dark;
/// impl Theme for Dark {}
///
/// let dark = CandidateType::of_default::<Dark>()
///     .implements::<dyn Theme>(|t| t as Arc<dyn Theme>)
///     .build();
///
/// let config = CompositionConfig::new()
///     .search(ModuleLocation::new("plugins").requesting::<dyn Theme>())
///     .try_add::<dyn Theme>(dark, Lifetime::Singleton);
/// assert_eq!(config.locations().len(), 1);
/// ```
#[derive(Default)]
pub struct CompositionConfig {
    pub(crate) locations: Vec<ModuleLocation>,
    pub(crate) modules: Vec<ModuleHook>,
    pub(crate) candidates: Vec<CandidateType>,
    pub(crate) registrations: Vec<ExplicitRegistration>,
}

impl CompositionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, location: ModuleLocation) -> Self {
        self.locations.push(location);
        self
    }

    pub fn search_directory(self, directory: impl Into<PathBuf>) -> Self {
        self.search(ModuleLocation::new(directory))
    }

    pub fn search_all(mut self, locations: impl IntoIterator<Item = ModuleLocation>) -> Self {
        self.locations.extend(locations);
        self
    }

    /// Adds one location per entry of the path list in environment variable `var`.
    ///
    /// Entries use the platform path-list separator. An unset variable adds nothing.
    pub fn search_from_env(mut self, var: &str) -> Self {
        match env::var_os(var) {
            Some(paths) => {
                let before = self.locations.len();
                self.locations.extend(
                    env::split_paths(&paths)
                        .filter(|path| !path.as_os_str().is_empty())
                        .map(ModuleLocation::new),
                );
                tracing::debug!(var, added = self.locations.len() - before, "module locations from environment");
            }
            None => tracing::debug!(var, "module path variable not set"),
        }
        self
    }

    /// Supplies a candidate directly; it is classified like a scanned one.
    pub fn candidate(mut self, candidate: impl Into<CandidateType>) -> Self {
        self.candidates.push(candidate.into());
        self
    }

    /// Registers a statically linked module's candidates.
    ///
    /// A module that returns an error is logged and contributes nothing.
    pub fn module<M: ServiceModule + 'static>(mut self, module: M) -> Self {
        self.modules
            .push(Box::new(move |registrar: &mut ModuleRegistrar| {
                module.register_services(registrar)
            }));
        self
    }

    /// Registers `candidate` under contract `C`, appending to existing descriptors.
    pub fn register<C: ?Sized + 'static>(
        self,
        candidate: impl Into<CandidateType>,
        lifetime: Lifetime,
    ) -> Self {
        self.explicit::<C>(candidate.into(), Some(lifetime), RegistrationMode::Append, false)
    }

    /// Registers `candidate` under `C` only if `C` has no descriptor yet.
    pub fn try_add<C: ?Sized + 'static>(
        self,
        candidate: impl Into<CandidateType>,
        lifetime: Lifetime,
    ) -> Self {
        self.explicit::<C>(candidate.into(), Some(lifetime), RegistrationMode::TryAdd, false)
    }

    /// Registers `candidate` under `C` unless that implementation is already registered for `C`.
    pub fn try_add_enumerable<C: ?Sized + 'static>(
        self,
        candidate: impl Into<CandidateType>,
        lifetime: Lifetime,
    ) -> Self {
        self.explicit::<C>(
            candidate.into(),
            Some(lifetime),
            RegistrationMode::TryAddEnumerable,
            false,
        )
    }

    /// Registers a factory for `C`: the candidate's constructor builds the instance.
    ///
    /// With `lifetime: None` the candidate's injectable lifetime applies, or
    /// [`Lifetime::Scoped`] without metadata.
    pub fn factory<C: ?Sized + 'static>(
        self,
        factory: impl Into<CandidateType>,
        lifetime: Option<Lifetime>,
    ) -> Self {
        self.explicit::<C>(factory.into(), lifetime, RegistrationMode::Append, true)
    }

    pub fn locations(&self) -> &[ModuleLocation] {
        &self.locations
    }

    fn explicit<C: ?Sized + 'static>(
        mut self,
        candidate: CandidateType,
        lifetime: Option<Lifetime>,
        mode: RegistrationMode,
        is_factory: bool,
    ) -> Self {
        self.registrations.push(ExplicitRegistration {
            contract: Key::of::<C>(),
            candidate,
            lifetime,
            mode,
            is_factory,
        });
        self
    }
}

impl fmt::Debug for CompositionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionConfig")
            .field("locations", &self.locations)
            .field("modules", &self.modules.len())
            .field("candidates", &self.candidates.len())
            .field("registrations", &self.registrations.len())
            .finish()
    }
}
