//! Loading candidate types out of dynamic modules.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use libloading::Library;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::candidate::CandidateType;
use crate::collection::ModuleRegistrar;
use crate::error::{DiError, DiResult};
use crate::internal::panic_message;

/// Symbol every dynamic module exports; see [`export_module!`](crate::export_module).
pub const ENTRY_SYMBOL: &str = "ferrous_ioc_register_module";

/// Signature of the exported entry point.
///
/// Modules are plain Rust `cdylib`/`dylib` crates and must be built with the
/// same compiler and the same version of this crate as the host.
pub type ModuleEntryPoint = fn(&mut ModuleRegistrar);

// Candidates keep pointers into module code, so modules are never unmapped
static LOADED_LIBRARIES: Lazy<Mutex<Vec<Library>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Turns one module file into the candidate types it exports.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> DiResult<Vec<CandidateType>>;
}

/// Default loader backed by `libloading`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLibraryLoader;

impl DynamicLibraryLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleLoader for DynamicLibraryLoader {
    fn load(&self, path: &Path) -> DiResult<Vec<CandidateType>> {
        let load_error = |reason: String| DiError::ModuleLoad {
            path: path.to_path_buf(),
            reason,
        };

        // SAFETY: loading runs the module's initializers; modules are trusted
        // host extensions found in configured locations.
        let library = unsafe { Library::new(path) }.map_err(|err| load_error(err.to_string()))?;

        // SAFETY: the symbol is generated by `export_module!` with this exact signature.
        let entry: ModuleEntryPoint = unsafe {
            *library
                .get::<ModuleEntryPoint>(ENTRY_SYMBOL.as_bytes())
                .map_err(|err| load_error(format!("missing entry symbol: {err}")))?
        };

        let mut registrar = ModuleRegistrar::new();
        panic::catch_unwind(AssertUnwindSafe(|| entry(&mut registrar)))
            .map_err(|payload| load_error(format!("entry point panicked: {}", panic_message(&*payload))))?;

        LOADED_LIBRARIES.lock().push(library);
        tracing::debug!(
            path = %path.display(),
            candidates = registrar.len(),
            "loaded module"
        );
        Ok(registrar.into_candidates())
    }
}

/// Generates the entry point a dynamic module exports.
///
/// ```ignore
/// ferrous_ioc::export_module!(|registrar| {
///     registrar.add(
///         CandidateType::of_default::<AuditPlugin>()
///             .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
///             .injectable::<dyn Plugin>(Lifetime::Singleton),
///     );
/// });
/// ```
#[macro_export]
macro_rules! export_module {
    ($register:expr) => {
        #[no_mangle]
        pub fn ferrous_ioc_register_module(registrar: &mut $crate::ModuleRegistrar) {
            let register: fn(&mut $crate::ModuleRegistrar) = $register;
            register(registrar);
        }
    };
}
