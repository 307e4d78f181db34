//! Process-wide library initialization with scoped finalization.
//!
//! PETSc state is global to the process, not to a [`Runtime`]. Every runtime
//! registers itself under its backend's [`Backend::library_id`]; the library
//! is finalized when the last runtime for that id goes away, whichever one
//! happened to initialize it.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pflow_sys::{PetscBool, PETSC_FALSE, PETSC_TRUE};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::call::{check, NativeCall};
use crate::config::{InitOptions, PflowConfig};
use crate::error::{PflowError, PflowResult};
use crate::library::NativeLibrary;
use crate::power_flow::PowerFlow;

/// Live runtimes per loaded library.
static REGISTRY: Mutex<BTreeMap<usize, Registration>> = Mutex::new(BTreeMap::new());

#[derive(Debug)]
struct Registration {
    live_runtimes: usize,
    /// Set when a runtime in this process called `PFLOWLibraryInitialize`;
    /// a library initialized by someone else is never finalized here.
    finalize_on_release: bool,
}

fn lock_registry() -> MutexGuard<'static, BTreeMap<usize, Registration>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An initialized PFLOW library.
///
/// Cloning is cheap and shares the same initialization. Every [`PowerFlow`]
/// created from a runtime keeps it alive, and the library is finalized only
/// after every runtime on it, and so every solver context, has been dropped.
pub struct Runtime<B: Backend = NativeLibrary> {
    pub(crate) inner: Rc<RuntimeInner<B>>,
}

pub(crate) struct RuntimeInner<B: Backend> {
    pub(crate) backend: B,
    library_id: usize,
    owns_initialization: bool,
}

impl<B: Backend> Runtime<B> {
    /// Initialize the library behind `backend`.
    ///
    /// If another runtime on the same library is alive, or the library
    /// reports itself as already initialized, the call is skipped.
    ///
    /// # Errors
    /// [`PflowError::Native`] if `PFLOWLibraryInitialize` fails,
    /// [`PflowError::Initialization`] if the initialized flag is still not set
    /// afterwards.
    pub fn initialize(backend: B, options: &InitOptions) -> PflowResult<Self> {
        let library_id = backend.library_id();
        let mut registry = lock_registry();

        if let Some(registration) = registry.get_mut(&library_id) {
            registration.live_runtimes += 1;
            debug!(
                library = %backend.describe(),
                live_runtimes = registration.live_runtimes,
                "Sharing PFLOW library initialization"
            );
            return Ok(Runtime::register(backend, library_id, false));
        }

        let owns_initialization = if query_initialized(&backend)? {
            info!(
                library = %backend.describe(),
                "PFLOW library already initialized in this process"
            );
            false
        } else {
            let code = backend.library_initialize(
                options.options_file.as_deref(),
                options.help.as_deref(),
            );
            check(NativeCall::LibraryInitialize, code)?;

            if !query_initialized(&backend)? {
                return Err(PflowError::Initialization);
            }
            info!(library = %backend.describe(), "Initialized PFLOW library");
            true
        };

        registry.insert(
            library_id,
            Registration {
                live_runtimes: 1,
                finalize_on_release: owns_initialization,
            },
        );
        Ok(Runtime::register(backend, library_id, owns_initialization))
    }

    fn register(backend: B, library_id: usize, owns_initialization: bool) -> Self {
        Runtime {
            inner: Rc::new(RuntimeInner {
                backend,
                library_id,
                owns_initialization,
            }),
        }
    }

    /// The backend this runtime drives.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Whether this runtime called `PFLOWLibraryInitialize`.
    pub fn owns_initialization(&self) -> bool {
        self.inner.owns_initialization
    }

    /// Query the library's initialized flag.
    pub fn is_initialized(&self) -> PflowResult<bool> {
        query_initialized(&self.inner.backend)
    }

    /// Create a solver context bound to this runtime.
    pub fn create_power_flow(&self) -> PflowResult<PowerFlow<B>> {
        PowerFlow::new(self)
    }
}

impl Runtime<NativeLibrary> {
    /// Load the configured library and initialize it.
    pub fn from_config(config: &PflowConfig) -> PflowResult<Self> {
        let options = config.library.init_options()?;
        let library = NativeLibrary::open(config.library.resolved_path())?;
        Runtime::initialize(library, &options)
    }
}

impl<B: Backend> Clone for Runtime<B> {
    fn clone(&self) -> Self {
        Runtime {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("library", &self.inner.backend.describe())
            .field("owns_initialization", &self.inner.owns_initialization)
            .finish()
    }
}

impl<B: Backend> Drop for RuntimeInner<B> {
    fn drop(&mut self) {
        // Held through finalize so a concurrent initialize sees a consistent
        // flag.
        let mut registry = lock_registry();
        let remaining = match registry.get_mut(&self.library_id) {
            Some(registration) => {
                registration.live_runtimes -= 1;
                registration.live_runtimes
            }
            None => return,
        };
        if remaining > 0 {
            return;
        }
        let finalize = registry
            .remove(&self.library_id)
            .is_some_and(|registration| registration.finalize_on_release);
        if !finalize {
            return;
        }
        if !self.backend.supports(NativeCall::LibraryFinalize) {
            debug!("PFLOWLibraryFinalize not exported; skipping finalization");
            return;
        }
        match check(NativeCall::LibraryFinalize, self.backend.library_finalize()) {
            Ok(()) => info!("Finalized PFLOW library"),
            Err(e) => warn!(error = %e, "Failed to finalize PFLOW library"),
        }
    }
}

/// The flag counts as set only when it is exactly `PETSC_TRUE`.
fn query_initialized<B: Backend>(backend: &B) -> PflowResult<bool> {
    let mut flag: PetscBool = PETSC_FALSE;
    check(
        NativeCall::LibraryInitialized,
        backend.library_initialized(&mut flag),
    )?;
    Ok(flag == PETSC_TRUE)
}
