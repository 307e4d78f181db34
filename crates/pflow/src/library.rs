//! Runtime loading of `libpflow` with `libloading`.

use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use pflow_sys::{self as sys, MpiComm, PetscBool, PetscErrorCode, PetscInt, PetscScalar, Pflow};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::call::NativeCall;
use crate::error::{PflowError, PflowResult};

/// Function pointers resolved from the shared library.
#[derive(Clone, Copy)]
struct Api {
    library_initialize: sys::PFLOWLibraryInitialize_FN,
    library_initialized: sys::PFLOWLibraryInitialized_FN,
    library_finalize: Option<sys::PFLOWLibraryFinalize_FN>,
    comm_self: sys::PFLOWGetPETSC_COMM_SELF_FN,
    create: sys::PFLOWCreate_FN,
    destroy: sys::PFLOWDestroy_FN,
    read_matpower_data: sys::PFLOWReadData_FN,
    read_psse_raw_data: Option<sys::PFLOWReadData_FN>,
    solve: sys::PFLOWAction_FN,
    post_solve: sys::PFLOWAction_FN,
    converged: Option<sys::PFLOWConverged_FN>,
    set_line_status: Option<sys::PFLOWSetLineStatus_FN>,
    set_gen_status: Option<sys::PFLOWSetGenStatus_FN>,
    get_bus_voltage: Option<sys::PFLOWGetBusVoltage_FN>,
    set_load_power: Option<sys::PFLOWSetLoadPower_FN>,
    get_load_power: Option<sys::PFLOWGetLoadPower_FN>,
    add_bus_shunt: Option<sys::PFLOWAddBusShunt_FN>,
}

impl Api {
    /// # Safety
    /// The symbols must have the signatures declared in `pflow-sys`.
    unsafe fn resolve(library: &Library) -> PflowResult<Self> {
        Ok(Api {
            library_initialize: required(library, NativeCall::LibraryInitialize)?,
            library_initialized: required(library, NativeCall::LibraryInitialized)?,
            library_finalize: optional(library, NativeCall::LibraryFinalize),
            comm_self: required(library, NativeCall::GetCommSelf)?,
            create: required(library, NativeCall::Create)?,
            destroy: required(library, NativeCall::Destroy)?,
            read_matpower_data: required(library, NativeCall::ReadMatPowerData)?,
            read_psse_raw_data: optional(library, NativeCall::ReadPsseRawData),
            solve: required(library, NativeCall::Solve)?,
            post_solve: required(library, NativeCall::PostSolve)?,
            converged: optional(library, NativeCall::Converged),
            set_line_status: optional(library, NativeCall::SetLineStatus),
            set_gen_status: optional(library, NativeCall::SetGenStatus),
            get_bus_voltage: optional(library, NativeCall::GetBusVoltage),
            set_load_power: optional(library, NativeCall::SetLoadPower),
            get_load_power: optional(library, NativeCall::GetLoadPower),
            add_bus_shunt: optional(library, NativeCall::AddBusShunt),
        })
    }
}

unsafe fn required<T: Copy>(library: &Library, call: NativeCall) -> PflowResult<T> {
    let symbol = library
        .get::<T>(call.symbol_name().as_bytes())
        .map_err(|source| PflowError::MissingSymbol {
            symbol: call.symbol_name(),
            source,
        })?;
    Ok(*symbol)
}

unsafe fn optional<T: Copy>(library: &Library, call: NativeCall) -> Option<T> {
    match library.get::<T>(call.symbol_name().as_bytes()) {
        Ok(symbol) => Some(*symbol),
        Err(_) => {
            debug!(symbol = call.symbol_name(), "optional symbol not exported");
            None
        }
    }
}

/// A PFLOW shared library opened with the platform dynamic loader.
///
/// The resolved function pointers are only reachable through `&self`, so they
/// can never outlive the `Library` that owns the mapping.
pub struct NativeLibrary {
    path: PathBuf,
    api: Api,
    _library: Library,
}

impl NativeLibrary {
    /// Open the library at `path` and resolve its symbols.
    ///
    /// A bare file name (no directory) is searched for by the dynamic loader
    /// using the platform search path.
    ///
    /// # Errors
    /// [`PflowError::LibraryLoad`] if the file cannot be opened,
    /// [`PflowError::MissingSymbol`] if a required routine is not exported.
    pub fn open(path: impl AsRef<Path>) -> PflowResult<Self> {
        let path = path.as_ref().to_path_buf();

        // SAFETY: opening runs the library's static initializers, which for
        // libpflow only register PETSc classes.
        let library = unsafe { Library::new(&path) }.map_err(|source| PflowError::LibraryLoad {
            path: path.clone(),
            source,
        })?;

        // SAFETY: signatures in pflow-sys follow include/pflow.h.
        let api = unsafe { Api::resolve(&library)? };

        info!(path = %path.display(), "Loaded PFLOW library");

        Ok(NativeLibrary {
            path,
            api,
            _library: library,
        })
    }

    /// Path the library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Backend for NativeLibrary {
    fn supports(&self, call: NativeCall) -> bool {
        match call {
            NativeCall::LibraryFinalize => self.api.library_finalize.is_some(),
            NativeCall::ReadPsseRawData => self.api.read_psse_raw_data.is_some(),
            NativeCall::Converged => self.api.converged.is_some(),
            NativeCall::SetLineStatus => self.api.set_line_status.is_some(),
            NativeCall::SetGenStatus => self.api.set_gen_status.is_some(),
            NativeCall::GetBusVoltage => self.api.get_bus_voltage.is_some(),
            NativeCall::SetLoadPower => self.api.set_load_power.is_some(),
            NativeCall::GetLoadPower => self.api.get_load_power.is_some(),
            NativeCall::AddBusShunt => self.api.add_bus_shunt.is_some(),
            _ => true,
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    /// Opening the same file twice maps it once, so the entry point address
    /// identifies the library across `NativeLibrary` values.
    fn library_id(&self) -> usize {
        self.api.library_initialize as usize
    }

    fn library_initialize(
        &self,
        options_file: Option<&CStr>,
        help: Option<&CStr>,
    ) -> PetscErrorCode {
        let file = options_file.map_or(ptr::null(), CStr::as_ptr);
        let help = help.map_or(ptr::null(), CStr::as_ptr);
        // SAFETY: argc = 0 with a null argv is accepted by PetscInitializeNoPointers.
        unsafe { (self.api.library_initialize)(0, ptr::null_mut(), file, help) }
    }

    fn library_initialized(&self, is_initialized: &mut PetscBool) -> PetscErrorCode {
        // SAFETY: writes one PetscBool through a valid reference.
        unsafe { (self.api.library_initialized)(is_initialized) }
    }

    fn library_finalize(&self) -> PetscErrorCode {
        match self.api.library_finalize {
            // SAFETY: no arguments.
            Some(finalize) => unsafe { finalize() },
            None => sys::PETSC_ERR_SUP,
        }
    }

    fn comm_self(&self, comm: &mut MpiComm) -> PetscErrorCode {
        // SAFETY: writes one communicator through a valid reference.
        unsafe { (self.api.comm_self)(comm) }
    }

    fn create(&self, comm: MpiComm, pflow: &mut Pflow) -> PetscErrorCode {
        // SAFETY: comm was obtained from comm_self; pflow is a valid out slot.
        unsafe { (self.api.create)(comm, pflow) }
    }

    unsafe fn destroy(&self, pflow: &mut Pflow) -> PetscErrorCode {
        (self.api.destroy)(pflow)
    }

    unsafe fn read_matpower_data(&self, pflow: Pflow, netfile: &CStr) -> PetscErrorCode {
        (self.api.read_matpower_data)(pflow, netfile.as_ptr())
    }

    unsafe fn read_psse_raw_data(&self, pflow: Pflow, netfile: &CStr) -> PetscErrorCode {
        match self.api.read_psse_raw_data {
            Some(read) => read(pflow, netfile.as_ptr()),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn solve(&self, pflow: Pflow) -> PetscErrorCode {
        (self.api.solve)(pflow)
    }

    unsafe fn post_solve(&self, pflow: Pflow) -> PetscErrorCode {
        (self.api.post_solve)(pflow)
    }

    unsafe fn converged(&self, pflow: Pflow, converged: &mut PetscBool) -> PetscErrorCode {
        match self.api.converged {
            Some(f) => f(pflow, converged),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn set_line_status(
        &self,
        pflow: Pflow,
        from_bus: PetscInt,
        to_bus: PetscInt,
        id: &CStr,
        status: PetscInt,
    ) -> PetscErrorCode {
        match self.api.set_line_status {
            Some(f) => f(pflow, from_bus, to_bus, id.as_ptr(), status),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn set_gen_status(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        id: &CStr,
        status: PetscInt,
    ) -> PetscErrorCode {
        match self.api.set_gen_status {
            Some(f) => f(pflow, bus, id.as_ptr(), status),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn get_bus_voltage(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        vm: &mut PetscScalar,
        va: &mut PetscScalar,
        found: &mut PetscBool,
    ) -> PetscErrorCode {
        match self.api.get_bus_voltage {
            Some(f) => f(pflow, bus, vm, va, found),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn set_load_power(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        pd: PetscScalar,
        qd: PetscScalar,
    ) -> PetscErrorCode {
        match self.api.set_load_power {
            Some(f) => f(pflow, bus, pd, qd),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn get_load_power(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        pd: &mut PetscScalar,
        qd: &mut PetscScalar,
        found: &mut PetscBool,
    ) -> PetscErrorCode {
        match self.api.get_load_power {
            Some(f) => f(pflow, bus, pd, qd, found),
            None => sys::PETSC_ERR_SUP,
        }
    }

    unsafe fn add_bus_shunt(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        gs: PetscScalar,
        bs: PetscScalar,
    ) -> PetscErrorCode {
        match self.api.add_bus_shunt {
            Some(f) => f(pflow, bus, gs, bs),
            None => sys::PETSC_ERR_SUP,
        }
    }
}
