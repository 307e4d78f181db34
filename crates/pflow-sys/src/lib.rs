//! Raw C-ABI declarations for PFLOW, the PETSc-based AC power flow library.
//!
//! This crate only describes the exported surface of `libpflow`: the opaque
//! handle types, the scalar aliases PETSc uses in its signatures, and one
//! function-pointer type per exported routine. It contains no safe API and
//! performs no linking. The `pflow` crate resolves these symbols at runtime
//! with `libloading` and wraps them in owning types.
//!
//! # Calling convention
//!
//! Every routine returns a [`PetscErrorCode`]: `0` on success, a PETSc error
//! number otherwise. Output values are written through pointer arguments.
//!
//! # Reference
//!
//! Balay, S., et al. PETSc/TAO Users Manual, ANL-21/39. Argonne National
//! Laboratory. [petsc.org](https://petsc.org/release/manual/)

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int, c_long};

// ============================================================================
// TYPES
// ============================================================================

/// Error code returned by every PETSc routine (`PetscErrorCode`).
pub type PetscErrorCode = c_int;

/// PETSc boolean (`PetscBool`), stored as a C enum.
pub type PetscBool = c_int;

/// Integer type for bus numbers and statuses (`PetscInt`, 32-bit build).
pub type PetscInt = c_int;

/// Real scalar type (`PetscScalar`, real build).
pub type PetscScalar = c_double;

/// MPI communicator as handed out by `PFLOWGetPETSC_COMM_SELF`.
///
/// MPICH encodes communicators as integers; the binding only copies the value
/// from one call into the next, so a C `long` covers every supported MPI.
pub type MpiComm = c_long;

/// Opaque power flow application object (`struct _p_PFLOW`).
#[repr(C)]
pub struct PflowInfo {
    _private: [u8; 0],
}

/// Pointer to a power flow application object (`PFLOW`).
pub type Pflow = *mut PflowInfo;

// ============================================================================
// CONSTANTS
// ============================================================================

/// `PETSC_FALSE`.
pub const PETSC_FALSE: PetscBool = 0;

/// `PETSC_TRUE`.
pub const PETSC_TRUE: PetscBool = 1;

/// Success return value.
pub const PETSC_SUCCESS: PetscErrorCode = 0;

/// `PETSC_ERR_SUP`: no support for the requested operation.
pub const PETSC_ERR_SUP: PetscErrorCode = 56;

/// Options file PFLOW reads when none is configured.
pub const DEFAULT_OPTIONS_FILE: &str = "petscopt";

/// Platform file name of the shared library.
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAME: &str = "libpflow.dylib";
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY_NAME: &str = "pflow.dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_LIBRARY_NAME: &str = "libpflow.so";

// ============================================================================
// SYMBOL NAMES
// ============================================================================

/// Exported symbol names, as passed to the dynamic loader.
pub mod symbols {
    pub const LIBRARY_INITIALIZE: &str = "PFLOWLibraryInitialize";
    pub const LIBRARY_INITIALIZED: &str = "PFLOWLibraryInitialized";
    pub const LIBRARY_FINALIZE: &str = "PFLOWLibraryFinalize";
    pub const GET_COMM_SELF: &str = "PFLOWGetPETSC_COMM_SELF";
    pub const CREATE: &str = "PFLOWCreate";
    pub const DESTROY: &str = "PFLOWDestroy";
    pub const READ_MATPOWER_DATA: &str = "PFLOWReadMatPowerData";
    pub const READ_PSSE_RAW_DATA: &str = "PFLOWReadPSSERawData";
    pub const SOLVE: &str = "PFLOWSolve";
    pub const POST_SOLVE: &str = "PFLOWPostSolve";
    pub const CONVERGED: &str = "PFLOWConverged";
    pub const SET_LINE_STATUS: &str = "PFLOWSetLineStatus";
    pub const SET_GEN_STATUS: &str = "PFLOWSetGenStatus";
    pub const GET_BUS_VOLTAGE: &str = "PFLOWGetBusVoltage";
    pub const SET_LOAD_POWER: &str = "PFLOWSetLoadPower";
    pub const GET_LOAD_POWER: &str = "PFLOWGetLoadPower";
    pub const ADD_BUS_SHUNT: &str = "PFLOWAddBusShunt";
}

// ============================================================================
// FUNCTION TYPES
// ============================================================================

/// `PFLOWLibraryInitialize(int argc, char **args, const char *file, const char *help)`.
///
/// Wraps `PetscInitializeNoPointers`. `file` names the options file, `help`
/// is the banner printed for `-help`. Both may be null.
pub type PFLOWLibraryInitialize_FN = unsafe extern "C" fn(
    argc: c_int,
    args: *mut *mut c_char,
    filename: *const c_char,
    help: *const c_char,
) -> PetscErrorCode;

/// `PFLOWLibraryInitialized(PetscBool *flg)`.
pub type PFLOWLibraryInitialized_FN =
    unsafe extern "C" fn(is_initialized: *mut PetscBool) -> PetscErrorCode;

/// `PFLOWLibraryFinalize(void)`. Wraps `PetscFinalize`.
pub type PFLOWLibraryFinalize_FN = unsafe extern "C" fn() -> PetscErrorCode;

/// `PFLOWGetPETSC_COMM_SELF(MPI_Comm *comm)`.
pub type PFLOWGetPETSC_COMM_SELF_FN =
    unsafe extern "C" fn(comm: *mut MpiComm) -> PetscErrorCode;

/// `PFLOWCreate(MPI_Comm comm, PFLOW *pflowout)`.
pub type PFLOWCreate_FN =
    unsafe extern "C" fn(comm: MpiComm, pflow_out: *mut Pflow) -> PetscErrorCode;

/// `PFLOWDestroy(PFLOW *pflow)`.
pub type PFLOWDestroy_FN = unsafe extern "C" fn(pflow: *mut Pflow) -> PetscErrorCode;

/// `PFLOWReadMatPowerData(PFLOW pflow, const char netfile[])` and
/// `PFLOWReadPSSERawData`, which share the signature.
pub type PFLOWReadData_FN =
    unsafe extern "C" fn(pflow: Pflow, netfile: *const c_char) -> PetscErrorCode;

/// Routines taking only the application object: `PFLOWSolve`,
/// `PFLOWPostSolve`.
pub type PFLOWAction_FN = unsafe extern "C" fn(pflow: Pflow) -> PetscErrorCode;

/// `PFLOWConverged(PFLOW pflow, PetscBool *flg)`.
pub type PFLOWConverged_FN =
    unsafe extern "C" fn(pflow: Pflow, converged: *mut PetscBool) -> PetscErrorCode;

/// `PFLOWSetLineStatus(PFLOW, PetscInt fbus, PetscInt tbus, const char *id, PetscInt status)`.
pub type PFLOWSetLineStatus_FN = unsafe extern "C" fn(
    pflow: Pflow,
    from_bus: PetscInt,
    to_bus: PetscInt,
    id: *const c_char,
    status: PetscInt,
) -> PetscErrorCode;

/// `PFLOWSetGenStatus(PFLOW, PetscInt gbus, const char *gid, PetscInt status)`.
pub type PFLOWSetGenStatus_FN = unsafe extern "C" fn(
    pflow: Pflow,
    bus: PetscInt,
    id: *const c_char,
    status: PetscInt,
) -> PetscErrorCode;

/// `PFLOWGetBusVoltage(PFLOW, PetscInt bus, PetscScalar *Vm, PetscScalar *Va, PetscBool *found)`.
///
/// `Vm` is in per unit, `Va` in degrees.
pub type PFLOWGetBusVoltage_FN = unsafe extern "C" fn(
    pflow: Pflow,
    bus: PetscInt,
    vm: *mut PetscScalar,
    va: *mut PetscScalar,
    found: *mut PetscBool,
) -> PetscErrorCode;

/// `PFLOWSetLoadPower(PFLOW, PetscInt bus, PetscScalar Pd, PetscScalar Qd)`.
///
/// `Pd` in MW, `Qd` in MVAr.
pub type PFLOWSetLoadPower_FN = unsafe extern "C" fn(
    pflow: Pflow,
    bus: PetscInt,
    pd: PetscScalar,
    qd: PetscScalar,
) -> PetscErrorCode;

/// `PFLOWGetLoadPower(PFLOW, PetscInt bus, PetscScalar *Pd, PetscScalar *Qd, PetscBool *found)`.
pub type PFLOWGetLoadPower_FN = unsafe extern "C" fn(
    pflow: Pflow,
    bus: PetscInt,
    pd: *mut PetscScalar,
    qd: *mut PetscScalar,
    found: *mut PetscBool,
) -> PetscErrorCode;

/// `PFLOWAddBusShunt(PFLOW, PetscInt bus, PetscScalar Gs, PetscScalar Bs)`.
///
/// `Gs` in MW, `Bs` in MVAr, both at 1.0 pu voltage.
pub type PFLOWAddBusShunt_FN = unsafe extern "C" fn(
    pflow: Pflow,
    bus: PetscInt,
    gs: PetscScalar,
    bs: PetscScalar,
) -> PetscErrorCode;
