//! The native surface as a Rust trait.
//!
//! [`Backend`] mirrors the C-ABI one routine per method and returns the raw
//! `PetscErrorCode`. Return codes are interpreted by [`Runtime`] and
//! [`PowerFlow`], never by the backend, so every implementation (the
//! dynamically loaded library or an in-memory stand-in) is checked the same
//! way.
//!
//! [`Runtime`]: crate::Runtime
//! [`PowerFlow`]: crate::PowerFlow

use std::ffi::CStr;

use pflow_sys::{MpiComm, PetscBool, PetscErrorCode, PetscInt, PetscScalar, Pflow};

use crate::call::NativeCall;

/// Access to the routines exported by a PFLOW library.
///
/// Methods that take a [`Pflow`] handle are `unsafe`: the handle must have
/// been produced by [`Backend::create`] on the same backend and not yet
/// passed to [`Backend::destroy`].
pub trait Backend {
    /// Whether the routine can be called. Backends that resolve symbols
    /// lazily return `false` for optional routines they could not find.
    fn supports(&self, call: NativeCall) -> bool {
        let _ = call;
        true
    }

    /// Human-readable origin of the backend, used in log messages.
    fn describe(&self) -> String;

    /// Identity of the native library state this backend drives.
    ///
    /// Initialization is process-wide, so backends that reach the same
    /// loaded library must return the same value. Runtimes sharing an id
    /// share one initialization and one finalize.
    fn library_id(&self) -> usize;

    fn library_initialize(
        &self,
        options_file: Option<&CStr>,
        help: Option<&CStr>,
    ) -> PetscErrorCode;

    fn library_initialized(&self, is_initialized: &mut PetscBool) -> PetscErrorCode;

    fn library_finalize(&self) -> PetscErrorCode;

    fn comm_self(&self, comm: &mut MpiComm) -> PetscErrorCode;

    fn create(&self, comm: MpiComm, pflow: &mut Pflow) -> PetscErrorCode;

    /// # Safety
    /// `pflow` must point to a live context created by this backend. It is
    /// invalid after this call.
    unsafe fn destroy(&self, pflow: &mut Pflow) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn read_matpower_data(&self, pflow: Pflow, netfile: &CStr) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn read_psse_raw_data(&self, pflow: Pflow, netfile: &CStr) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn solve(&self, pflow: Pflow) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn post_solve(&self, pflow: Pflow) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn converged(&self, pflow: Pflow, converged: &mut PetscBool) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn set_line_status(
        &self,
        pflow: Pflow,
        from_bus: PetscInt,
        to_bus: PetscInt,
        id: &CStr,
        status: PetscInt,
    ) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn set_gen_status(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        id: &CStr,
        status: PetscInt,
    ) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn get_bus_voltage(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        vm: &mut PetscScalar,
        va: &mut PetscScalar,
        found: &mut PetscBool,
    ) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn set_load_power(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        pd: PetscScalar,
        qd: PetscScalar,
    ) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn get_load_power(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        pd: &mut PetscScalar,
        qd: &mut PetscScalar,
        found: &mut PetscBool,
    ) -> PetscErrorCode;

    /// # Safety
    /// See [`Backend`].
    unsafe fn add_bus_shunt(
        &self,
        pflow: Pflow,
        bus: PetscInt,
        gs: PetscScalar,
        bs: PetscScalar,
    ) -> PetscErrorCode;
}
