//! The solver context and its lifecycle.
//!
//! ```text
//! Initialized ──read_case──▶ DataLoaded ──solve──▶ Solved ◀──solve── Modified
//!                                                    │                  ▲
//!                                                    └──set_* / add_*───┘
//! ```
//!
//! The native library builds its bus index and line adjacency during the
//! first solve, so element queries and edits are only accepted once a solve
//! has completed. Edits move the context to `Modified` until it is solved
//! again; bus voltages can only be read in `Solved`.

use std::ffi::CString;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use pflow_sys::{
    MpiComm, PetscBool, PetscInt, PetscScalar, Pflow, PflowInfo, PETSC_FALSE, PETSC_TRUE,
};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::call::{check, NativeCall};
use crate::case::CaseFormat;
use crate::config::{to_cstring, PflowConfig};
use crate::error::{PflowError, PflowResult};
use crate::library::NativeLibrary;
use crate::network::{BusVoltage, ElementStatus, LoadPower, ShuntAdmittance, SolveReport};
use crate::runtime::{Runtime, RuntimeInner};

/// Where a solver context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Context created, no case data yet.
    Initialized,
    /// Case data read, not solved yet.
    DataLoaded,
    /// Last solve succeeded and nothing changed since.
    Solved,
    /// Network edited after a solve.
    Modified,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            LifecycleState::Initialized => "initialized (no case data)",
            LifecycleState::DataLoaded => "loaded but not yet solved",
            LifecycleState::Solved => "solved",
            LifecycleState::Modified => "modified since the last solve",
        };
        f.write_str(text)
    }
}

/// One PFLOW solver context.
///
/// Created from a [`Runtime`]; destroyed with `PFLOWDestroy` on drop. The
/// context is neither `Send` nor `Sync`: the native library has no locking.
pub struct PowerFlow<B: Backend = NativeLibrary> {
    runtime: Rc<RuntimeInner<B>>,
    handle: NonNull<PflowInfo>,
    state: LifecycleState,
}

impl PowerFlow<NativeLibrary> {
    /// Load and initialize the configured library, then create a context.
    pub fn open(config: &PflowConfig) -> PflowResult<Self> {
        let runtime = Runtime::from_config(config)?;
        PowerFlow::new(&runtime)
    }
}

impl<B: Backend> PowerFlow<B> {
    /// Create a solver context on `PETSC_COMM_SELF`.
    pub fn new(runtime: &Runtime<B>) -> PflowResult<Self> {
        let backend = &runtime.inner.backend;

        let mut comm: MpiComm = 0;
        check(NativeCall::GetCommSelf, backend.comm_self(&mut comm))?;

        let mut raw: Pflow = ptr::null_mut();
        check(NativeCall::Create, backend.create(comm, &mut raw))?;
        let handle = NonNull::new(raw).ok_or(PflowError::NullHandle)?;

        debug!(comm, "Created PFLOW solver context");

        Ok(PowerFlow {
            runtime: Rc::clone(&runtime.inner),
            handle,
            state: LifecycleState::Initialized,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Raw context pointer. Never null.
    pub fn as_raw(&self) -> Pflow {
        self.handle.as_ptr()
    }

    /// The runtime this context belongs to.
    pub fn runtime(&self) -> Runtime<B> {
        Runtime {
            inner: Rc::clone(&self.runtime),
        }
    }

    /// Read case data in the given format.
    ///
    /// Only allowed once, on a fresh context.
    pub fn read_case_data(
        &mut self,
        path: impl AsRef<Path>,
        format: CaseFormat,
    ) -> PflowResult<()> {
        let path = path.as_ref();
        self.require("read case data", &[LifecycleState::Initialized])?;
        self.require_support(format.reader())?;

        let netfile = path_to_cstring(path)?;
        let raw = self.as_raw();
        let backend = &self.runtime.backend;
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            match format {
                CaseFormat::Matpower => backend.read_matpower_data(raw, &netfile),
                CaseFormat::Psse => backend.read_psse_raw_data(raw, &netfile),
            }
        };
        check(format.reader(), code)?;

        self.state = LifecycleState::DataLoaded;
        info!(path = %path.display(), %format, "Read case data");
        Ok(())
    }

    /// Read a case file, picking the format from its extension.
    pub fn read_case(&mut self, path: impl AsRef<Path>) -> PflowResult<()> {
        let path = path.as_ref();
        let format = CaseFormat::from_path(path)
            .ok_or_else(|| PflowError::UnknownCaseFormat(path.display().to_string()))?;
        self.read_case_data(path, format)
    }

    pub fn read_matpower_data(&mut self, path: impl AsRef<Path>) -> PflowResult<()> {
        self.read_case_data(path, CaseFormat::Matpower)
    }

    pub fn read_psse_raw_data(&mut self, path: impl AsRef<Path>) -> PflowResult<()> {
        self.read_case_data(path, CaseFormat::Psse)
    }

    /// Solve the power flow, then update branch flows and generator output.
    ///
    /// `PFLOWPostSolve` runs only when `PFLOWSolve` succeeded. Any failure
    /// leaves the context in `DataLoaded` or `Modified`, never `Solved`.
    pub fn solve(&mut self) -> PflowResult<SolveReport> {
        self.require(
            "solve",
            &[
                LifecycleState::DataLoaded,
                LifecycleState::Solved,
                LifecycleState::Modified,
            ],
        )?;
        if self.state == LifecycleState::Solved {
            self.state = LifecycleState::Modified;
        }

        let raw = self.as_raw();
        let backend = &self.runtime.backend;
        // SAFETY: raw is the live context owned by self.
        check(NativeCall::Solve, unsafe { backend.solve(raw) })?;
        check(NativeCall::PostSolve, unsafe { backend.post_solve(raw) })?;
        self.state = LifecycleState::Solved;

        let converged = if backend.supports(NativeCall::Converged) {
            Some(self.query_converged()?)
        } else {
            None
        };

        match converged {
            Some(false) => warn!("Power flow did not converge"),
            _ => info!(converged = ?converged, "Power flow solved"),
        }
        Ok(SolveReport { converged })
    }

    /// Convergence flag of the last solve.
    pub fn converged(&self) -> PflowResult<bool> {
        self.require("query convergence", &[LifecycleState::Solved])?;
        self.require_support(NativeCall::Converged)?;
        self.query_converged()
    }

    /// Switch a line in or out of service.
    pub fn set_line_status(
        &mut self,
        from_bus: i32,
        to_bus: i32,
        id: &str,
        status: ElementStatus,
    ) -> PflowResult<()> {
        self.begin_edit("set line status", NativeCall::SetLineStatus)?;
        let from = native_bus(from_bus)?;
        let to = native_bus(to_bus)?;
        let id = to_cstring(id, "line id")?;

        let raw = self.as_raw();
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            self.runtime
                .backend
                .set_line_status(raw, from, to, &id, status.as_native())
        };
        check(NativeCall::SetLineStatus, code)?;

        self.state = LifecycleState::Modified;
        info!(from_bus, to_bus, ?status, "Set line status");
        Ok(())
    }

    /// Switch a generator in or out of service.
    pub fn set_gen_status(&mut self, bus: i32, id: &str, status: ElementStatus) -> PflowResult<()> {
        self.begin_edit("set generator status", NativeCall::SetGenStatus)?;
        let native = native_bus(bus)?;
        let id = to_cstring(id, "generator id")?;

        let raw = self.as_raw();
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            self.runtime
                .backend
                .set_gen_status(raw, native, &id, status.as_native())
        };
        check(NativeCall::SetGenStatus, code)?;

        self.state = LifecycleState::Modified;
        info!(bus, ?status, "Set generator status");
        Ok(())
    }

    /// Voltage at `bus` from the last solve.
    pub fn bus_voltage(&self, bus: i32) -> PflowResult<BusVoltage> {
        self.require("read bus voltage", &[LifecycleState::Solved])?;
        self.require_support(NativeCall::GetBusVoltage)?;
        let native = native_bus(bus)?;

        let mut vm: PetscScalar = 0.0;
        let mut va: PetscScalar = 0.0;
        let mut found: PetscBool = PETSC_FALSE;
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            self.runtime
                .backend
                .get_bus_voltage(self.as_raw(), native, &mut vm, &mut va, &mut found)
        };
        check(NativeCall::GetBusVoltage, code)?;

        if found != PETSC_TRUE {
            return Err(PflowError::BusNotFound(bus));
        }
        Ok(BusVoltage {
            magnitude_pu: vm,
            angle_deg: va,
        })
    }

    /// Replace the load at `bus`.
    pub fn set_load_power(&mut self, bus: i32, load: LoadPower) -> PflowResult<()> {
        self.begin_edit("set load power", NativeCall::SetLoadPower)?;
        let native = native_bus(bus)?;

        let raw = self.as_raw();
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            self.runtime
                .backend
                .set_load_power(raw, native, load.p_mw, load.q_mvar)
        };
        check(NativeCall::SetLoadPower, code)?;

        self.state = LifecycleState::Modified;
        debug!(bus, p_mw = load.p_mw, q_mvar = load.q_mvar, "Set load power");
        Ok(())
    }

    /// Load currently assigned to `bus`.
    pub fn load_power(&self, bus: i32) -> PflowResult<LoadPower> {
        self.require(
            "read load power",
            &[LifecycleState::Solved, LifecycleState::Modified],
        )?;
        self.require_support(NativeCall::GetLoadPower)?;
        let native = native_bus(bus)?;

        let mut pd: PetscScalar = 0.0;
        let mut qd: PetscScalar = 0.0;
        // Only written by the library when the bus exists.
        let mut found: PetscBool = PETSC_FALSE;
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            self.runtime
                .backend
                .get_load_power(self.as_raw(), native, &mut pd, &mut qd, &mut found)
        };
        check(NativeCall::GetLoadPower, code)?;

        if found != PETSC_TRUE {
            return Err(PflowError::BusNotFound(bus));
        }
        Ok(LoadPower {
            p_mw: pd,
            q_mvar: qd,
        })
    }

    /// Add a shunt to `bus`, on top of any shunt already there.
    pub fn add_bus_shunt(&mut self, bus: i32, shunt: ShuntAdmittance) -> PflowResult<()> {
        self.begin_edit("add bus shunt", NativeCall::AddBusShunt)?;
        let native = native_bus(bus)?;

        let raw = self.as_raw();
        // SAFETY: raw is the live context owned by self.
        let code = unsafe {
            self.runtime
                .backend
                .add_bus_shunt(raw, native, shunt.g_mw, shunt.b_mvar)
        };
        check(NativeCall::AddBusShunt, code)?;

        self.state = LifecycleState::Modified;
        debug!(bus, g_mw = shunt.g_mw, b_mvar = shunt.b_mvar, "Added bus shunt");
        Ok(())
    }

    fn query_converged(&self) -> PflowResult<bool> {
        let mut flag: PetscBool = PETSC_FALSE;
        // SAFETY: raw is the live context owned by self.
        let code = unsafe { self.runtime.backend.converged(self.as_raw(), &mut flag) };
        check(NativeCall::Converged, code)?;
        Ok(flag == PETSC_TRUE)
    }

    fn begin_edit(&self, operation: &'static str, call: NativeCall) -> PflowResult<()> {
        self.require(
            operation,
            &[LifecycleState::Solved, LifecycleState::Modified],
        )?;
        self.require_support(call)
    }

    fn require(&self, operation: &'static str, allowed: &[LifecycleState]) -> PflowResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PflowError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn require_support(&self, call: NativeCall) -> PflowResult<()> {
        if self.runtime.backend.supports(call) {
            Ok(())
        } else {
            Err(PflowError::Unsupported(call))
        }
    }
}

impl<B: Backend> Drop for PowerFlow<B> {
    fn drop(&mut self) {
        let mut raw = self.handle.as_ptr();
        // SAFETY: the handle came from create() on this backend and is
        // destroyed exactly once, here.
        let code = unsafe { self.runtime.backend.destroy(&mut raw) };
        match check(NativeCall::Destroy, code) {
            Ok(()) => debug!("Destroyed PFLOW solver context"),
            Err(e) => warn!(error = %e, "Failed to destroy PFLOW solver context"),
        }
    }
}

impl<B: Backend> std::fmt::Debug for PowerFlow<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerFlow")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .finish()
    }
}

/// Bus numbers index the native external-to-internal bus map, which spans
/// `0..=maxbusnum` of the loaded case. Negative values are rejected here.
/// The upper bound is the native library's contract and is not checked.
fn native_bus(bus: i32) -> PflowResult<PetscInt> {
    if bus < 0 {
        Err(PflowError::BusNotFound(bus))
    } else {
        Ok(bus)
    }
}

fn path_to_cstring(path: &Path) -> PflowResult<CString> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        CString::new(path.as_os_str().as_bytes()).map_err(|source| PflowError::InvalidString {
            what: "case file path",
            source,
        })
    }
    #[cfg(not(unix))]
    {
        to_cstring(&path.to_string_lossy(), "case file path")
    }
}
