//! Scripted libpflow stand-in for driver tests.

use std::cell::{Ref, RefCell};
use std::ffi::CStr;
use std::rc::Rc;

use pflow::sys::{
    MpiComm, PetscBool, PetscErrorCode, PetscInt, PetscScalar, Pflow, PflowInfo, PETSC_FALSE,
    PETSC_TRUE,
};
use pflow::{Backend, NativeCall};

#[derive(Debug, Default)]
pub struct ScriptState {
    pub calls: Vec<NativeCall>,
    pub initialized: bool,
    pub solves: usize,
    /// Solves after this many successful ones fail with the given code.
    pub fail_solve_after: Option<(usize, PetscErrorCode)>,
    pub lines: Vec<(PetscInt, PetscInt, String, PetscInt)>,
    pub gens: Vec<(PetscInt, String, PetscInt)>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedBackend {
    pub fn state(&self) -> Ref<'_, ScriptState> {
        self.state.borrow()
    }

    pub fn count(&self, call: NativeCall) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    pub fn fail_solve_after(&self, successes: usize, code: PetscErrorCode) {
        self.state.borrow_mut().fail_solve_after = Some((successes, code));
    }

    fn record(&self, call: NativeCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Backend for ScriptedBackend {
    fn describe(&self) -> String {
        "scripted backend".to_string()
    }

    fn library_id(&self) -> usize {
        Rc::as_ptr(&self.state) as usize
    }

    fn library_initialize(
        &self,
        _options_file: Option<&CStr>,
        _help: Option<&CStr>,
    ) -> PetscErrorCode {
        self.record(NativeCall::LibraryInitialize);
        self.state.borrow_mut().initialized = true;
        0
    }

    fn library_initialized(&self, is_initialized: &mut PetscBool) -> PetscErrorCode {
        self.record(NativeCall::LibraryInitialized);
        *is_initialized = if self.state().initialized {
            PETSC_TRUE
        } else {
            PETSC_FALSE
        };
        0
    }

    fn library_finalize(&self) -> PetscErrorCode {
        self.record(NativeCall::LibraryFinalize);
        self.state.borrow_mut().initialized = false;
        0
    }

    fn comm_self(&self, comm: &mut MpiComm) -> PetscErrorCode {
        self.record(NativeCall::GetCommSelf);
        *comm = 1;
        0
    }

    fn create(&self, _comm: MpiComm, pflow: &mut Pflow) -> PetscErrorCode {
        self.record(NativeCall::Create);
        // Never dereferenced.
        *pflow = 0x2000 as *mut PflowInfo;
        0
    }

    unsafe fn destroy(&self, pflow: &mut Pflow) -> PetscErrorCode {
        self.record(NativeCall::Destroy);
        *pflow = std::ptr::null_mut();
        0
    }

    unsafe fn read_matpower_data(&self, _pflow: Pflow, _netfile: &CStr) -> PetscErrorCode {
        self.record(NativeCall::ReadMatPowerData);
        0
    }

    unsafe fn read_psse_raw_data(&self, _pflow: Pflow, _netfile: &CStr) -> PetscErrorCode {
        self.record(NativeCall::ReadPsseRawData);
        0
    }

    unsafe fn solve(&self, _pflow: Pflow) -> PetscErrorCode {
        self.record(NativeCall::Solve);
        let mut state = self.state.borrow_mut();
        let failure = state.fail_solve_after;
        match failure {
            Some((successes, code)) if state.solves >= successes => code,
            _ => {
                state.solves += 1;
                0
            }
        }
    }

    unsafe fn post_solve(&self, _pflow: Pflow) -> PetscErrorCode {
        self.record(NativeCall::PostSolve);
        0
    }

    unsafe fn converged(&self, _pflow: Pflow, converged: &mut PetscBool) -> PetscErrorCode {
        self.record(NativeCall::Converged);
        *converged = PETSC_TRUE;
        0
    }

    unsafe fn set_line_status(
        &self,
        _pflow: Pflow,
        from_bus: PetscInt,
        to_bus: PetscInt,
        id: &CStr,
        status: PetscInt,
    ) -> PetscErrorCode {
        self.record(NativeCall::SetLineStatus);
        let id = id.to_string_lossy().into_owned();
        self.state
            .borrow_mut()
            .lines
            .push((from_bus, to_bus, id, status));
        0
    }

    unsafe fn set_gen_status(
        &self,
        _pflow: Pflow,
        bus: PetscInt,
        id: &CStr,
        status: PetscInt,
    ) -> PetscErrorCode {
        self.record(NativeCall::SetGenStatus);
        let id = id.to_string_lossy().into_owned();
        self.state.borrow_mut().gens.push((bus, id, status));
        0
    }

    unsafe fn get_bus_voltage(
        &self,
        _pflow: Pflow,
        bus: PetscInt,
        vm: &mut PetscScalar,
        va: &mut PetscScalar,
        found: &mut PetscBool,
    ) -> PetscErrorCode {
        self.record(NativeCall::GetBusVoltage);
        *vm = 1.0 + f64::from(bus) / 1000.0;
        *va = -f64::from(bus);
        *found = PETSC_TRUE;
        0
    }

    unsafe fn set_load_power(
        &self,
        _pflow: Pflow,
        _bus: PetscInt,
        _pd: PetscScalar,
        _qd: PetscScalar,
    ) -> PetscErrorCode {
        self.record(NativeCall::SetLoadPower);
        0
    }

    unsafe fn get_load_power(
        &self,
        _pflow: Pflow,
        _bus: PetscInt,
        _pd: &mut PetscScalar,
        _qd: &mut PetscScalar,
        _found: &mut PetscBool,
    ) -> PetscErrorCode {
        self.record(NativeCall::GetLoadPower);
        0
    }

    unsafe fn add_bus_shunt(
        &self,
        _pflow: Pflow,
        _bus: PetscInt,
        _gs: PetscScalar,
        _bs: PetscScalar,
    ) -> PetscErrorCode {
        self.record(NativeCall::AddBusShunt);
        0
    }
}
