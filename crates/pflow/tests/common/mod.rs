//! In-memory stand-in for libpflow that records every call.
//!
//! Behaviour follows the native library where the tests depend on it: case
//! readers fail with PETSC_ERR_FILE_OPEN for missing files, GetLoadPower
//! leaves `found` untouched for unknown buses, and the initialized flag
//! persists until finalize.

#![allow(dead_code)]

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::CStr;
use std::path::Path;
use std::rc::Rc;

use pflow::sys::{
    MpiComm, PetscBool, PetscErrorCode, PetscInt, PetscScalar, Pflow, PflowInfo, PETSC_ERR_SUP,
    PETSC_FALSE, PETSC_TRUE,
};
use pflow::{Backend, InitOptions, NativeCall, Runtime};

/// `PETSC_ERR_FILE_OPEN`.
pub const PETSC_ERR_FILE_OPEN: PetscErrorCode = 65;

/// `PETSC_COMM_SELF` as MPICH encodes it.
pub const COMM_SELF: MpiComm = 0x4400_0001;

#[derive(Debug)]
pub struct Journal {
    pub calls: Vec<NativeCall>,
    pub initialized: bool,
    pub set_flag_on_initialize: bool,
    pub failures: HashMap<NativeCall, PetscErrorCode>,
    pub unsupported: HashSet<NativeCall>,
    pub options_file: Option<String>,
    pub live_contexts: usize,
    pub contexts_created: usize,
    pub case_path: Option<String>,
    pub converged: bool,
    pub voltages: BTreeMap<PetscInt, (PetscScalar, PetscScalar)>,
    pub loads: BTreeMap<PetscInt, (PetscScalar, PetscScalar)>,
    pub line_status: Vec<(PetscInt, PetscInt, String, PetscInt)>,
    pub gen_status: Vec<(PetscInt, String, PetscInt)>,
    pub shunts: Vec<(PetscInt, PetscScalar, PetscScalar)>,
}

impl Default for Journal {
    fn default() -> Self {
        // WSCC 9-bus solution
        let voltages = [
            (1, (1.040, 0.000)),
            (2, (1.025, 9.280)),
            (3, (1.025, 4.665)),
            (4, (1.026, -2.217)),
            (5, (0.996, -3.989)),
            (6, (1.013, -3.687)),
            (7, (1.026, 3.720)),
            (8, (1.016, 0.728)),
            (9, (1.032, 1.967)),
        ]
        .into_iter()
        .collect();
        let loads = [(5, (90.0, 30.0)), (7, (100.0, 35.0)), (9, (125.0, 50.0))]
            .into_iter()
            .collect();

        Journal {
            calls: Vec::new(),
            initialized: false,
            set_flag_on_initialize: true,
            failures: HashMap::new(),
            unsupported: HashSet::new(),
            options_file: None,
            live_contexts: 0,
            contexts_created: 0,
            case_path: None,
            converged: true,
            voltages,
            loads,
            line_status: Vec::new(),
            gen_status: Vec::new(),
            shunts: Vec::new(),
        }
    }
}

/// Cloning shares the journal, so a test can keep a copy after handing the
/// backend to a runtime.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    journal: Rc<RefCell<Journal>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose initialization leaves the flag unset.
    pub fn failing_initialization() -> Self {
        let backend = Self::new();
        backend.journal_mut().set_flag_on_initialize = false;
        backend
    }

    pub fn fail(self, call: NativeCall, code: PetscErrorCode) -> Self {
        self.journal_mut().failures.insert(call, code);
        self
    }

    pub fn without(self, call: NativeCall) -> Self {
        self.journal_mut().unsupported.insert(call);
        self
    }

    pub fn journal(&self) -> Ref<'_, Journal> {
        self.journal.borrow()
    }

    pub fn journal_mut(&self) -> RefMut<'_, Journal> {
        self.journal.borrow_mut()
    }

    pub fn count(&self, call: NativeCall) -> usize {
        self.journal().calls.iter().filter(|c| **c == call).count()
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.journal().calls.clone()
    }

    /// Record the call and return the injected failure code, if any.
    fn enter(&self, call: NativeCall) -> Option<PetscErrorCode> {
        let mut journal = self.journal_mut();
        journal.calls.push(call);
        if journal.unsupported.contains(&call) {
            return Some(PETSC_ERR_SUP);
        }
        journal.failures.get(&call).copied()
    }

    fn read_case(&self, call: NativeCall, netfile: &CStr) -> PetscErrorCode {
        if let Some(code) = self.enter(call) {
            return code;
        }
        let path = netfile.to_string_lossy().into_owned();
        if !Path::new(&path).exists() {
            return PETSC_ERR_FILE_OPEN;
        }
        self.journal_mut().case_path = Some(path);
        0
    }
}

impl Backend for RecordingBackend {
    fn supports(&self, call: NativeCall) -> bool {
        !self.journal().unsupported.contains(&call)
    }

    fn describe(&self) -> String {
        "recording backend".to_string()
    }

    fn library_id(&self) -> usize {
        Rc::as_ptr(&self.journal) as usize
    }

    fn library_initialize(
        &self,
        options_file: Option<&CStr>,
        _help: Option<&CStr>,
    ) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::LibraryInitialize) {
            return code;
        }
        let mut journal = self.journal_mut();
        journal.options_file = options_file.map(|f| f.to_string_lossy().into_owned());
        if journal.set_flag_on_initialize {
            journal.initialized = true;
        }
        0
    }

    fn library_initialized(&self, is_initialized: &mut PetscBool) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::LibraryInitialized) {
            return code;
        }
        *is_initialized = if self.journal().initialized {
            PETSC_TRUE
        } else {
            PETSC_FALSE
        };
        0
    }

    fn library_finalize(&self) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::LibraryFinalize) {
            return code;
        }
        self.journal_mut().initialized = false;
        0
    }

    fn comm_self(&self, comm: &mut MpiComm) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::GetCommSelf) {
            return code;
        }
        *comm = COMM_SELF;
        0
    }

    fn create(&self, comm: MpiComm, pflow: &mut Pflow) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::Create) {
            return code;
        }
        assert_eq!(comm, COMM_SELF, "context created on an unexpected communicator");
        let mut journal = self.journal_mut();
        journal.contexts_created += 1;
        journal.live_contexts += 1;
        // Never dereferenced; only has to be distinct and non-null.
        *pflow = (0x1000 + 0x10 * journal.contexts_created) as *mut PflowInfo;
        0
    }

    unsafe fn destroy(&self, pflow: &mut Pflow) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::Destroy) {
            return code;
        }
        assert!(!pflow.is_null(), "destroy called with a null context");
        self.journal_mut().live_contexts -= 1;
        *pflow = std::ptr::null_mut();
        0
    }

    unsafe fn read_matpower_data(&self, _pflow: Pflow, netfile: &CStr) -> PetscErrorCode {
        self.read_case(NativeCall::ReadMatPowerData, netfile)
    }

    unsafe fn read_psse_raw_data(&self, _pflow: Pflow, netfile: &CStr) -> PetscErrorCode {
        self.read_case(NativeCall::ReadPsseRawData, netfile)
    }

    unsafe fn solve(&self, _pflow: Pflow) -> PetscErrorCode {
        self.enter(NativeCall::Solve).unwrap_or(0)
    }

    unsafe fn post_solve(&self, _pflow: Pflow) -> PetscErrorCode {
        self.enter(NativeCall::PostSolve).unwrap_or(0)
    }

    unsafe fn converged(&self, _pflow: Pflow, converged: &mut PetscBool) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::Converged) {
            return code;
        }
        *converged = if self.journal().converged {
            PETSC_TRUE
        } else {
            PETSC_FALSE
        };
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
        if let Some(code) = self.enter(NativeCall::SetLineStatus) {
            return code;
        }
        let id = id.to_string_lossy().into_owned();
        self.journal_mut()
            .line_status
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
        if let Some(code) = self.enter(NativeCall::SetGenStatus) {
            return code;
        }
        let id = id.to_string_lossy().into_owned();
        self.journal_mut().gen_status.push((bus, id, status));
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
        if let Some(code) = self.enter(NativeCall::GetBusVoltage) {
            return code;
        }
        match self.journal().voltages.get(&bus) {
            Some(&(m, a)) => {
                *vm = m;
                *va = a;
                *found = PETSC_TRUE;
            }
            None => *found = PETSC_FALSE,
        }
        0
    }

    unsafe fn set_load_power(
        &self,
        _pflow: Pflow,
        bus: PetscInt,
        pd: PetscScalar,
        qd: PetscScalar,
    ) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::SetLoadPower) {
            return code;
        }
        let mut journal = self.journal_mut();
        if let Some(load) = journal.loads.get_mut(&bus) {
            *load = (pd, qd);
        }
        0
    }

    unsafe fn get_load_power(
        &self,
        _pflow: Pflow,
        bus: PetscInt,
        pd: &mut PetscScalar,
        qd: &mut PetscScalar,
        found: &mut PetscBool,
    ) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::GetLoadPower) {
            return code;
        }
        if let Some(&(p, q)) = self.journal().loads.get(&bus) {
            *pd = p;
            *qd = q;
            *found = PETSC_TRUE;
        }
        0
    }

    unsafe fn add_bus_shunt(
        &self,
        _pflow: Pflow,
        bus: PetscInt,
        gs: PetscScalar,
        bs: PetscScalar,
    ) -> PetscErrorCode {
        if let Some(code) = self.enter(NativeCall::AddBusShunt) {
            return code;
        }
        self.journal_mut().shunts.push((bus, gs, bs));
        0
    }
}

/// Initialize a runtime with default options.
pub fn runtime(backend: &RecordingBackend) -> Runtime<RecordingBackend> {
    Runtime::initialize(backend.clone(), &InitOptions::default()).expect("runtime initializes")
}

/// A case file that exists on disk. The recording backend does not parse it.
pub fn case_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, "function mpc = case9\nmpc.baseMVA = 100;\n").unwrap();
    path
}
