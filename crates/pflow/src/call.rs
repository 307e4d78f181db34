//! Identification of native routines and return-code checking.

use pflow_sys::{symbols, PetscErrorCode, PETSC_SUCCESS};
use tracing::debug;

use crate::error::{PflowError, PflowResult};

/// One variant per routine exported by `libpflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    LibraryInitialize,
    LibraryInitialized,
    LibraryFinalize,
    GetCommSelf,
    Create,
    Destroy,
    ReadMatPowerData,
    ReadPsseRawData,
    Solve,
    PostSolve,
    Converged,
    SetLineStatus,
    SetGenStatus,
    GetBusVoltage,
    SetLoadPower,
    GetLoadPower,
    AddBusShunt,
}

impl NativeCall {
    /// Exported C symbol name.
    pub fn symbol_name(&self) -> &'static str {
        match self {
            NativeCall::LibraryInitialize => symbols::LIBRARY_INITIALIZE,
            NativeCall::LibraryInitialized => symbols::LIBRARY_INITIALIZED,
            NativeCall::LibraryFinalize => symbols::LIBRARY_FINALIZE,
            NativeCall::GetCommSelf => symbols::GET_COMM_SELF,
            NativeCall::Create => symbols::CREATE,
            NativeCall::Destroy => symbols::DESTROY,
            NativeCall::ReadMatPowerData => symbols::READ_MATPOWER_DATA,
            NativeCall::ReadPsseRawData => symbols::READ_PSSE_RAW_DATA,
            NativeCall::Solve => symbols::SOLVE,
            NativeCall::PostSolve => symbols::POST_SOLVE,
            NativeCall::Converged => symbols::CONVERGED,
            NativeCall::SetLineStatus => symbols::SET_LINE_STATUS,
            NativeCall::SetGenStatus => symbols::SET_GEN_STATUS,
            NativeCall::GetBusVoltage => symbols::GET_BUS_VOLTAGE,
            NativeCall::SetLoadPower => symbols::SET_LOAD_POWER,
            NativeCall::GetLoadPower => symbols::GET_LOAD_POWER,
            NativeCall::AddBusShunt => symbols::ADD_BUS_SHUNT,
        }
    }

    /// Whether loading fails when the symbol is absent.
    ///
    /// The required set is what the adapter needs to initialize, load a
    /// MATPOWER case, solve and release its context.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            NativeCall::LibraryInitialize
                | NativeCall::LibraryInitialized
                | NativeCall::GetCommSelf
                | NativeCall::Create
                | NativeCall::Destroy
                | NativeCall::ReadMatPowerData
                | NativeCall::Solve
                | NativeCall::PostSolve
        )
    }

    /// All native routines.
    pub fn all() -> &'static [NativeCall] {
        &[
            NativeCall::LibraryInitialize,
            NativeCall::LibraryInitialized,
            NativeCall::LibraryFinalize,
            NativeCall::GetCommSelf,
            NativeCall::Create,
            NativeCall::Destroy,
            NativeCall::ReadMatPowerData,
            NativeCall::ReadPsseRawData,
            NativeCall::Solve,
            NativeCall::PostSolve,
            NativeCall::Converged,
            NativeCall::SetLineStatus,
            NativeCall::SetGenStatus,
            NativeCall::GetBusVoltage,
            NativeCall::SetLoadPower,
            NativeCall::GetLoadPower,
            NativeCall::AddBusShunt,
        ]
    }
}

impl std::fmt::Display for NativeCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol_name())
    }
}

/// Translate a native return code into a `Result`.
pub(crate) fn check(call: NativeCall, code: PetscErrorCode) -> PflowResult<()> {
    debug!(call = call.symbol_name(), code, "native call returned");
    if code == PETSC_SUCCESS {
        Ok(())
    } else {
        Err(PflowError::Native { call, code })
    }
}
