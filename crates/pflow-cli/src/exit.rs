//! Process exit codes.

use pflow::PflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success (check the report for convergence)
    Success = 0,
    /// Invalid input (arguments, configuration, case file)
    InvalidInput = 1,
    /// The native solver reported an error
    SolverError = 2,
    /// The library could not be loaded or initialized
    LibraryError = 3,
}

impl ExitCode {
    /// Classify an error by the first [`PflowError`] in its chain.
    pub fn for_error(error: &anyhow::Error) -> Self {
        let pflow_error = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<PflowError>());
        match pflow_error {
            Some(
                PflowError::LibraryLoad { .. }
                | PflowError::MissingSymbol { .. }
                | PflowError::Initialization,
            ) => ExitCode::LibraryError,
            Some(
                PflowError::Native { .. }
                | PflowError::NullHandle
                | PflowError::Unsupported(_)
                | PflowError::InvalidState { .. },
            ) => ExitCode::SolverError,
            _ => ExitCode::InvalidInput,
        }
    }
}
