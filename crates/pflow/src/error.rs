//! Error types for the PFLOW binding.

use std::ffi::NulError;
use std::path::PathBuf;

use pflow_sys::PetscErrorCode;
use thiserror::Error;

use crate::call::NativeCall;
use crate::power_flow::LifecycleState;

/// Errors that can occur while driving the native library.
#[derive(Debug, Error)]
pub enum PflowError {
    /// The shared library could not be opened.
    #[error("Failed to load PFLOW library from {}: {source}", .path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A mandatory symbol is not exported by the library.
    #[error("PFLOW library does not export required symbol {symbol}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// An optional routine is not exported by the loaded library.
    #[error("PFLOW library does not support {0}")]
    Unsupported(NativeCall),

    /// The initialized flag was not set after library initialization.
    #[error("PFLOW library not initialized")]
    Initialization,

    /// A native routine returned a non-zero error code.
    #[error("{call} failed with PETSc error code {code}")]
    Native { call: NativeCall, code: PetscErrorCode },

    /// `PFLOWCreate` reported success but produced a null context.
    #[error("PFLOWCreate returned a null solver context")]
    NullHandle,

    /// An operation was called out of lifecycle order.
    #[error("Cannot {operation} while the solver is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    /// A string argument contains an interior NUL byte.
    #[error("Invalid {what}: {source}")]
    InvalidString {
        what: &'static str,
        #[source]
        source: NulError,
    },

    /// The requested bus is not part of the loaded case.
    #[error("Bus {0} not found in the loaded case")]
    BusNotFound(i32),

    /// Case format name or file extension not recognised.
    #[error("Unknown case format: {0}")]
    UnknownCaseFormat(String),

    /// Configuration file could not be parsed.
    #[error("Invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PflowError {
    /// True for failures reported by the native library itself, as opposed to
    /// misuse caught by the binding.
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            PflowError::Native { .. } | PflowError::Initialization | PflowError::NullHandle
        )
    }
}

/// Result type alias for binding operations.
pub type PflowResult<T> = Result<T, PflowError>;
