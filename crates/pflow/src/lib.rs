//! Safe Rust binding to PFLOW, a PETSc-based AC power flow library.
//!
//! All numerics (Newton-Raphson on the power balance equations, Jacobian
//! assembly, topology checks) live in the native library. This crate loads
//! it at runtime, checks every return code, and ties native resources to
//! Rust ownership:
//!
//! - [`Runtime`] initializes the library once per process and finalizes it
//!   when the last owner goes away.
//! - [`PowerFlow`] owns one solver context and destroys it on drop. Its
//!   [`LifecycleState`] rejects out-of-order calls before they reach native
//!   code.
//!
//! # Usage
//!
//! ```ignore
//! use pflow::{ElementStatus, PflowConfig, PowerFlow};
//!
//! let config = PflowConfig::discover()?;
//! let mut pflow = PowerFlow::open(&config)?;
//! pflow.read_case("datafiles/case9mod.m")?;
//! let report = pflow.solve()?;
//!
//! pflow.set_line_status(8, 9, "1 ", ElementStatus::Off)?;
//! pflow.solve()?;
//! let v = pflow.bus_voltage(9)?;
//! println!("bus 9: {:.4} pu at {:.2} deg", v.magnitude_pu, v.angle_deg);
//! ```
//!
//! # Locating the library
//!
//! [`PflowConfig::discover`] reads `~/.pflow/config/pflow.toml` and the
//! `PFLOW_LIBRARY` / `PFLOW_OPTIONS_FILE` environment variables. Without a
//! configured path the platform name (`libpflow.so`, `libpflow.dylib`,
//! `pflow.dll`) is handed to the dynamic loader.

pub mod backend;
pub mod call;
pub mod case;
pub mod config;
pub mod error;
pub mod library;
pub mod network;
pub mod power_flow;
pub mod runtime;

pub use backend::Backend;
pub use call::NativeCall;
pub use case::CaseFormat;
pub use config::{InitOptions, PflowConfig};
pub use error::{PflowError, PflowResult};
pub use library::NativeLibrary;
pub use network::{BusVoltage, ElementStatus, LoadPower, ShuntAdmittance, SolveReport};
pub use power_flow::{LifecycleState, PowerFlow};
pub use runtime::Runtime;

/// Raw declarations, re-exported for [`Backend`] implementors.
pub use pflow_sys as sys;
