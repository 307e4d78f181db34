//! Values exchanged with the solver for individual network elements.
//!
//! Bus numbers are the external numbers used in the case file. Powers are in
//! MW / MVAr; the native side converts to per unit on the system MVA base.

use pflow_sys::PetscInt;
use serde::{Deserialize, Serialize};

/// In-service status of a line or generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementStatus {
    On,
    Off,
}

impl ElementStatus {
    pub(crate) fn as_native(&self) -> PetscInt {
        match self {
            ElementStatus::On => 1,
            ElementStatus::Off => 0,
        }
    }
}

impl From<bool> for ElementStatus {
    fn from(in_service: bool) -> Self {
        if in_service {
            ElementStatus::On
        } else {
            ElementStatus::Off
        }
    }
}

/// Solved bus voltage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusVoltage {
    /// Magnitude (pu)
    pub magnitude_pu: f64,
    /// Angle (degrees)
    pub angle_deg: f64,
}

/// Real and reactive load at a bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadPower {
    /// Real power (MW)
    pub p_mw: f64,
    /// Reactive power (MVAr)
    pub q_mvar: f64,
}

/// Shunt admittance expressed as power drawn at 1.0 pu voltage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuntAdmittance {
    /// Conductance (MW at 1.0 pu)
    pub g_mw: f64,
    /// Susceptance (MVAr at 1.0 pu)
    pub b_mvar: f64,
}

/// Outcome of [`PowerFlow::solve`](crate::PowerFlow::solve).
///
/// A solve that returns `Ok` but with `converged == false` ran to completion
/// without meeting the nonlinear solver tolerance; results are still readable
/// but should not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Whether the Newton iteration converged. `None` when the library does
    /// not export `PFLOWConverged`.
    pub converged: Option<bool>,
}
