//! Case data file formats understood by the native readers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::call::NativeCall;
use crate::error::PflowError;

/// Network data format of a case file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFormat {
    /// MATPOWER `.m` case file.
    Matpower,
    /// PSS/E raw data file.
    #[serde(alias = "psse_raw", alias = "raw")]
    Psse,
}

impl CaseFormat {
    /// Guess the format from the file extension (`.m` or `.raw`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "m" => Some(CaseFormat::Matpower),
            "raw" => Some(CaseFormat::Psse),
            _ => None,
        }
    }

    /// Native reader for this format.
    pub fn reader(&self) -> NativeCall {
        match self {
            CaseFormat::Matpower => NativeCall::ReadMatPowerData,
            CaseFormat::Psse => NativeCall::ReadPsseRawData,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CaseFormat::Matpower => "MATPOWER",
            CaseFormat::Psse => "PSS/E raw",
        }
    }
}

impl std::fmt::Display for CaseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for CaseFormat {
    type Err = PflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matpower" | "m" => Ok(CaseFormat::Matpower),
            "psse" | "psse_raw" | "raw" => Ok(CaseFormat::Psse),
            _ => Err(PflowError::UnknownCaseFormat(s.to_string())),
        }
    }
}
