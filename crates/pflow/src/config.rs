//! Configuration for locating and initializing the native library.
//! The default file lives in ~/.pflow/config/pflow.toml

use std::ffi::CString;
use std::path::{Path, PathBuf};

use pflow_sys::{DEFAULT_LIBRARY_NAME, DEFAULT_OPTIONS_FILE};
use serde::{Deserialize, Serialize};

use crate::case::CaseFormat;
use crate::error::{PflowError, PflowResult};

/// Environment variable naming the shared library to load.
pub const LIBRARY_ENV: &str = "PFLOW_LIBRARY";

/// Environment variable naming the PETSc options file.
pub const OPTIONS_FILE_ENV: &str = "PFLOW_OPTIONS_FILE";

/// Main binding configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PflowConfig {
    /// Shared library and initialization settings
    #[serde(default)]
    pub library: LibraryConfig,
    /// Case data defaults
    #[serde(default)]
    pub case: CaseConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shared library location and initialization arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Path to libpflow; the platform default name is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Options file passed to PFLOWLibraryInitialize
    #[serde(default = "default_options_file")]
    pub options_file: String,
    /// Banner printed by the library for -help
    #[serde(default)]
    pub help: Option<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: None,
            options_file: default_options_file(),
            help: None,
        }
    }
}

fn default_options_file() -> String {
    DEFAULT_OPTIONS_FILE.to_string()
}

impl LibraryConfig {
    /// Path handed to the dynamic loader.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_NAME))
    }

    /// Arguments for `PFLOWLibraryInitialize`.
    pub fn init_options(&self) -> PflowResult<InitOptions> {
        let options_file = if self.options_file.is_empty() {
            None
        } else {
            Some(to_cstring(&self.options_file, "options file name")?)
        };
        let help = self
            .help
            .as_deref()
            .map(|h| to_cstring(h, "help text"))
            .transpose()?;
        Ok(InitOptions { options_file, help })
    }
}

/// Case data defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaseConfig {
    /// Format used when a case path has no recognised extension
    #[serde(default)]
    pub format: Option<CaseFormat>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Validated arguments for library initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub options_file: Option<CString>,
    pub help: Option<CString>,
}

impl PflowConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> PflowResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| PflowError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load ~/.pflow/config/pflow.toml, or defaults when it does not exist,
    /// then apply environment overrides.
    pub fn discover() -> PflowResult<Self> {
        let config = match pflow_config_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply `PFLOW_LIBRARY` / `PFLOW_OPTIONS_FILE` style overrides read
    /// through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(LIBRARY_ENV).filter(|v| !v.is_empty()) {
            self.library.path = Some(PathBuf::from(path));
        }
        if let Some(file) = lookup(OPTIONS_FILE_ENV) {
            self.library.options_file = file;
        }
        self
    }
}

/// Get the binding home directory (defaults to ~/.pflow)
pub fn pflow_home() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pflow"))
}

/// Location: ~/.pflow/config/pflow.toml
pub fn pflow_config_path() -> Option<PathBuf> {
    pflow_home().map(|home| home.join("config").join("pflow.toml"))
}

pub(crate) fn to_cstring(value: &str, what: &'static str) -> PflowResult<CString> {
    CString::new(value).map_err(|source| PflowError::InvalidString { what, source })
}
