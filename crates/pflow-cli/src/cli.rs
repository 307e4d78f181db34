use clap::{CommandFactory, Parser, ValueEnum, ValueHint};
use pflow::CaseFormat;
use std::path::PathBuf;

use crate::outage::{GenOutage, LineOutage};

/// Solve an AC power flow with the PFLOW library, optionally re-solving
/// after line and generator outages.
#[derive(Parser, Debug)]
#[command(name = "pflow", author, version, about, long_about = None)]
pub struct Cli {
    /// Network data file
    #[arg(long, default_value = "datafiles/case9mod.m", value_hint = ValueHint::FilePath)]
    pub netfile: PathBuf,

    /// Case file format (inferred from the extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Path to the PFLOW shared library
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub library: Option<PathBuf>,

    /// PETSc options file passed to library initialization
    #[arg(long)]
    pub options_file: Option<String>,

    /// Configuration file (defaults to ~/.pflow/config/pflow.toml)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Take a line out of service after the base solve (FROM:TO[:ID])
    #[arg(long = "trip-line", value_name = "FROM:TO[:ID]")]
    pub trip_lines: Vec<LineOutage>,

    /// Take a generator out of service after the line outages (BUS[:ID])
    #[arg(long = "trip-gen", value_name = "BUS[:ID]")]
    pub trip_gens: Vec<GenOutage>,

    /// Report the voltage at this bus after every solve
    #[arg(long = "bus", value_name = "BUS")]
    pub buses: Vec<i32>,

    /// Write the report as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Set the logging level (defaults to the configured level)
    #[arg(long)]
    pub log_level: Option<tracing::Level>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Matpower,
    Psse,
}

impl From<FormatArg> for CaseFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Matpower => CaseFormat::Matpower,
            FormatArg::Psse => CaseFormat::Psse,
        }
    }
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
