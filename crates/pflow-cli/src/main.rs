//! `pflow`: solve a power flow case through the PFLOW shared library.
//!
//! The run mirrors the classic driver: a base solve, then every `--trip-line`
//! outage and a re-solve, then every `--trip-gen` outage and a final solve.
//!
//! Exit codes are defined in `pflow_cli::ExitCode`.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use pflow::PflowConfig;
use pflow_cli::cli::Cli;
use pflow_cli::{driver, ExitCode};
use tracing::{error, info, Level};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(ExitCode::InvalidInput as i32);
        }
        Err(e) => e.exit(),
    };

    let config = load_config(&cli);
    let level = cli.log_level.unwrap_or_else(|| match &config {
        Ok(config) => config.logging.level.parse().unwrap_or(Level::INFO),
        Err(_) => Level::INFO,
    });

    // Respects RUST_LOG; the level directive is added on top
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("pflow v{}", env!("CARGO_PKG_VERSION"));

    let exit_code = match config.and_then(|config| run(&cli, config)) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::for_error(&e)
        }
    };

    std::process::exit(exit_code as i32);
}

fn load_config(cli: &Cli) -> Result<PflowConfig> {
    let config = match &cli.config {
        Some(path) => PflowConfig::load(path)
            .map(|config| config.with_overrides(|key| std::env::var(key).ok()))
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => PflowConfig::discover().context("Loading configuration")?,
    };
    Ok(driver::apply_overrides(cli, config))
}

fn run(cli: &Cli, config: PflowConfig) -> Result<()> {
    let report = driver::run(cli, &config)?;

    let stdout = io::stdout();
    if cli.json {
        report.write_json(stdout.lock())?;
    } else {
        report.write_table(stdout.lock())?;
    }
    Ok(())
}
