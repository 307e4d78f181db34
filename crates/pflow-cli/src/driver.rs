//! Base solve followed by line and generator outage re-solves.

use anyhow::{anyhow, Context, Result};
use pflow::{Backend, CaseFormat, ElementStatus, PflowConfig, PowerFlow};
use tracing::info;

use crate::cli::Cli;
use crate::report::{BusResult, Report, StageReport};

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(cli: &Cli, mut config: PflowConfig) -> PflowConfig {
    if let Some(library) = &cli.library {
        config.library.path = Some(library.clone());
    }
    if let Some(options_file) = &cli.options_file {
        config.library.options_file = options_file.clone();
    }
    if let Some(format) = cli.format {
        config.case.format = Some(format.into());
    }
    config
}

/// `--format`, then the file extension, then the configured default.
pub fn resolve_format(cli: &Cli, config: &PflowConfig) -> Result<CaseFormat> {
    cli.format
        .map(CaseFormat::from)
        .or_else(|| CaseFormat::from_path(&cli.netfile))
        .or(config.case.format)
        .ok_or_else(|| {
            anyhow!(
                "Cannot infer case format of {}; pass --format matpower|psse",
                cli.netfile.display()
            )
        })
}

pub fn run(cli: &Cli, config: &PflowConfig) -> Result<Report> {
    let format = resolve_format(cli, config)?;

    let mut pflow = PowerFlow::open(config).with_context(|| {
        format!(
            "Loading PFLOW library from {}",
            config.library.resolved_path().display()
        )
    })?;

    run_case(&mut pflow, cli, format)
}

/// Read the case into a fresh context, then run the base solve and the
/// line and generator outage stages.
pub fn run_case<B: Backend>(
    pflow: &mut PowerFlow<B>,
    cli: &Cli,
    format: CaseFormat,
) -> Result<Report> {
    pflow
        .read_case_data(&cli.netfile, format)
        .with_context(|| format!("Reading {} case {}", format, cli.netfile.display()))?;

    let mut stages = Vec::new();
    stages.push(solve_stage(pflow, "base case", &cli.buses)?);

    if !cli.trip_lines.is_empty() {
        for line in &cli.trip_lines {
            pflow
                .set_line_status(line.from_bus, line.to_bus, &line.id, ElementStatus::Off)
                .with_context(|| format!("Tripping line {line}"))?;
            info!(%line, "Line out of service");
        }
        stages.push(solve_stage(pflow, "line outages", &cli.buses)?);
    }

    if !cli.trip_gens.is_empty() {
        for generator in &cli.trip_gens {
            pflow
                .set_gen_status(generator.bus, &generator.id, ElementStatus::Off)
                .with_context(|| format!("Tripping generator {generator}"))?;
            info!(%generator, "Generator out of service");
        }
        stages.push(solve_stage(pflow, "generator outages", &cli.buses)?);
    }

    Ok(Report {
        case: cli.netfile.display().to_string(),
        format,
        stages,
    })
}

fn solve_stage<B: Backend>(
    pflow: &mut PowerFlow<B>,
    label: &str,
    buses: &[i32],
) -> Result<StageReport> {
    let report = pflow
        .solve()
        .with_context(|| format!("Power flow solve failed ({label})"))?;

    let buses = buses
        .iter()
        .map(|&bus| {
            pflow
                .bus_voltage(bus)
                .map(|voltage| BusResult { bus, voltage })
                .with_context(|| format!("Reading voltage at bus {bus}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StageReport {
        label: label.to_string(),
        converged: report.converged,
        buses,
    })
}
