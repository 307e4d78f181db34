//! Solve report and its plain / JSON renderings.

use std::io::Write;

use anyhow::{Context, Result};
use pflow::{BusVoltage, CaseFormat};
use serde::Serialize;
use tabwriter::TabWriter;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub case: String,
    pub format: CaseFormat,
    pub stages: Vec<StageReport>,
}

/// Results after one solve.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub label: String,
    pub converged: Option<bool>,
    pub buses: Vec<BusResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusResult {
    pub bus: i32,
    #[serde(flatten)]
    pub voltage: BusVoltage,
}

impl Report {
    pub fn write_json<W: Write>(&self, mut out: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut out, self).context("Serializing report to JSON")?;
        writeln!(out)?;
        Ok(())
    }

    pub fn write_table<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = TabWriter::new(out);
        writeln!(writer, "Case: {} ({})", self.case, self.format)?;
        writeln!(writer, "STAGE\tCONVERGED\tBUS\tVM (pu)\tVA (deg)")?;
        for stage in &self.stages {
            let converged = match stage.converged {
                Some(true) => "yes",
                Some(false) => "NO",
                None => "unknown",
            };
            if stage.buses.is_empty() {
                writeln!(writer, "{}\t{}\t-\t-\t-", stage.label, converged)?;
            }
            for bus in &stage.buses {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{:.4}\t{:.3}",
                    stage.label,
                    converged,
                    bus.bus,
                    bus.voltage.magnitude_pu,
                    bus.voltage.angle_deg
                )?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
