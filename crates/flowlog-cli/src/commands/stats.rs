//! Stats command implementation.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flowlog_store::{DailyReport, StatsReporter};

use crate::cli::OutputFormat;

pub fn cmd_stats(path: &Path, format: OutputFormat) -> Result<()> {
    let report = StatsReporter::local().report(path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &report, format)?;
    out.flush()?;
    Ok(())
}

fn write_report<W: Write>(out: &mut W, report: &DailyReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => report.write_text(out)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            writeln!(out, "{}", json)?;
        }
    }
    Ok(())
}
