//! Command-line serial logger for dispenser durations.
//!
//! Without a mode flag the logger records: it listens on the serial device
//! for `Duration: [<seconds>]` and appends each value, with a timestamp, to
//! the stats file. `--stats` prints today's log and totals from that file.
//!
//! # Configuration
//!
//! Settings are read from `~/.config/flowlog/config.toml` (or platform
//! equivalent): `device`, `stats_file`, `marker`, `delay_file`,
//! `poll_interval_ms` and `reopen_delay_ms`. Flags override environment
//! variables, which override the config file.
//!
//! # Environment Variables
//!
//! - `FLOWLOG_DEVICE`: serial device path (overridden by `--device`)
//! - `FLOWLOG_FILE`: stats file path (overridden by `--file`)
//! - `RUST_LOG`: log filter when neither `-v` nor `-q` is given
//!
//! # Exit Codes
//!
//! `0` on success, `1` when a file or device cannot be used, `2` for invalid
//! arguments.

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use flowlog_core::serial::DEFAULT_POLL_INTERVAL;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Mode};
use crate::commands::{RecordArgs, cmd_delay, cmd_record, cmd_send, cmd_stats};
use crate::config::{
    Config, resolve_delay_file, resolve_device, resolve_marker, resolve_stats_file,
};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(usage) = e.downcast_ref::<clap::Error>() {
                usage.exit();
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.mode() {
        Mode::Record => {
            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || handler_token.cancel())
                .context("Failed to install Ctrl-C handler")?;

            cmd_record(
                RecordArgs {
                    device: resolve_device(cli.device, &config),
                    stats_file: resolve_stats_file(cli.file, &config),
                    marker: resolve_marker(cli.marker, &config),
                    poll_interval: config.poll_interval().unwrap_or(DEFAULT_POLL_INTERVAL),
                    reopen_delay: config.reopen_delay(),
                    count: cli.count,
                },
                &cancel,
            )
        }
        Mode::Stats => cmd_stats(&resolve_stats_file(cli.file, &config), cli.format),
        Mode::Delay(seconds) => cmd_delay(seconds, &resolve_delay_file(cli.delay_file, &config)),
        Mode::Send(command) => cmd_send(&resolve_device(cli.device, &config), &command),
    }
}
