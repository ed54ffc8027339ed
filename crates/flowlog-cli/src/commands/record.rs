//! Record command implementation.
//!
//! Opens the stats file once, then runs the acquisition loop against the
//! serial device until Ctrl-C, opening a fresh channel for every value.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use flowlog_core::acquire::{self, AcquireOptions, AcquireSummary};
use flowlog_core::{ByteChannel, ReopenOptions, SerialChannel};
use flowlog_store::StatsStore;
use flowlog_types::Record;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Arguments for the record command.
pub struct RecordArgs {
    pub device: String,
    pub stats_file: PathBuf,
    pub marker: String,
    pub poll_interval: Duration,
    pub reopen_delay: Option<Duration>,
    pub count: Option<u64>,
}

impl RecordArgs {
    fn acquire_options(&self) -> AcquireOptions {
        let reopen = match self.reopen_delay {
            Some(delay) => ReopenOptions::fixed_delay(delay),
            None => ReopenOptions::default(),
        };
        let options = AcquireOptions::default()
            .marker(self.marker.clone())
            .reopen(reopen);
        match self.count {
            Some(count) => options.max_records(count),
            None => options,
        }
    }
}

pub fn cmd_record(args: RecordArgs, cancel: &CancellationToken) -> Result<()> {
    let mut store = StatsStore::open(&args.stats_file)?;
    let options = args.acquire_options();

    info!(
        "Listening on {} for '{}' (Ctrl-C to stop)",
        args.device, options.marker
    );

    let device = args.device.as_str();
    let poll_interval = args.poll_interval;
    let summary = record_into(
        &mut store,
        || SerialChannel::open_with_poll_interval(device, poll_interval),
        &options,
        cancel,
    )?;

    info!(
        "Stopped after {} records ({} failed cycles, {} rejected values)",
        summary.records, summary.failures, summary.rejected
    );
    Ok(())
}

/// Run the acquisition loop with every accepted record appended to `store`.
fn record_into<C, O>(
    store: &mut StatsStore,
    open: O,
    options: &AcquireOptions,
    cancel: &CancellationToken,
) -> flowlog_core::Result<AcquireSummary>
where
    C: ByteChannel,
    O: FnMut() -> flowlog_core::Result<C>,
{
    acquire::run(open, |record: &Record| store.append(record), options, cancel)
}
