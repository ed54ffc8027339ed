//! The long-running acquisition loop.
//!
//! Each cycle opens a fresh channel, runs the [`PatternScanner`] once, stamps
//! the extracted value and hands the [`Record`] to a sink. Failed cycles are
//! retried after a backoff; the loop ends on cancellation, after an optional
//! number of records, or when a failure is not worth retrying.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flowlog_types::{DEFAULT_MARKER, Record, parse_value};

use crate::error::{Error, Result};
use crate::reopen::{ReopenOptions, sleep_unless_cancelled};
use crate::scanner::PatternScanner;
use crate::traits::ByteChannel;

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Marker announcing a bracketed value.
    pub marker: String,
    /// Give up on a single scan after this long and reopen (None = wait forever).
    pub scan_timeout: Option<Duration>,
    /// Stop after this many records (None = run until cancelled).
    pub max_records: Option<u64>,
    /// Backoff between failed cycles.
    pub reopen: ReopenOptions,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            scan_timeout: None,
            max_records: None,
            reopen: ReopenOptions::default(),
        }
    }
}

impl AcquireOptions {
    /// Set the marker.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the per-scan timeout.
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = Some(timeout);
        self
    }

    /// Stop after `count` records.
    pub fn max_records(mut self, count: u64) -> Self {
        self.max_records = Some(count);
        self
    }

    /// Set the reopen policy.
    pub fn reopen(mut self, reopen: ReopenOptions) -> Self {
        self.reopen = reopen;
        self
    }
}

/// What a finished acquisition run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquireSummary {
    /// Records handed to the sink.
    pub records: u64,
    /// Extracted values that were not numbers and were dropped.
    pub rejected: u64,
    /// Failed open/scan cycles.
    pub failures: u64,
    /// The most recently persisted record.
    pub last: Option<Record>,
}

/// Run the acquisition loop.
///
/// `open` is called once per cycle and must return a freshly opened channel;
/// the channel is dropped (closed) when the cycle ends. `sink` persists each
/// record; a sink error stops the loop with [`Error::Sink`].
///
/// Recoverable failures (see [`Error::is_recoverable`]) are logged and
/// retried according to `options.reopen`. Cancellation is not an error: the
/// summary of the work done so far is returned.
pub fn run<C, O, S, E>(
    mut open: O,
    mut sink: S,
    options: &AcquireOptions,
    cancel: &CancellationToken,
) -> Result<AcquireSummary>
where
    C: ByteChannel,
    O: FnMut() -> Result<C>,
    S: FnMut(&Record) -> std::result::Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    options.reopen.validate()?;
    let mut scanner = PatternScanner::new(&options.marker)?;
    let mut summary = AcquireSummary::default();
    let mut consecutive_failures: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            info!("Acquisition cancelled");
            break;
        }
        if options
            .max_records
            .is_some_and(|max| summary.records >= max)
        {
            debug!("Reached record limit of {}", summary.records);
            break;
        }

        info!("Recording stats..");
        let outcome = open().and_then(|mut channel| {
            scanner.scan(&mut channel, cancel, options.scan_timeout)
        });

        match outcome {
            Ok(text) => {
                consecutive_failures = 0;
                match parse_value(&text).map(Record::now) {
                    Ok(record) => {
                        sink(&record).map_err(|e| Error::Sink(Box::new(e)))?;
                        summary.records += 1;
                        summary.last = Some(record);
                        info!("Recorded {}", record);
                    }
                    Err(e) => {
                        summary.rejected += 1;
                        warn!("Discarding extracted value: {}", e);
                    }
                }
            }
            Err(Error::Cancelled) => {
                info!("Acquisition cancelled");
                break;
            }
            Err(e) if e.is_recoverable() => {
                summary.failures += 1;
                consecutive_failures = consecutive_failures.saturating_add(1);
                scanner.reset();
                warn!("Failed to get value: {}", e);

                if !options.reopen.allows(consecutive_failures) {
                    warn!(
                        "Giving up after {} consecutive failures",
                        consecutive_failures
                    );
                    return Err(e);
                }
                let delay = options.reopen.delay_for_attempt(consecutive_failures - 1);
                debug!("Reopening in {:?}", delay);
                if !sleep_unless_cancelled(delay, cancel) {
                    info!("Acquisition cancelled");
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChannel;
    use std::collections::VecDeque;
    use std::io::ErrorKind;

    fn quick() -> AcquireOptions {
        AcquireOptions::default().reopen(ReopenOptions::fixed_delay(Duration::from_millis(1)))
    }

    fn opener(
        mut script: VecDeque<Result<MockChannel>>,
    ) -> impl FnMut() -> Result<MockChannel> {
        move || {
            script
                .pop_front()
                .unwrap_or_else(|| Err(Error::device_open("mock", "script exhausted")))
        }
    }

    #[test]
    fn test_one_record_per_cycle() {
        let before = time::OffsetDateTime::now_utc().unix_timestamp();
        let script = VecDeque::from([
            Ok(MockChannel::builder().chunk("Duration: [2.0]\n").build()),
            Ok(MockChannel::builder()
                .chunk("Dur")
                .chunk("ation: [3.5]")
                .build()),
        ]);
        let mut records = Vec::new();
        let summary = run(
            opener(script),
            |r: &Record| {
                records.push(*r);
                Ok::<_, std::io::Error>(())
            },
            &quick().max_records(2),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.failures, 0);
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.0, 3.5]);
        assert!(records[0].timestamp <= records[1].timestamp);
        let after = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!(records.iter().all(|r| (before..=after).contains(&r.timestamp)));
        assert_eq!(summary.last, Some(records[1]));
    }

    #[test]
    fn test_reopens_after_failures() {
        let script = VecDeque::from([
            Err(Error::device_open("/dev/ttyUSB0", "busy")),
            Ok(MockChannel::builder()
                .chunk("Duration: [")
                .read_error(ErrorKind::BrokenPipe)
                .build()),
            Ok(MockChannel::builder().chunk("4]Duration: [5]").build()),
        ]);
        let mut records = Vec::new();
        let summary = run(
            opener(script),
            |r: &Record| {
                records.push(*r);
                Ok::<_, std::io::Error>(())
            },
            &quick().max_records(1),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(summary.failures, 2);
        // The partial "[" from the broken channel must not pair with "4]".
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 5.0);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut opens = 0;
        let err = run(
            || {
                opens += 1;
                Err::<MockChannel, _>(Error::device_open("/dev/ttyUSB0", "missing"))
            },
            |_: &Record| Ok::<_, std::io::Error>(()),
            &AcquireOptions::default().reopen(
                ReopenOptions::fixed_delay(Duration::from_millis(1)).max_attempts(3),
            ),
            &CancellationToken::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::DeviceOpen { .. }));
        assert_eq!(opens, 3);
    }

    #[test]
    fn test_unparseable_value_is_skipped() {
        let script = VecDeque::from([
            Ok(MockChannel::builder().chunk("Duration: [n/a]").build()),
            Ok(MockChannel::builder().chunk("Duration: [1.25]").build()),
        ]);
        let mut records = Vec::new();
        let summary = run(
            opener(script),
            |r: &Record| {
                records.push(*r);
                Ok::<_, std::io::Error>(())
            },
            &quick().max_records(1),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(summary.rejected, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 1.25);
    }

    #[test]
    fn test_sink_error_is_fatal() {
        let script = VecDeque::from([Ok(MockChannel::builder().chunk("Duration: [1]").build())]);
        let err = run(
            opener(script),
            |_: &Record| Err(std::io::Error::other("disk full")),
            &quick(),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Sink(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_cancel_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut opens = 0;
        let summary = run(
            || {
                opens += 1;
                Ok(MockChannel::builder().build())
            },
            |_: &Record| Ok::<_, std::io::Error>(()),
            &quick(),
            &cancel,
        )
        .unwrap();
        assert_eq!(summary, AcquireSummary::default());
        assert_eq!(opens, 0);
    }

    #[test]
    fn test_cancel_from_sink_stops_loop() {
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let script = VecDeque::from([
            Ok(MockChannel::builder().chunk("Duration: [1]").build()),
            Ok(MockChannel::builder().chunk("Duration: [2]").build()),
        ]);
        let summary = run(
            opener(script),
            |_: &Record| {
                stopper.cancel();
                Ok::<_, std::io::Error>(())
            },
            &quick(),
            &cancel,
        )
        .unwrap();
        assert_eq!(summary.records, 1);
    }

    #[test]
    fn test_scan_timeout_triggers_reopen() {
        let script = VecDeque::from([
            Ok(MockChannel::builder()
                .idle_delay(Duration::from_millis(1))
                .build()),
            Ok(MockChannel::builder().chunk("Duration: [9]").build()),
        ]);
        let summary = run(
            opener(script),
            |_: &Record| Ok::<_, std::io::Error>(()),
            &quick()
                .scan_timeout(Duration::from_millis(10))
                .max_records(1),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.records, 1);
    }

    #[test]
    fn test_empty_marker_rejected() {
        let err = run(
            || Ok(MockChannel::builder().build()),
            |_: &Record| Ok::<_, std::io::Error>(()),
            &quick().marker(""),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
