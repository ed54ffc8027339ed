//! Daily consumption report.
//!
//! [`StatsReporter`] walks the records of a stats file once, in file order,
//! and produces a [`DailyReport`]: today's individual entries, today's total
//! and the all-time average per day, all scaled by
//! [`GRAMS_PER_SECOND`](flowlog_types::GRAMS_PER_SECOND).
//!
//! Days are counted as runs: the count goes up whenever a record falls on a
//! different local day than the record before it. Records from day A, then
//! day B, then day A again count as three days. Files written by the logger
//! are in time order, where this equals the number of distinct days.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::Serialize;
use tracing::debug;

use flowlog_types::{DayBucket, GRAMS_PER_SECOND, Record};

use crate::error::Result;
use crate::store::scan;

const RULE: &str = "-----------------------";

/// One of today's records, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Capture time in Unix seconds.
    pub timestamp: i64,
    /// Local time of day, `HH:MM:SS`.
    pub time: String,
    /// Scaled amount in grams.
    pub amount: f64,
}

/// Result of a reporting pass over a stats file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    /// Local date the report was made for, `YYYY-MM-DD`.
    pub date: String,
    /// Today's records in file order.
    pub entries: Vec<ReportEntry>,
    /// Sum of today's records, in grams.
    pub today_total: f64,
    /// Sum of all records, in grams.
    pub all_time_total: f64,
    /// Number of day runs seen (see module docs).
    pub days: u32,
    /// Number of records read.
    pub records: u64,
    /// All-time average per day in grams, absent when no day was counted.
    pub average_per_day: Option<f64>,
}

impl DailyReport {
    /// Render the report as the fixed-width text table.
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Today's logs")?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "{:<11}|{:>11}", "Time", "Amount")?;
        writeln!(out, "{RULE}")?;
        for entry in &self.entries {
            writeln!(out, "{:<11}|{:>9.2} g", entry.time, entry.amount)?;
        }
        writeln!(out, "{RULE}")?;
        writeln!(out, "Today's total: {:.2} g", self.today_total)?;
        if let Some(average) = self.average_per_day {
            writeln!(out, "All-time average: {:.2} g", average)?;
        }
        Ok(())
    }

    /// Render the text table into a `String`.
    pub fn to_text(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_text(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Builds [`DailyReport`]s using the calendar of a given time zone.
#[derive(Debug, Clone)]
pub struct StatsReporter<Tz: TimeZone> {
    tz: Tz,
}

impl StatsReporter<Local> {
    /// Reporter using the system's local time zone.
    pub fn local() -> Self {
        Self::new(Local)
    }
}

impl<Tz: TimeZone> StatsReporter<Tz>
where
    Tz::Offset: fmt::Display,
{
    /// Reporter using the calendar of `tz`.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn local_time(&self, timestamp: i64) -> Option<DateTime<Tz>> {
        self.tz.timestamp_opt(timestamp, 0).single()
    }

    /// The local calendar day a timestamp falls on.
    pub fn day_bucket(&self, timestamp: i64) -> Option<DayBucket> {
        self.local_time(timestamp)
            .map(|t| DayBucket::new(t.year(), t.ordinal()))
    }

    /// Summarize `records` as seen at `now`.
    pub fn summarize<I>(&self, records: I, now: DateTime<Utc>) -> DailyReport
    where
        I: IntoIterator<Item = Record>,
    {
        let now_local = now.with_timezone(&self.tz);
        let today = DayBucket::new(now_local.year(), now_local.ordinal());

        let mut sum_all = 0.0;
        let mut sum_today = 0.0;
        let mut days: u32 = 0;
        let mut count: u64 = 0;
        let mut last_day: Option<DayBucket> = None;
        let mut entries = Vec::new();

        for record in records {
            count += 1;
            sum_all += record.value;

            let Some(local) = self.local_time(record.timestamp) else {
                debug!("Timestamp {} out of range, not bucketed", record.timestamp);
                continue;
            };
            let day = DayBucket::new(local.year(), local.ordinal());
            if last_day != Some(day) {
                days += 1;
                last_day = Some(day);
            }

            if day == today {
                sum_today += record.value;
                entries.push(ReportEntry {
                    timestamp: record.timestamp,
                    time: local.format("%H:%M:%S").to_string(),
                    amount: record.value * GRAMS_PER_SECOND,
                });
            }
        }

        debug!("Summarized {} records over {} days", count, days);
        DailyReport {
            date: now_local.format("%Y-%m-%d").to_string(),
            entries,
            today_total: sum_today * GRAMS_PER_SECOND,
            all_time_total: sum_all * GRAMS_PER_SECOND,
            days,
            records: count,
            average_per_day: (days > 0).then(|| sum_all * GRAMS_PER_SECOND / f64::from(days)),
        }
    }

    /// Scan the file at `path` and summarize it as of now.
    pub fn report<P: AsRef<Path>>(&self, path: P) -> Result<DailyReport> {
        let records = scan(path)?;
        Ok(self.summarize(records, Utc::now()))
    }
}
