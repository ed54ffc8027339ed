//! Append-only CSV store.
//!
//! One record per line, `<unix_seconds>,<value>\n`, no header. Records are
//! only ever appended; nothing here rewrites or truncates the file, which is
//! what lets a reader scan it while the logger keeps appending.
//!
//! A crash in the middle of an append can leave a partial last line. Opening
//! the store terminates such a line so the next record starts on a line of
//! its own, and [`scan`] skips lines it cannot parse. The partial record is
//! lost; everything before and after it is still read back.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, Terminator, Trim, WriterBuilder};
use tracing::{debug, info, warn};

use flowlog_types::Record;

use crate::error::{Error, Result};

/// Append handle on a stats file.
///
/// The file stays open for the lifetime of the store; every [`append`]
/// flushes and syncs before returning so a record survives a crash right
/// after it was written.
///
/// [`append`]: StatsStore::append
pub struct StatsStore {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl std::fmt::Debug for StatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl StatsStore {
    /// Open or create the stats file at the given path for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening stats file at {}", path.display());
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::FileOpen {
                path: path.to_path_buf(),
                source: e,
            })?;

        if ends_mid_line(&mut file)? {
            warn!(
                "Stats file {} ends with a partial line, terminating it",
                path.display()
            );
            file.write_all(b"\n")?;
            file.sync_data()?;
        }

        let writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Open the default stats file location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_stats_path())
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and make it durable.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        debug!("Appended {} to {}", record, self.path.display());
        Ok(())
    }

    /// Scan the file this store appends to.
    pub fn scan(&self) -> Result<Records> {
        scan(&self.path)
    }
}

/// Whether a non-empty file is missing its final newline.
fn ends_mid_line(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Append a single record to the file at `path`, opening and closing it.
pub fn append<P: AsRef<Path>>(path: P, record: &Record) -> Result<()> {
    StatsStore::open(path)?.append(record)
}

/// Open the file at `path` and iterate its records from the top.
///
/// The iterator is lazy and forward-only. Calling `scan` again starts a
/// fresh pass over the whole file. Lines that do not hold exactly a
/// timestamp and a finite value (a truncated write, a non-numeric field)
/// are skipped without an error; a read failure ends the iteration.
pub fn scan<P: AsRef<Path>>(path: P) -> Result<Records> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    Ok(Records {
        inner: reader.into_byte_records(),
        done: false,
        read: 0,
        skipped: 0,
    })
}

/// Lazy iterator over the records of a stats file.
pub struct Records {
    inner: csv::ByteRecordsIntoIter<File>,
    done: bool,
    read: u64,
    skipped: u64,
}

impl Records {
    /// Number of records yielded so far.
    pub fn read(&self) -> u64 {
        self.read
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

fn parse_line(line: &ByteRecord) -> Option<Record> {
    if line.len() != 2 {
        return None;
    }
    line.deserialize::<Record>(None)
        .ok()
        .filter(|record| record.value.is_finite())
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        while !self.done {
            match self.inner.next() {
                Some(Ok(line)) => match parse_line(&line) {
                    Some(record) => {
                        self.read += 1;
                        return Some(record);
                    }
                    None => {
                        self.skipped += 1;
                        debug!(
                            "Skipping malformed line {}",
                            line.position().map_or(0, |p| p.line())
                        );
                    }
                },
                Some(Err(e)) if e.is_io_error() => {
                    debug!("Stopping scan after {} records: {}", self.read, e);
                    self.done = true;
                }
                Some(Err(e)) => {
                    self.skipped += 1;
                    debug!("Skipping unreadable line: {}", e);
                }
                None => self.done = true,
            }
        }
        None
    }
}
