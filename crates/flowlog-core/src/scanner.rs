//! Marker-and-bracket extraction over a byte stream.
//!
//! The device prints free-form text; a value is announced by a marker
//! (`Duration:` by default) followed somewhere later by the value in square
//! brackets, e.g. `Duration: [2.35]`. [`PatternScanner`] accumulates incoming
//! bytes until such a pair is complete and returns the bracketed text.
//!
//! # Bounded accumulator
//!
//! The accumulator never grows past its capacity. When a new chunk would not
//! fit, everything buffered so far is discarded before the chunk is appended.
//! Unmatched data older than one buffer is lost; this keeps memory constant on
//! a stream that never matches. A match is found as soon as its closing `]`
//! arrives, so a complete match is never discarded.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use flowlog_types::SCAN_BUFFER_CAPACITY;

use crate::error::{Error, Result};
use crate::serial::READ_CHUNK_SIZE;
use crate::traits::ByteChannel;

/// One-shot extractor for `<marker> ... [value]` sequences.
#[derive(Debug, Clone)]
pub struct PatternScanner {
    marker: String,
    buffer: Vec<u8>,
    capacity: usize,
    discarded: u64,
}

impl PatternScanner {
    /// Create a scanner for `marker` with the default buffer capacity.
    pub fn new(marker: &str) -> Result<Self> {
        Self::with_capacity(marker, SCAN_BUFFER_CAPACITY)
    }

    /// Create a scanner with an explicit accumulator capacity in bytes.
    ///
    /// The capacity must leave room for the marker plus a non-empty bracketed
    /// value.
    pub fn with_capacity(marker: &str, capacity: usize) -> Result<Self> {
        if marker.is_empty() {
            return Err(Error::invalid_config("marker must not be empty"));
        }
        if capacity < marker.len() + 3 {
            return Err(Error::invalid_config(format!(
                "scan buffer of {} bytes cannot hold marker '{}' and a value",
                capacity, marker
            )));
        }
        Ok(Self {
            marker: marker.to_string(),
            buffer: Vec::with_capacity(capacity),
            capacity,
            discarded: 0,
        })
    }

    /// The marker this scanner looks for.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Accumulator capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes dropped by overflow resets since creation.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Drop any buffered data.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Append `chunk` and try to extract a value.
    ///
    /// Returns the bracketed text once a complete match is buffered and clears
    /// the accumulator. Returns `None` while no match is complete, including
    /// when the marker is present but its brackets are still missing or empty.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<String> {
        self.append(chunk);

        let value = extract(&self.buffer, self.marker.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())?;
        self.buffer.clear();
        Some(value)
    }

    fn append(&mut self, chunk: &[u8]) {
        let chunk = if chunk.len() > self.capacity {
            let skip = chunk.len() - self.capacity;
            self.discarded += skip as u64;
            &chunk[skip..]
        } else {
            chunk
        };

        if self.buffer.len() + chunk.len() > self.capacity {
            debug!(
                "Scan buffer full ({} bytes), discarding unmatched data",
                self.buffer.len()
            );
            self.discarded += self.buffer.len() as u64;
            self.buffer.clear();
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Read from `channel` until a value is extracted.
    ///
    /// Blocks for as long as the device stays silent or keeps sending
    /// non-matching data. The loop ends with [`Error::Cancelled`] once `cancel`
    /// fires and with [`Error::Timeout`] once `timeout` (if any) elapses; both
    /// are checked between reads, so the channel's poll interval bounds the
    /// reaction time. Read errors are returned as-is.
    pub fn scan<C: ByteChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<String> {
        info!("Listening for pattern '{}' on {}", self.marker, channel.name());

        let started = Instant::now();
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(Error::timeout("pattern scan", limit));
                }
            }

            let n = channel.read(&mut chunk)?;
            if n == 0 {
                continue;
            }
            trace!("Read {} bytes from {}", n, channel.name());

            if let Some(value) = self.feed(&chunk[..n]) {
                info!("Pattern found: {}", value);
                return Ok(value);
            }
        }
    }
}

/// Locate the first complete `marker ... [value]` in `haystack`.
///
/// For each marker occurrence in order, the first `[` after the marker and
/// the first `]` after that `[` delimit the value. Empty brackets fall through
/// to the next marker occurrence; a `[` without a closing `]` means the match
/// is still incomplete.
fn extract<'a>(haystack: &'a [u8], marker: &[u8]) -> Option<&'a [u8]> {
    let mut from = 0;
    while let Some(offset) = find(&haystack[from..], marker) {
        let after_marker = from + offset + marker.len();
        let open = after_marker + haystack[after_marker..].iter().position(|&b| b == b'[')?;
        let close = open + 1 + haystack[open + 1..].iter().position(|&b| b == b']')?;
        if close > open + 1 {
            return Some(&haystack[open + 1..close]);
        }
        from += offset + 1;
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
