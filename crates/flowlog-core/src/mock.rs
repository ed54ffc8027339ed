//! Mock channel implementation for testing.
//!
//! This module provides a scripted channel that can be used for unit testing
//! without a serial device attached.
//!
//! The [`MockChannel`] implements the [`ByteChannel`] trait, allowing it to be
//! used interchangeably with [`crate::SerialChannel`] in generic code.
//!
//! # Features
//!
//! - **Scripted input**: Queue chunks, idle polls and read failures in order
//! - **Write capture**: Inspect everything written to the channel
//! - **Latency simulation**: Sleep on idle polls to mimic a real poll interval

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::traits::ByteChannel;

#[derive(Debug, Clone)]
enum Step {
    Data(Vec<u8>),
    Idle,
    Fail(ErrorKind),
}

/// A scripted byte channel.
///
/// Reads replay the queued steps in order. Once the script is exhausted every
/// read behaves like an idle poll (`Ok(0)`).
///
/// # Example
///
/// ```
/// use flowlog_core::{ByteChannel, MockChannel};
///
/// let mut channel = MockChannel::builder()
///     .chunk("Duration: [1.5]")
///     .build();
/// let mut buf = [0u8; 32];
/// let n = channel.read(&mut buf).unwrap();
/// assert_eq!(&buf[..n], b"Duration: [1.5]");
/// assert_eq!(channel.read(&mut buf).unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockChannel {
    name: String,
    script: VecDeque<Step>,
    written: Vec<u8>,
    reads: u32,
    idle_delay: Duration,
    write_limit: Option<usize>,
}

impl MockChannel {
    /// Start building a mock channel.
    pub fn builder() -> MockChannelBuilder {
        MockChannelBuilder::default()
    }

    /// Everything written to the channel so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of read calls made, including idle polls.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Whether all scripted steps have been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl ByteChannel for MockChannel {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.script.push_front(Step::Data(data.split_off(n)));
                }
                Ok(n)
            }
            Some(Step::Fail(kind)) => Err(Error::DeviceRead(std::io::Error::new(
                kind,
                "mock read failure",
            ))),
            Some(Step::Idle) | None => {
                if !self.idle_delay.is_zero() {
                    std::thread::sleep(self.idle_delay);
                }
                Ok(0)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let n = self.write_limit.map_or(bytes.len(), |limit| limit.min(bytes.len()));
        self.written.extend_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`MockChannel`].
#[derive(Debug)]
pub struct MockChannelBuilder {
    channel: MockChannel,
}

impl Default for MockChannelBuilder {
    fn default() -> Self {
        Self {
            channel: MockChannel {
                name: "mock".to_string(),
                ..Default::default()
            },
        }
    }
}

impl MockChannelBuilder {
    /// Set the channel name used in log messages.
    pub fn name(mut self, name: &str) -> Self {
        self.channel.name = name.to_string();
        self
    }

    /// Queue bytes to be returned by a read.
    pub fn chunk(mut self, data: impl AsRef<[u8]>) -> Self {
        self.channel
            .script
            .push_back(Step::Data(data.as_ref().to_vec()));
        self
    }

    /// Queue `count` idle polls.
    pub fn idle(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.channel.script.push_back(Step::Idle);
        }
        self
    }

    /// Queue a read failure with the given I/O error kind.
    pub fn read_error(mut self, kind: ErrorKind) -> Self {
        self.channel.script.push_back(Step::Fail(kind));
        self
    }

    /// Sleep this long on every idle poll.
    pub fn idle_delay(mut self, delay: Duration) -> Self {
        self.channel.idle_delay = delay;
        self
    }

    /// Accept at most `limit` bytes per write call.
    pub fn write_limit(mut self, limit: usize) -> Self {
        self.channel.write_limit = Some(limit);
        self
    }

    /// Build the mock channel.
    pub fn build(self) -> MockChannel {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_chunk_is_split_across_reads() {
        let mut channel = MockChannel::builder().chunk("abcdef").build();
        let mut buf = [0u8; 4];
        assert_eq!(channel.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(channel.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert!(channel.is_exhausted());
    }

    #[test]
    fn test_scripted_failure() {
        let mut channel = MockChannel::builder()
            .idle(1)
            .read_error(ErrorKind::UnexpectedEof)
            .build();
        let mut buf = [0u8; 4];
        assert_eq!(channel.read(&mut buf).unwrap(), 0);
        assert!(matches!(channel.read(&mut buf), Err(Error::DeviceRead(_))));
        assert_eq!(channel.reads(), 2);
    }

    #[test]
    fn test_write_capture_and_limit() {
        let mut channel = MockChannel::builder().name("dispenser").write_limit(3).build();
        assert_eq!(channel.write(b"T=5000\n").unwrap(), 3);
        assert_eq!(channel.written(), b"T=5");
        assert_eq!(channel.name(), "dispenser");
    }
}
