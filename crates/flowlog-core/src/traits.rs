//! Trait abstractions for byte-oriented device channels.
//!
//! This module provides the [`ByteChannel`] trait that abstracts over
//! real serial devices and mock channels for testing.

use crate::error::Result;

/// A bidirectional, blocking byte channel to a device.
///
/// This trait enables writing code that works with both real serial ports
/// and scripted mock channels for testing.
///
/// # Example
///
/// ```
/// use flowlog_core::{ByteChannel, MockChannel, Result};
///
/// fn drain<C: ByteChannel>(channel: &mut C) -> Result<Vec<u8>> {
///     let mut out = Vec::new();
///     let mut buf = [0u8; 64];
///     loop {
///         let n = channel.read(&mut buf)?;
///         if n == 0 {
///             return Ok(out);
///         }
///         out.extend_from_slice(&buf[..n]);
///     }
/// }
///
/// let mut channel = MockChannel::builder().chunk("Duration: [3]").build();
/// assert_eq!(drain(&mut channel).unwrap(), b"Duration: [3]");
/// ```
pub trait ByteChannel {
    /// Read available bytes into `buf`.
    ///
    /// Blocks until at least one byte arrives or the channel's poll interval
    /// elapses. `Ok(0)` means nothing arrived during the interval; callers use
    /// it as a chance to check for cancellation, not as end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write `bytes` verbatim, returning how many were actually written.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Human-readable channel name for log messages.
    fn name(&self) -> &str;
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
