//! Serial device channel.
//!
//! [`SerialChannel`] opens a character device with the fixed line settings the
//! dispenser firmware uses: 115200 baud, 8 data bits, no parity, 1 stop bit,
//! no flow control. The `serialport` crate puts the terminal into raw mode on
//! open, so canonical input, echo, signal characters, XON/XOFF and output
//! post-processing are all off.
//!
//! Open failures are classified from the `serialport` error kind. Settings
//! the crate rejects as invalid (an unsupported baud rate, for example) become
//! [`Error::DeviceConfig`]. Everything else becomes [`Error::DeviceOpen`],
//! including termios failures while applying the line settings, which
//! `serialport` reports as I/O errors.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use flowlog_types::BAUD_RATE;

use crate::error::{Error, Result};
use crate::traits::ByteChannel;

/// Default interval after which an idle read returns `Ok(0)`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Size of a single read from the device.
pub const READ_CHUNK_SIZE: usize = 1024;

/// An open, configured serial device.
pub struct SerialChannel {
    path: String,
    port: Box<dyn SerialPort>,
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SerialChannel {
    /// Open and configure the device at `path`.
    ///
    /// Failure to open or configure is returned to the caller; nothing is
    /// retried here.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_poll_interval(path, DEFAULT_POLL_INTERVAL)
    }

    /// Open the device with a custom idle poll interval.
    ///
    /// The interval bounds how long a read blocks without data before
    /// returning `Ok(0)`, which is how cancellation gets observed.
    pub fn open_with_poll_interval(path: &str, poll_interval: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(Error::invalid_config("poll interval must be non-zero"));
        }

        debug!("Opening serial device {} at {} baud", path, BAUD_RATE);
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(poll_interval)
            .open()
            .map_err(|e| map_open_error(path, e))?;

        info!("Opened serial device {}", path);
        Ok(Self {
            path: path.to_string(),
            port,
        })
    }

    /// Device path this channel was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Release the device handle.
    pub fn close(self) {
        debug!("Closing serial device {}", self.path);
        drop(self);
    }
}

/// `InvalidInput` means the settings were rejected; any other kind, termios
/// errors included, is an open failure.
fn map_open_error(path: &str, err: serialport::Error) -> Error {
    match err.kind() {
        serialport::ErrorKind::InvalidInput => Error::device_config(path, err.description),
        _ => Error::device_open(path, err.description),
    }
}

impl ByteChannel for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(Error::DeviceRead(e)),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let written = self.port.write(bytes).map_err(Error::DeviceWrite)?;
        self.port.flush().map_err(Error::DeviceWrite)?;
        debug!("Wrote {} of {} bytes to {}", written, bytes.len(), self.path);
        Ok(written)
    }

    fn name(&self) -> &str {
        &self.path
    }
}
