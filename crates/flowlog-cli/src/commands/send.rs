//! Send command implementation.

use anyhow::{Result, bail};
use flowlog_core::{ByteChannel, SerialChannel};
use tracing::info;

pub fn cmd_send(device: &str, command: &str) -> Result<()> {
    let mut channel = SerialChannel::open(device)?;
    let written = send(&mut channel, command)?;
    channel.close();
    println!("Wrote {} bytes to {}", written, device);
    Ok(())
}

/// Write `command` verbatim, reporting a short write as an error.
fn send<C: ByteChannel + ?Sized>(channel: &mut C, command: &str) -> Result<usize> {
    let bytes = command.as_bytes();
    let written = channel.write(bytes)?;
    info!("Sent {} of {} bytes to {}", written, bytes.len(), channel.name());
    if written < bytes.len() {
        bail!(
            "Short write to {}: {} of {} bytes",
            channel.name(),
            written,
            bytes.len()
        );
    }
    Ok(written)
}
