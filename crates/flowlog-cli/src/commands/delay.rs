//! Delay time command implementation.
//!
//! Writes the device's delay time, in milliseconds, to the file the firmware
//! build reads it from. The file holds only the number, without a newline.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap::error::ErrorKind;
use tracing::debug;

use crate::cli::Cli;

pub fn cmd_delay(seconds: Option<u32>, path: &Path) -> Result<()> {
    let seconds = match seconds {
        Some(seconds) => seconds,
        None => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            prompt_seconds(&mut stdin.lock(), &mut stdout.lock())?
        }
    };

    write_delay(path, seconds)?;
    println!("Successfully changed delay time.");
    Ok(())
}

/// Ask for a delay in seconds and read one line of input.
fn prompt_seconds<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<u32> {
    write!(output, "Please input timer in seconds: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_seconds(&line)?)
}

/// Invalid input is reported as a usage error so it exits like a bad flag.
fn parse_seconds(text: &str) -> std::result::Result<u32, clap::Error> {
    let trimmed = text.trim();
    trimmed.parse().map_err(|_| {
        Cli::command().error(
            ErrorKind::InvalidValue,
            format!("invalid delay time '{trimmed}': expected a whole number of seconds"),
        )
    })
}

fn write_delay(path: &Path, seconds: u32) -> Result<()> {
    let millis = u64::from(seconds) * 1000;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, millis.to_string())
        .with_context(|| format!("Error opening file {}", path.display()))?;

    debug!("Wrote {} ms to {}", millis, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("5\n").unwrap(), 5);
        assert_eq!(parse_seconds("  30 \r\n").unwrap(), 30);
    }

    #[test]
    fn test_parse_seconds_rejects_garbage() {
        for input in ["", "abc", "-1", "2.5"] {
            let err = parse_seconds(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidValue);
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn test_prompt_reads_one_line() {
        let mut input = Cursor::new("12\nignored\n");
        let mut output = Vec::new();
        assert_eq!(prompt_seconds(&mut input, &mut output).unwrap(), 12);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Please input timer in seconds: "
        );
    }

    #[test]
    fn test_prompt_invalid_input_is_usage_error() {
        let mut input = Cursor::new("soon\n");
        let err = prompt_seconds(&mut input, &mut Vec::new()).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }

    #[test]
    fn test_write_delay_in_millis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arduino").join("time.txt");
        write_delay(&path, 5).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "5000");

        write_delay(&path, 0).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0");
    }

    #[test]
    fn test_large_delay_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time.txt");
        write_delay(&path, u32::MAX).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "4294967295000");
    }
}
