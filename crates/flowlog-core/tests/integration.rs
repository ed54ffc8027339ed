//! Integration tests for flowlog-core
//!
//! The mock tests run everywhere. The hardware tests need a device that
//! prints `Duration: [<seconds>]` and should be run with:
//! `FLOWLOG_DEVICE=/dev/ttyUSB0 cargo test --package flowlog-core -- --ignored --nocapture`

use std::env;
use std::time::Duration;

use flowlog_core::acquire::{self, AcquireOptions};
use flowlog_core::{ByteChannel, Error, MockChannel, PatternScanner, ReopenOptions, SerialChannel};
use flowlog_types::Record;
use tokio_util::sync::CancellationToken;

/// Get the device path from environment or use default.
fn get_device_path() -> String {
    env::var("FLOWLOG_DEVICE").unwrap_or_else(|_| "/dev/ttyUSB0".to_string())
}

#[test]
fn test_scanner_over_noisy_stream() {
    let mut channel = MockChannel::builder()
        .chunk("boot ok\r\nvalve open\r\n")
        .idle(2)
        .chunk("Duration")
        .chunk(": [")
        .idle(1)
        .chunk("2.35]\r\nvalve closed\r\n")
        .build();
    let mut scanner = PatternScanner::new("Duration:").unwrap();

    let text = scanner
        .scan(&mut channel, &CancellationToken::new(), None)
        .unwrap();
    assert_eq!(text, "2.35");
}

#[test]
fn test_acquire_end_to_end_with_mock_channels() {
    let mut cycle = 0;
    let mut records: Vec<Record> = Vec::new();
    let summary = acquire::run(
        || {
            cycle += 1;
            match cycle {
                2 => Err(Error::device_open("/dev/mock", "unplugged")),
                n => Ok(MockChannel::builder()
                    .name("/dev/mock")
                    .chunk(format!("noise Duration: [{n}]\n"))
                    .build()),
            }
        },
        |record: &Record| {
            records.push(*record);
            Ok::<_, std::io::Error>(())
        },
        &AcquireOptions::default()
            .max_records(3)
            .reopen(ReopenOptions::fixed_delay(Duration::from_millis(1))),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(summary.records, 3);
    assert_eq!(summary.failures, 1);
    let values: Vec<f64> = records.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![1.0, 3.0, 4.0]);
}

#[test]
fn test_cancel_while_waiting_for_data() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        trigger.cancel();
    });

    let summary = acquire::run(
        || {
            Ok(MockChannel::builder()
                .chunk("Duration: [")
                .idle_delay(Duration::from_millis(5))
                .build())
        },
        |_: &Record| Ok::<_, std::io::Error>(()),
        &AcquireOptions::default(),
        &cancel,
    )
    .unwrap();

    handle.join().unwrap();
    assert_eq!(summary.records, 0);
}

#[test]
#[ignore = "requires serial hardware"]
fn test_read_one_value_from_device() {
    let path = get_device_path();
    let mut channel = SerialChannel::open(&path).expect("open device");
    println!("Opened {}", channel.name());

    let mut scanner = PatternScanner::new(flowlog_core::DEFAULT_MARKER).unwrap();
    let text = scanner
        .scan(
            &mut channel,
            &CancellationToken::new(),
            Some(Duration::from_secs(120)),
        )
        .expect("value within two minutes");
    println!("Extracted: {}", text);
    assert!(flowlog_types::parse_value(&text).is_ok());
}

#[test]
#[ignore = "requires serial hardware"]
fn test_write_to_device() {
    let path = get_device_path();
    let mut channel = SerialChannel::open(&path).expect("open device");
    let written = channel.write(b"\n").expect("write");
    assert_eq!(written, 1);
}
