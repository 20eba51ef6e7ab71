//! Integration tests for the keystroked binary and its main loop

use chrono::{TimeZone, Utc};
use keystroked::collector::{DeviceReader, RAW_EVENT_SIZE};
use keystroked::{Config, Daemon, TickOutcome};
use std::io::Write;
use std::process::Command;
use std::time::Duration;

fn keystroked() -> Command {
    Command::new(env!("CARGO_BIN_EXE_keystroked"))
}

/// Build one `input_event` record: zeroed timeval, then type, code, value.
fn record(kind: u16, code: u16, value: i32) -> Vec<u8> {
    let mut buf = vec![0u8; RAW_EVENT_SIZE - 8];
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(&code.to_ne_bytes());
    buf.extend_from_slice(&value.to_ne_bytes());
    buf
}

#[test]
fn test_help_exits_without_starting() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("keystrokes.log");

    let output = keystroked()
        .args(["-f", log.to_str().unwrap(), "-h"])
        .output()
        .expect("Failed to run keystroked");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-t"));
    assert!(stdout.contains("-d"));
    assert!(!log.exists());
}

#[test]
fn test_missing_device_fails_without_logging() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("keystrokes.log");

    let output = keystroked()
        .args([
            "--foreground",
            "-d",
            "/nonexistent/input/event99",
            "-f",
            log.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run keystroked");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("event99"));
    assert!(!log.exists());
}

#[test]
fn test_unknown_options_are_ignored() {
    let output = keystroked()
        .args(["--bogus", "-q", "--privacy"])
        .output()
        .expect("Failed to run keystroked");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("PRIVACY DECLARATION"));
}

#[test]
fn test_device_events_flow_into_log() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("event0");
    let log = dir.path().join("keystrokes.log");

    // press, repeat, release, sync, press
    let mut file = std::fs::File::create(&device).unwrap();
    for (kind, value) in [(1, 1), (1, 2), (1, 0), (0, 0), (1, 1)] {
        file.write_all(&record(kind, 30, value)).unwrap();
    }
    drop(file);

    let config = Config {
        window_length: Duration::from_secs(5),
        device_path: device.clone(),
        log_path: log.clone(),
        ..Config::default()
    };
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let reader = DeviceReader::open(&device).unwrap();
    let mut daemon = Daemon::new(reader, &config, start);

    daemon.start(start);
    let outcomes: Vec<TickOutcome> = (0..=5)
        .map(|secs| daemon.tick(start + chrono::Duration::seconds(secs)))
        .collect();

    assert_eq!(outcomes[0], TickOutcome::Counted);
    assert_eq!(outcomes[4], TickOutcome::Counted);
    assert!(matches!(outcomes[5], TickOutcome::Flushed(_)));

    let content = std::fs::read_to_string(&log).unwrap();
    assert_eq!(content, "Started 1700000000...\nkeyboard 1700000005 2\n");
    assert_eq!(daemon.aggregator().state().count, 0);
}
