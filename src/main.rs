//! keystroked CLI
//!
//! Counts keyboard presses per time window and appends them to a log.

use chrono::Utc;
use clap::Parser;
use keystroked::{
    collector::DeviceReader,
    config::{Config, MAX_WINDOW_SECS},
    daemon::{daemonize, Daemon},
    PRIVACY_DECLARATION, VERSION,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "keystroked")]
#[command(version = VERSION)]
#[command(about = "Count keyboard presses per time window", long_about = None)]
#[command(after_help = "NOTE: must be run with root privileges to read the input device")]
struct Cli {
    /// Window length in seconds (default 60)
    #[arg(short = 't', value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..=MAX_WINDOW_SECS))]
    window: Option<u64>,

    /// Log file (default /var/log/keystroked/keystrokes.log)
    #[arg(short = 'f', value_name = "PATH", allow_hyphen_values = true)]
    log_file: Option<PathBuf>,

    /// Input device (default /dev/input/event0)
    #[arg(short = 'd', value_name = "PATH", allow_hyphen_values = true)]
    device: Option<PathBuf>,

    /// JSON configuration file; flags take precedence over it
    #[arg(short = 'c', value_name = "PATH", allow_hyphen_values = true)]
    config: Option<PathBuf>,

    /// Run in foreground (don't daemonize)
    #[arg(long)]
    foreground: bool,

    /// Display privacy declaration
    #[arg(long)]
    privacy: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(known_args(std::env::args()));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("keystroked=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.privacy {
        println!("{PRIVACY_DECLARATION}");
        return ExitCode::SUCCESS;
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.foreground {
        run_foreground(&config)
    } else {
        run_daemon(&config)
    }
}

/// Keep only the options we understand, with their values. Anything else on
/// the command line is ignored rather than rejected.
///
/// A value option always takes the next argument, even one starting with a
/// hyphen. Attached forms such as `-t30` are split into `-t 30`.
fn known_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    const VALUE_OPTIONS: [&str; 4] = ["-t", "-f", "-d", "-c"];

    let mut args = args.into_iter();
    let mut known: Vec<String> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            option if VALUE_OPTIONS.contains(&option) => {
                if let Some(value) = args.next() {
                    known.push(option.to_string());
                    known.push(value);
                }
            }
            attached
                if !attached.starts_with("--")
                    && attached.len() > 2
                    && VALUE_OPTIONS.iter().any(|o| attached.starts_with(o)) =>
            {
                let (option, value) = attached.split_at(2);
                known.push(option.to_string());
                known.push(value.to_string());
            }
            "-h" | "--help" | "-V" | "--version" | "--foreground" | "--privacy" => {
                known.push(arg)
            }
            _ => {}
        }
    }

    known
}

/// Layer CLI flags over the config file (or the defaults).
fn build_config(cli: &Cli) -> Result<Config, keystroked::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };

    if let Some(secs) = cli.window {
        config.window_length = Duration::from_secs(secs);
    }
    if let Some(ref path) = cli.log_file {
        config.log_path = path.clone();
    }
    if let Some(ref path) = cli.device {
        config.device_path = path.clone();
    }
    if cli.foreground {
        config.foreground = true;
    }

    config.validate()?;
    Ok(config)
}

fn run_daemon(config: &Config) -> ExitCode {
    let reader = match daemonize(&config.device_path) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let now = Utc::now();
    let mut daemon = Daemon::new(reader, config, now);
    daemon.start(now);

    // No signal handling: the daemon runs until it is killed.
    let running = AtomicBool::new(true);
    daemon.run(&running);

    ExitCode::SUCCESS
}

fn run_foreground(config: &Config) -> ExitCode {
    let reader = match DeviceReader::open(&config.device_path) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("keystroked v{VERSION}");
    println!("  Device: {:?}", config.device_path);
    println!("  Log file: {:?}", config.log_path);
    println!("  Window length: {}s", config.window_length.as_secs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        tracing::warn!("Could not install Ctrl+C handler: {}", e);
    }

    let now = Utc::now();
    let mut daemon = Daemon::new(reader, config, now);
    daemon.start(now);
    daemon.run(&running);

    println!();
    println!("{}", daemon.summary());
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_options_are_dropped() {
        let filtered = known_args(args(&[
            "keystroked", "-x", "-t", "30", "--verbose", "-d", "/dev/input/event3",
        ]));
        assert_eq!(
            filtered,
            args(&["keystroked", "-t", "30", "-d", "/dev/input/event3"])
        );
    }

    #[test]
    fn test_attached_values_are_split() {
        let filtered = known_args(args(&["keystroked", "-t5", "-f/tmp/k.log", "--foreground"]));
        assert_eq!(
            filtered,
            args(&["keystroked", "-t", "5", "-f", "/tmp/k.log", "--foreground"])
        );
    }

    #[test]
    fn test_hyphenated_path_is_a_value() {
        let cli = Cli::parse_from(known_args(args(&["keystroked", "-f", "-weird.log"])));
        let config = build_config(&cli).unwrap();
        assert_eq!(config.log_path, PathBuf::from("-weird.log"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(args(&["keystroked", "-t", "5", "-f", "/tmp/k.log"]));
        let config = build_config(&cli).unwrap();

        assert_eq!(config.window_length, Duration::from_secs(5));
        assert_eq!(config.log_path, PathBuf::from("/tmp/k.log"));
        assert_eq!(config.device_path, PathBuf::from("/dev/input/event0"));
        assert!(!config.foreground);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystroked.json");
        std::fs::write(&path, r#"{ "window_length": 300, "device_path": "/dev/input/event7" }"#)
            .unwrap();

        let cli = Cli::parse_from(args(&[
            "keystroked",
            "-c",
            path.to_str().unwrap(),
            "-t",
            "10",
        ]));
        let config = build_config(&cli).unwrap();

        assert_eq!(config.window_length, Duration::from_secs(10));
        assert_eq!(config.device_path, PathBuf::from("/dev/input/event7"));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(Cli::try_parse_from(args(&["keystroked", "-t", "0"])).is_err());
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        let too_long = (MAX_WINDOW_SECS + 1).to_string();
        assert!(Cli::try_parse_from(args(&["keystroked", "-t", &too_long])).is_err());
        assert!(Cli::try_parse_from(args(&["keystroked", "-t", "10000000000000000"])).is_err());

        let longest = MAX_WINDOW_SECS.to_string();
        let cli = Cli::parse_from(args(&["keystroked", "-t", &longest]));
        assert!(build_config(&cli).is_ok());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
