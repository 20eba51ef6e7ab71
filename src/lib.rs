//! keystroked - keyboard activity counter for Linux.
//!
//! A small daemon that samples a keyboard's evdev node and appends the number
//! of key presses seen in each fixed-length window to a plain text log.
//!
//! # Privacy Guarantees
//!
//! - **No key content**: key codes are inspected only to tell presses apart
//!   from releases and repeats; they are never stored
//! - **Counts only**: the log holds one number per window, nothing else
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          keystroked                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Collector  │──▶│  Windowing  │──▶│  Log Sink   │         │
//! │  │   (evdev)   │   │ (60s bins)  │   │ (append)    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         ▲                                                    │
//! │         └──────────── Daemon (1s tick loop) ─────────────────│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use keystroked::{collector::DeviceReader, daemon::Daemon, Config};
//! use std::sync::atomic::AtomicBool;
//!
//! let config = Config::default();
//! let reader = DeviceReader::open(&config.device_path).expect("device");
//!
//! let mut daemon = Daemon::new(reader, &config, Utc::now());
//! daemon.start(Utc::now());
//! daemon.run(&AtomicBool::new(true));
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("keystroked reads Linux evdev nodes and only builds for Linux");

pub mod collector;
pub mod config;
pub mod core;
pub mod daemon;
pub mod sink;

// Re-export key types at crate root for convenience
pub use collector::{classify, CollectorError, DeviceReader, EventSource, RawEvent};
pub use config::{Config, ConfigError};
pub use self::core::{TickOutcome, WindowAggregator, WindowState};
pub use daemon::{Daemon, DaemonError, SessionStats};
pub use sink::{LogRecord, LogSink, SinkError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                KEYSTROKED - PRIVACY DECLARATION                  ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This daemon records how much the keyboard is used.              ║
║                                                                  ║
║  ✓ WHAT WE RECORD:                                               ║
║    • How many keys were pressed in each time window              ║
║    • When each window ended (epoch seconds)                      ║
║                                                                  ║
║  ✗ WHAT WE NEVER RECORD:                                         ║
║    • Which keys you press (no passwords, messages, etc.)         ║
║    • When individual keys were pressed                           ║
║    • What applications you use                                   ║
║                                                                  ║
║  Events are discarded as soon as they are counted.               ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
