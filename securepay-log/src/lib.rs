//! SecurePay logging
//!
//! One JSON object per line on stderr, filtered by a process-wide level,
//! plus the monitoring pipeline that reports payment-flow checkpoints (see
//! [`monitoring`]).
//!
//! ```rust
//! use securepay_log::{debug, warn};
//!
//! debug!("Sending JSINIT request");
//! warn!(target: "securepay::gateway", "Retrying after {} ms", 250);
//! ```
//!
//! The level is read once from the environment:
//!
//! - `SECUREPAY_DEBUG=1|true` lowers the level to `debug`
//! - `SECUREPAY_LOG_LEVEL=trace|debug|info|warn|error|off` sets it outright

pub mod monitoring;

pub use monitoring::{
    EventSink, LogSink, MemorySink, Monitor, MonitoringContext, MonitoringEvent, Severity,
};

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl Level {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Level for the given `SECUREPAY_DEBUG` and `SECUREPAY_LOG_LEVEL` values.
///
/// An explicit level wins; the debug flag only lowers the default.
pub fn level_from(debug: Option<&str>, level: Option<&str>) -> Level {
    let debug = debug.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    level
        .and_then(|l| l.parse().ok())
        .unwrap_or(if debug { Level::Debug } else { Level::Info })
}

static THRESHOLD: Lazy<AtomicU8> = Lazy::new(|| {
    let debug = std::env::var("SECUREPAY_DEBUG").ok();
    let level = std::env::var("SECUREPAY_LOG_LEVEL").ok();
    AtomicU8::new(level_from(debug.as_deref(), level.as_deref()) as u8)
});

/// Read the environment now instead of on the first log line.
pub fn init() {
    Lazy::force(&THRESHOLD);
}

pub fn current_level() -> Level {
    Level::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

#[inline]
pub fn enabled(level: Level) -> bool {
    level != Level::Off && level as u8 >= THRESHOLD.load(Ordering::Relaxed)
}

pub fn set_level(level: Level) {
    THRESHOLD.store(level as u8, Ordering::SeqCst);
}

/// Turning debug off raises anything below `info` back to `info`.
pub fn set_debug(enabled: bool) {
    let current = current_level();
    let level = if enabled {
        current.min(Level::Debug)
    } else {
        current.max(Level::Info)
    };
    set_level(level);
}

#[derive(Serialize)]
struct Entry<'a> {
    timestamp: String,
    level: Level,
    target: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<Value>,
}

fn write_entry<W: Write>(
    out: &mut W,
    level: Level,
    target: &str,
    message: &str,
    event: Option<Value>,
) -> io::Result<()> {
    let entry = Entry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level,
        target,
        message,
        event,
    };
    serde_json::to_writer(&mut *out, &entry)?;
    writeln!(out)
}

#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    if enabled(level) {
        let _ = write_entry(&mut io::stderr().lock(), level, target, message, None);
    }
}

/// Log a line carrying a structured `event` object.
pub fn log_event(level: Level, target: &str, message: &str, event: Value) {
    if enabled(level) {
        let _ = write_entry(&mut io::stderr().lock(), level, target, message, Some(event));
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:expr, target: $target:expr, $($arg:tt)+) => {
        if $crate::enabled($level) {
            $crate::log($level, $target, &format!($($arg)+));
        }
    };
    ($level:expr, $($arg:tt)+) => {
        $crate::__log!($level, target: module_path!(), $($arg)+)
    };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Trace, $($arg)+) };
}

/// Only emitted with `SECUREPAY_DEBUG=1` or a `debug`/`trace` level.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::__log!($crate::Level::Error, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(event: Option<Value>) -> Value {
        let mut out = Vec::new();
        write_entry(&mut out, Level::Warn, "securepay::gateway", "retrying", event).unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_entry_is_one_json_line() {
        let entry = line(None);

        assert_eq!(entry["level"], "WARN");
        assert_eq!(entry["target"], "securepay::gateway");
        assert_eq!(entry["message"], "retrying");
        assert!(entry["timestamp"].as_str().unwrap().contains('T'));
        assert!(entry.get("event").is_none());
    }

    #[test]
    fn test_entry_embeds_event_object() {
        let entry = line(Some(json!({"tags": {"gateway.type": "eu"}})));
        assert_eq!(entry["event"]["tags"]["gateway.type"], "eu");
    }

    #[test]
    fn test_level_from_environment_values() {
        assert_eq!(level_from(None, None), Level::Info);
        assert_eq!(level_from(Some("1"), None), Level::Debug);
        assert_eq!(level_from(Some("TRUE"), None), Level::Debug);
        assert_eq!(level_from(Some("0"), None), Level::Info);
        assert_eq!(level_from(Some("1"), Some("error")), Level::Error);
        assert_eq!(level_from(None, Some("Warning")), Level::Warn);
        assert_eq!(level_from(None, Some("verbose")), Level::Info);
        assert_eq!("none".parse::<Level>(), Ok(Level::Off));
    }

    #[test]
    fn test_set_level_and_debug() {
        let original = current_level();

        set_level(Level::Error);
        assert!(!enabled(Level::Warn));
        assert!(enabled(Level::Error));

        set_debug(true);
        assert_eq!(current_level(), Level::Debug);
        set_debug(false);
        assert_eq!(current_level(), Level::Info);

        set_level(Level::Off);
        assert!(!enabled(Level::Error));

        set_level(original);
    }

    #[test]
    fn test_macros_expand() {
        trace!("trace message");
        debug!("debug message");
        info!("info message");
        warn!("warn message {}", 1);
        error!(target: "securepay::test", "with target {}", 2);
    }
}
