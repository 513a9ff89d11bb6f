//! File logging for debugging beany.
//!
//! The console owns stdout, so diagnostics go to `~/.beany/beany.log`,
//! truncated at every start. Levels, most to least severe:
//!
//! - ERROR: failures the operator may not have seen (history writes)
//! - WARN: recoverable surprises (startup connect refused, pager missing)
//! - INFO: connects, disconnects, dispatched commands
//! - DEBUG: bulk scan progress, external process launches
//! - TRACE: raw protocol lines
//!
//! `--debug` or `BEANY_DEBUG=1` selects DEBUG; `BEANY_DEBUG=trace` selects
//! TRACE.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();
static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        })
    }
}

/// Most verbose level to record, from the `--debug` flag and the value of
/// `BEANY_DEBUG` (if set).
pub fn select_level(debug_flag: bool, env: Option<&str>) -> LogLevel {
    match env.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") => LogLevel::Trace,
        Some("1") | Some("true") => LogLevel::Debug,
        _ if debug_flag => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

/// Log to `~/.beany/beany.log`. Without a home directory nothing is
/// written.
pub fn init_with_debug(debug: bool) {
    let env = std::env::var("BEANY_DEBUG").ok();
    let level = select_level(debug, env.as_deref());
    if let Some(dir) = dirs::home_dir().map(|home| home.join(".beany")) {
        init_at(&dir.join("beany.log"), level);
    } else {
        MAX_LEVEL.store(level as u8, Ordering::SeqCst);
    }
}

/// Log to `path` at `level` and below. Only the first call picks the file.
pub fn init_at(path: &Path, level: LogLevel) {
    MAX_LEVEL.store(level as u8, Ordering::SeqCst);
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    if fs::write(path, "").is_ok() {
        let _ = LOG_FILE.set(path.to_path_buf());
    }
}

pub fn is_debug() -> bool {
    enabled(LogLevel::Debug)
}

/// Whether a message at `level` would be recorded.
pub fn enabled(level: LogLevel) -> bool {
    LOG_FILE.get().is_some() && level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Append one line. Use the `blog*` macros instead, which skip formatting
/// when the level is filtered out.
pub fn write(level: LogLevel, args: fmt::Arguments<'_>) {
    let Some(path) = LOG_FILE.get() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] [{}] {}", timestamp, level, args);
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __blog_at {
    ($level:expr, $($arg:tt)*) => {
        if $crate::log::enabled($level) {
            $crate::log::write($level, format_args!($($arg)*))
        }
    };
}

/// Log at INFO.
#[macro_export]
macro_rules! blog {
    ($($arg:tt)*) => { $crate::__blog_at!($crate::log::LogLevel::Info, $($arg)*) };
}

#[macro_export]
macro_rules! blog_error {
    ($($arg:tt)*) => { $crate::__blog_at!($crate::log::LogLevel::Error, $($arg)*) };
}

#[macro_export]
macro_rules! blog_warn {
    ($($arg:tt)*) => { $crate::__blog_at!($crate::log::LogLevel::Warn, $($arg)*) };
}

/// Log at DEBUG; dropped unless debug logging is on.
#[macro_export]
macro_rules! blog_debug {
    ($($arg:tt)*) => { $crate::__blog_at!($crate::log::LogLevel::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! blog_trace {
    ($($arg:tt)*) => { $crate::__blog_at!($crate::log::LogLevel::Trace, $($arg)*) };
}
