//! Centralized logging for the video extension.
//!
//! Callbacks arrive from the emulator core on its own thread, often once
//! per frame, so logging has to stay cheap and must never block rendering.
//!
//! # Architecture
//!
//! - **LogConfig**: global configuration held in atomics, one level per category
//! - **LogLevel**: Off < Error < Warn < Info < Debug < Trace
//! - **LogCategory**: Video (adapter lifecycle), Gl (attributes, proc lookups),
//!   Display (mode queries), Core (library loading, registration), Ffi (ABI boundary)
//! - **log()**: single entry point; the message closure only runs when enabled
//!
//! Messages go to stderr, or to a file through a background writer thread
//! fed by a channel. Each category is rate limited so that a per-frame
//! warning (for example a missing GL function) cannot flood the output.
//!
//! # Usage
//!
//! ```rust
//! use vidext_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Gl, LogLevel::Warn, || {
//!     format!("VidExtFuncGLGetProc: '{}'", "glFoo")
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

const CATEGORY_COUNT: usize = 5;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Log category for the parts of the video extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Adapter lifecycle (bind, init, quit, mode changes, window events)
    Video,
    /// GL attributes and extension function lookups
    Gl,
    /// Display subsystem queries
    Display,
    /// Core library loading and table registration
    Core,
    /// C ABI boundary (null pointers, re-entrancy)
    Ffi,
}

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Video,
        LogCategory::Gl,
        LogCategory::Display,
        LogCategory::Core,
        LogCategory::Ffi,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Video => 0,
            LogCategory::Gl => 1,
            LogCategory::Display => 2,
            LogCategory::Core => 3,
            LogCategory::Ffi => 4,
        }
    }
}

/// Per-category state of the sliding window
#[derive(Default)]
struct Window {
    timestamps: VecDeque<Instant>,
    dropped: usize,
    last_drop_report: Option<Instant>,
}

/// Sliding-window rate limiter, one window per category.
struct RateLimiter {
    max_per_second: AtomicUsize,
    window_duration: Duration,
    windows: Mutex<[Window; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_per_second: usize) -> Self {
        Self {
            max_per_second: AtomicUsize::new(max_per_second),
            window_duration: Duration::from_secs(1),
            windows: Mutex::new(Default::default()),
        }
    }

    fn set_max_per_second(&self, max: usize) {
        self.max_per_second.store(max, Ordering::Relaxed);
    }

    fn max_per_second(&self) -> usize {
        self.max_per_second.load(Ordering::Relaxed)
    }

    /// Returns (allowed, dropped) where `dropped` is set when a summary of
    /// suppressed messages is due.
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let window = &mut windows[category.index()];

        while let Some(&front) = window.timestamps.front() {
            if now.duration_since(front) > self.window_duration {
                window.timestamps.pop_front();
            } else {
                break;
            }
        }

        if window.timestamps.len() < self.max_per_second() {
            window.timestamps.push_back(now);
            if window.dropped > 0 {
                let dropped = std::mem::take(&mut window.dropped);
                window.last_drop_report = Some(now);
                return (true, Some(dropped));
            }
            return (true, None);
        }

        window.dropped += 1;
        let report_due = match window.last_drop_report {
            None => true,
            Some(last) => now.duration_since(last) >= Duration::from_secs(1),
        };
        if report_due {
            let dropped = std::mem::take(&mut window.dropped);
            window.last_drop_report = Some(now);
            (false, Some(dropped))
        } else {
            (false, None)
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    /// Applies to every category without its own level
    global_level: AtomicU8,
    /// Category overrides, `Off` meaning "use the global level"
    levels: [AtomicU8; CATEGORY_COUNT],
    log_sender: Mutex<Option<Sender<String>>>,
    file_logging_enabled: AtomicBool,
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// Warnings and errors on, 60 messages per second per category.
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Warn as u8),
            levels: Default::default(),
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category level, when set, wins over the global level.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Back to the defaults: global Warn, no category overrides
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Warn);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Set the maximum messages per second per category
    pub fn set_rate_limit(&self, max_per_second: usize) {
        self.rate_limiter.set_max_per_second(max_per_second);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.max_per_second()
    }

    /// Route output to `path` through a background writer thread.
    ///
    /// Replaces any previous log file. Fails if the file cannot be opened.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("vidext-log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        if let Ok(mut slot) = self.log_sender.lock() {
            *slot = Some(sender);
        }
        self.file_logging_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop writing to the log file; the writer thread exits once the
    /// sender is dropped.
    pub fn clear_log_file(&self) {
        if let Ok(mut slot) = self.log_sender.lock() {
            *slot = None;
        }
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, message: String) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            if let Ok(slot) = self.log_sender.lock() {
                if let Some(sender) = slot.as_ref() {
                    if let Err(failed) = sender.send(message) {
                        eprintln!("{}", failed.0);
                    }
                    return;
                }
            }
        }
        eprintln!("{}", message);
    }
}

/// Log a message for `category` at `level`.
///
/// `message_fn` is only evaluated when the level is enabled and the
/// category is under its rate limit. When messages were dropped a summary
/// line is emitted first.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.rate_limiter.should_allow(category);
    if let Some(count) = dropped.filter(|&n| n > 0) {
        config.write_message(format!(
            "[{:?}] WARN: rate limit exceeded, {} message(s) dropped in the last second",
            category, count
        ));
    }

    if allowed {
        config.write_message(format!(
            "[{:?}] {}: {}",
            category,
            level.label(),
            message_fn()
        ));
    }
}
