//! Pipeline log broadcasting.
//!
//! Every entry goes to a broadcast channel that library callers can
//! [`subscribe`](LogBroadcaster::subscribe) to. Once [`init`] has run, entries
//! are also echoed to stderr (when verbose) and error entries are appended
//! to the log file in the `YYYY-mm-dd HH:MM:SS [ERROR] message` format.
//!
//! stdout is never written here: it carries the pipeline result.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::Settings;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level, for stage details
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Line written to the log file.
    pub fn file_line(&self, timestamp: chrono::DateTime<chrono::Local>) -> String {
        format!(
            "{} [{}] {}",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level.label(),
            self.message
        )
    }
}

/// Output sinks chosen at start-up.
#[derive(Debug, Clone, Default)]
struct Sinks {
    echo: bool,
    error_file: Option<PathBuf>,
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Configure the global sinks. Only the first call has an effect.
pub fn init(settings: &Settings) {
    LOG_BROADCASTER.configure(settings.verbose, settings.log_file.clone());
}

/// Broadcasts log entries to every subscriber and the configured sinks.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    sinks: OnceCell<Sinks>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender, sinks: OnceCell::new() }
    }

    fn configure(&self, echo: bool, error_file: Option<PathBuf>) {
        let _ = self.sinks.set(Sinks { echo, error_file });
    }

    /// Publish a log entry.
    pub fn log(&self, entry: LogEntry) {
        if let Some(sinks) = self.sinks.get() {
            if sinks.echo {
                let prefix = match entry.level {
                    LogLevel::Info => "   ",
                    LogLevel::Success => "   ✓",
                    LogLevel::Warning => "   ⚠️",
                    LogLevel::Error => "   ❌",
                };
                let indent = "   ".repeat(entry.indent as usize);
                eprintln!("{}{} {}", indent, prefix, entry.message);
            }
            if entry.level == LogLevel::Error {
                if let Some(path) = &sinks.error_file {
                    append_line(path, &entry.file_line(chrono::Local::now()));
                }
            }
        }

        // No subscribers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn append_line(path: &Path, line: &str) {
    let written = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{}", line));
    if let Err(e) = written {
        eprintln!("Cannot write log file {}: {}", path.display(), e);
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}
