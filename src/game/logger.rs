//! Engine logging
//!
//! Messages go to stderr so that command output on stdout stays parseable.
//! Each entry carries an optional category ("step", "priority", "payment",
//! "invariant", ...). Tests switch the logger to capture mode and inspect
//! entries by category instead of scraping output.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};

/// Verbosity level for engine output
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub enum VerbosityLevel {
    Silent = 0,
    /// Match start and end, invariant violations
    Minimal = 1,
    /// Turns, steps and rejected events
    #[default]
    Normal = 2,
    /// Priority passes, payments and every applied event
    Verbose = 3,
}

/// How a log line is rendered on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Where log entries end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogSink {
    #[default]
    Stderr,
    /// Kept in memory only
    Capture,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
}

/// Logger owned by the match state
///
/// `log` takes `&self` so read-only queries can report what they did; the
/// capture buffer sits behind a `RefCell`. Only settings are serialized.
#[derive(Serialize, Deserialize)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
    #[serde(default)]
    format: LogFormat,
    #[serde(default)]
    sink: LogSink,
    #[serde(skip)]
    captured: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            format: LogFormat::default(),
            sink: LogSink::default(),
            captured: RefCell::new(Vec::new()),
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_sink(&mut self, sink: LogSink) {
        self.sink = sink;
    }

    /// Keep entries in memory and stop writing to stderr
    pub fn enable_capture(&mut self) {
        self.sink = LogSink::Capture;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.sink, LogSink::Capture | LogSink::Both)
    }

    /// Captured entries, oldest first
    ///
    /// Capture ignores the verbosity filter, so every level is recorded.
    pub fn entries(&self) -> Ref<'_, [LogEntry]> {
        Ref::map(self.captured.borrow(), |v| v.as_slice())
    }

    pub fn logs_in(&self, category: &str) -> Vec<LogEntry> {
        self.captured
            .borrow()
            .iter()
            .filter(|e| e.category.as_deref() == Some(category))
            .cloned()
            .collect()
    }

    /// Remove and return everything captured so far
    pub fn take_entries(&self) -> Vec<LogEntry> {
        self.captured.take()
    }

    pub fn log(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        if level == VerbosityLevel::Silent {
            return;
        }
        let emit = self.sink != LogSink::Capture && level <= self.verbosity;
        let capture = self.is_capturing();
        if !emit && !capture {
            return;
        }

        let entry = LogEntry {
            level,
            category: category.map(str::to_string),
            message: message.to_string(),
        };
        if emit {
            self.emit(&entry);
        }
        if capture {
            self.captured.borrow_mut().push(entry);
        }
    }

    /// Report an internal inconsistency; shown unless the logger is silent
    pub fn invariant(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Silent && !self.is_capturing() {
            return;
        }
        let entry = LogEntry {
            level: VerbosityLevel::Minimal,
            category: Some("invariant".to_string()),
            message: message.to_string(),
        };
        if self.verbosity > VerbosityLevel::Silent {
            self.emit(&entry);
        }
        if self.is_capturing() {
            self.captured.borrow_mut().push(entry);
        }
    }

    fn emit(&self, entry: &LogEntry) {
        match self.format {
            LogFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => eprintln!("{line}"),
                Err(_) => eprintln!("{}", entry.message),
            },
            LogFormat::Text => match &entry.category {
                Some(category) => eprintln!("[{category}] {}", entry.message),
                None => eprintln!("{}", entry.message),
            },
        }
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("sink", &self.sink)
            .field("captured", &self.captured.borrow().len())
            .finish()
    }
}

/// Clones keep the settings but start with an empty capture buffer
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            format: self.format,
            sink: self.sink,
            captured: RefCell::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_ignores_verbosity() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Minimal);
        logger.enable_capture();

        logger.log(VerbosityLevel::Normal, Some("step"), "-> upkeep");
        logger.log(VerbosityLevel::Verbose, Some("payment"), "paid {W}");
        logger.log(VerbosityLevel::Silent, None, "dropped");

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].category.as_deref(), Some("payment"));
    }

    #[test]
    fn test_invariants_are_categorized() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Silent);
        logger.enable_capture();

        logger.log(VerbosityLevel::Normal, Some("step"), "-> draw");
        logger.invariant("card 3 missing from hand");

        let violations = logger.logs_in("invariant");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].level, VerbosityLevel::Minimal);

        assert_eq!(logger.take_entries().len(), 2);
        assert!(logger.entries().is_empty());
    }

    #[test]
    fn test_only_settings_are_serialized() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Verbose);
        logger.set_format(LogFormat::Json);
        logger.enable_capture();
        logger.log(VerbosityLevel::Normal, None, "not serialized");

        let json = serde_json::to_string(&logger).unwrap();
        assert!(!json.contains("not serialized"));
        let restored: GameLogger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.verbosity(), VerbosityLevel::Verbose);
        assert_eq!(restored.format(), LogFormat::Json);
        assert!(restored.is_capturing());
        assert!(restored.entries().is_empty());
    }

    #[test]
    fn test_entry_json_omits_missing_category() {
        let entry = LogEntry {
            level: VerbosityLevel::Normal,
            category: None,
            message: "turn 2".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"level":"Normal","message":"turn 2"}"#);
    }
}
