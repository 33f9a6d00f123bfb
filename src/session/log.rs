//! Capped, timestamped diagnostics log shown to the user.

use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

use tracing::info;

/// Maximum number of retained log entries; the oldest is evicted first.
pub const LOG_CAPACITY: usize = 50;

/// One timestamped log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: SystemTime,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", httpdate::fmt_http_date(self.at), self.message)
    }
}

/// Append-only ring buffer of [`LogEntry`] values.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// Creates a buffer holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a message stamped with the current time.
    ///
    /// Every append is mirrored to `tracing` at info level.
    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(SystemTime::now(), message);
    }

    /// Appends a message with an explicit timestamp.
    pub fn push_at(&mut self, at: SystemTime, message: impl Into<String>) {
        let message = message.into();
        info!(target: "linkgrab::session", "{message}");
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry { at, message });
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
