//! Bounded event log shown in the terminal panel.
//!
//! The log keeps the 20 most recent entries plus the newest one. Entries are
//! never reordered or deduplicated; the oldest are dropped silently.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Entries kept from the previous buffer when a new one is appended.
pub const LOG_RETAINED: usize = 20;
/// Hard bound on the buffer length.
pub const LOG_CAPACITY: usize = LOG_RETAINED + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Danger,
    Success,
    Warning,
}

/// Immutable log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
}

/// Time-based id source. Ids are epoch milliseconds, bumped past the last
/// issued id when several entries land within the same millisecond.
#[derive(Debug, Default, Clone)]
pub struct LogIdGenerator {
    last: u64,
}

impl LogIdGenerator {
    pub fn next_id(&mut self) -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last = now_ms.max(self.last + 1);
        self.last
    }
}

#[derive(Debug, Default, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    ids: LogIdGenerator,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
            ids: LogIdGenerator::default(),
        }
    }

    /// Appends an entry stamped with the current local time.
    pub fn push(&mut self, text: impl Into<String>, kind: LogKind) {
        self.push_at(text, kind, Local::now());
    }

    pub fn push_at(&mut self, text: impl Into<String>, kind: LogKind, at: DateTime<Local>) {
        let entry = LogEntry {
            id: self.ids.next_id(),
            text: text.into(),
            kind,
            timestamp: at.format("%H:%M:%S").to_string(),
        };
        tracing::trace!(id = entry.id, kind = ?entry.kind, "log entry: {}", entry.text);

        while self.entries.len() >= LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Oldest-first iterator.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}
