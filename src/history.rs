//! In-memory query history.
//!
//! Holds the questions answered during this process's lifetime together with
//! the SQL the service generated for them, newest first. Nothing is
//! persisted; the history dies with the process.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default number of entries kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 50;

/// One answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub question: String,
    pub sql: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, newest-first list of answered questions.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Capacity is clamped to at least 1 so `record` always retains the
    /// entry it just inserted.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record an answered question at the front of the history.
    pub fn record(&mut self, question: impl Into<String>, sql: impl Into<String>) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            question: question.into(),
            sql: sql.into(),
            timestamp: Utc::now(),
        };
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new()
    }
}
