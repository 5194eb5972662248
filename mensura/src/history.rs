//! Recent conversions kept by a caller
//!
//! The engine itself is stateless. Callers that show recent results keep
//! one of these per session: newest first, at most five entries.

use crate::request::ConversionResult;
use mensura_core::RawValue;
use serde::{Deserialize, Serialize};

/// Maximum number of conversions to keep
pub const MAX_HISTORY_SIZE: usize = 5;

/// A single history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// Input exactly as the caller supplied it
    pub raw_input: String,
    pub result: ConversionResult,
}

/// Bounded, most-recent-first list of conversions
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a result, dropping the oldest entries past the cap
    pub fn record(&mut self, result: ConversionResult, raw_input: &RawValue) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            raw_input: raw_input.to_string(),
            result,
        };
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_SIZE);
        &self.entries[0]
    }

    /// Entries, newest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
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
