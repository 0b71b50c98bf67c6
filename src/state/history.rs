use crate::{config::DEFAULT_HISTORY_CAPACITY, models::GenerationRecord};
use serde::Serialize;
use std::collections::VecDeque;

/// Newest-first list of finished generations. Appending past the capacity
/// evicts the oldest entry; nothing else ever removes or edits a record.
/// The capacity never exceeds ten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStore {
    capacity: usize,
    records: VecDeque<GenerationRecord>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, DEFAULT_HISTORY_CAPACITY);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: GenerationRecord) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Copy of this store with `record` added.
    pub fn with_record(&self, record: GenerationRecord) -> Self {
        let mut next = self.clone();
        next.push(record);
        next
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn newest(&self) -> Option<&GenerationRecord> {
        self.records.front()
    }

    pub fn get(&self, id: &str) -> Option<&GenerationRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<GenerationRecord> {
        self.records.iter().cloned().collect()
    }

    /// Timestamp for the next record: `now_ms`, bumped past the newest
    /// entry so timestamps (and ids derived from them) stay strictly
    /// increasing.
    pub fn next_timestamp(&self, now_ms: i64) -> i64 {
        match self.newest() {
            Some(newest) if newest.timestamp >= now_ms => newest.timestamp + 1,
            _ => now_ms,
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
