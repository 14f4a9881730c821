//! Append-only history of terminal transfer outcomes.

use serde::{Serialize, Serializer};

use crate::models::TransactionRecord;

/// In-memory transfer history.
///
/// `append` is the only mutator. Records are read newest-first; insertion
/// order is the only ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLedger {
    // Oldest first; reads reverse it.
    records: Vec<TransactionRecord>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    /// Records, newest first.
    pub fn records(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter().rev()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&TransactionRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Owned copy, newest first.
    pub fn to_vec(&self) -> Vec<TransactionRecord> {
        self.records().cloned().collect()
    }
}

impl Serialize for HistoryLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records())
    }
}
