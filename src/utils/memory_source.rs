//! In-memory record source for testing

use async_trait::async_trait;

use crate::traits::*;
use crate::types::*;

/// In-memory record source for testing and embedding callers
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    records: Vec<TransactionRecord>,
}

impl MemorySource {
    /// Create a new memory source
    pub fn new(label: impl Into<String>, records: Vec<TransactionRecord>) -> Self {
        Self {
            label: label.into(),
            records,
        }
    }

    /// Add a record
    pub fn push(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn load_records(&self) -> ReconResult<Vec<TransactionRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
