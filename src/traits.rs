//! Traits for record loading

use async_trait::async_trait;

use crate::types::*;

/// Supplier of already-parsed transaction records for one side
///
/// This trait lets the session load records from any backend (delimited
/// files, in-memory fixtures, a database, an HTTP export, etc.) by
/// implementing these methods.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load every record of this source, in source order
    async fn load_records(&self) -> ReconResult<Vec<TransactionRecord>>;

    /// Short human-readable description (a file name, a label)
    fn describe(&self) -> String;
}
