//! Caller-owned reconciliation session: both inputs plus the latest result

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::reconciliation::ReconciliationEngine;
use crate::traits::*;
use crate::types::*;
use crate::utils::export::export_category;
use crate::utils::validation::{validate_inputs, validate_reference_column};

/// Records loaded for one side, with a label describing where they came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedRecords {
    pub label: String,
    pub records: Vec<TransactionRecord>,
}

/// One completed reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRun {
    pub id: Uuid,
    pub reconciled_at: NaiveDateTime,
    pub internal_label: String,
    pub provider_label: String,
    pub result: ReconciliationResult,
}

/// Holds the internal and provider inputs and the result of the last run.
///
/// Replacing or clearing either input discards the previous result, so a
/// result always describes the inputs currently held.
#[derive(Debug)]
pub struct ReconciliationSession {
    id: Uuid,
    engine: ReconciliationEngine,
    internal: Option<LoadedRecords>,
    provider: Option<LoadedRecords>,
    latest: Option<ReconciliationRun>,
}

impl ReconciliationSession {
    /// Create a session with the default engine
    pub fn new() -> Self {
        Self::with_engine(ReconciliationEngine::default())
    }

    /// Create a session with a custom engine
    pub fn with_engine(engine: ReconciliationEngine) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            internal: None,
            provider: None,
            latest: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Load the internal side from a record source
    pub async fn load_internal<R: RecordSource + ?Sized>(
        &mut self,
        source: &R,
    ) -> ReconResult<usize> {
        let records = source.load_records().await?;
        Ok(self.set_internal(records, source.describe()))
    }

    /// Load the provider side from a record source
    pub async fn load_provider<R: RecordSource + ?Sized>(
        &mut self,
        source: &R,
    ) -> ReconResult<usize> {
        let records = source.load_records().await?;
        Ok(self.set_provider(records, source.describe()))
    }

    /// Replace the internal records, returning how many were stored
    pub fn set_internal(
        &mut self,
        records: Vec<TransactionRecord>,
        label: impl Into<String>,
    ) -> usize {
        self.set_side(Source::Internal, records, label.into())
    }

    /// Replace the provider records, returning how many were stored
    pub fn set_provider(
        &mut self,
        records: Vec<TransactionRecord>,
        label: impl Into<String>,
    ) -> usize {
        self.set_side(Source::Provider, records, label.into())
    }

    fn set_side(&mut self, side: Source, records: Vec<TransactionRecord>, label: String) -> usize {
        if let Err(e) = validate_reference_column(&records, side) {
            warn!(session = %self.id, %side, %label, "{}", e);
        }

        let count = records.len();
        info!(session = %self.id, %side, %label, records = count, "loaded records");

        let loaded = Some(LoadedRecords { label, records });
        match side {
            Source::Internal => self.internal = loaded,
            Source::Provider => self.provider = loaded,
        }
        self.latest = None;
        count
    }

    /// Drop the internal records and any result
    pub fn clear_internal(&mut self) {
        self.internal = None;
        self.latest = None;
    }

    /// Drop the provider records and any result
    pub fn clear_provider(&mut self) {
        self.provider = None;
        self.latest = None;
    }

    pub fn internal(&self) -> Option<&LoadedRecords> {
        self.internal.as_ref()
    }

    pub fn provider(&self) -> Option<&LoadedRecords> {
        self.provider.as_ref()
    }

    /// Reconcile the loaded inputs and keep the run as the latest result.
    ///
    /// Both sides must hold at least one record.
    pub fn run(&mut self) -> ReconResult<&ReconciliationRun> {
        let internal = self
            .internal
            .as_ref()
            .map(|side| side.records.as_slice())
            .unwrap_or_default();
        let provider = self
            .provider
            .as_ref()
            .map(|side| side.records.as_slice())
            .unwrap_or_default();
        validate_inputs(internal, provider)?;

        let run = ReconciliationRun {
            id: Uuid::new_v4(),
            reconciled_at: Utc::now().naive_utc(),
            internal_label: label_of(&self.internal),
            provider_label: label_of(&self.provider),
            result: self.engine.reconcile(internal, provider),
        };

        info!(
            session = %self.id,
            run = %run.id,
            matched = run.result.summary.matched_count,
            internal_only = run.result.summary.internal_only_count,
            provider_only = run.result.summary.provider_only_count,
            "reconciliation run stored"
        );

        Ok(&*self.latest.insert(run))
    }

    /// The last completed run, if the inputs have not changed since
    pub fn latest(&self) -> Option<&ReconciliationRun> {
        self.latest.as_ref()
    }

    /// Export one category of the latest run into `dir`, named with today's date
    pub fn export(&self, category: Category, dir: &Path) -> ReconResult<PathBuf> {
        let run = self.latest.as_ref().ok_or(ReconError::NoResult)?;
        export_category(&run.result, category, dir, Utc::now().date_naive())
    }
}

impl Default for ReconciliationSession {
    fn default() -> Self {
        Self::new()
    }
}

fn label_of(side: &Option<LoadedRecords>) -> String {
    side.as_ref()
        .map(|loaded| loaded.label.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_source::MemorySource;

    fn record(reference: &str, amount: &str, status: &str) -> TransactionRecord {
        TransactionRecord::new()
            .with(REFERENCE_FIELD, reference)
            .with(AMOUNT_FIELD, amount)
            .with(STATUS_FIELD, status)
    }

    #[test]
    fn test_run_requires_both_sides() {
        let mut session = ReconciliationSession::new();
        assert!(matches!(
            session.run(),
            Err(ReconError::MissingInput(Source::Internal))
        ));

        session.set_internal(vec![record("A", "1", "paid")], "ledger");
        assert!(matches!(
            session.run(),
            Err(ReconError::MissingInput(Source::Provider))
        ));

        session.set_provider(Vec::new(), "empty statement");
        assert!(matches!(
            session.run(),
            Err(ReconError::MissingInput(Source::Provider))
        ));
    }

    #[tokio::test]
    async fn test_load_and_run() {
        let mut session = ReconciliationSession::new();
        let internal = MemorySource::new("ledger", vec![record("A", "1", "paid")]);
        let provider = MemorySource::new(
            "statement",
            vec![record("A", "1", "PAID"), record("B", "2", "paid")],
        );

        assert_eq!(session.load_internal(&internal).await.unwrap(), 1);
        assert_eq!(session.load_provider(&provider).await.unwrap(), 2);

        let run = session.run().unwrap();
        assert_eq!(run.internal_label, "ledger");
        assert_eq!(run.provider_label, "statement");
        assert_eq!(run.result.summary.matched_count, 1);
        assert_eq!(run.result.summary.provider_only_count, 1);
        assert!(session.latest().is_some());
    }

    #[test]
    fn test_replacing_input_clears_result() {
        let mut session = ReconciliationSession::new();
        session.set_internal(vec![record("A", "1", "paid")], "ledger");
        session.set_provider(vec![record("A", "1", "paid")], "statement");
        session.run().unwrap();

        session.set_provider(vec![record("B", "1", "paid")], "statement v2");
        assert!(session.latest().is_none());

        session.run().unwrap();
        session.clear_internal();
        assert!(session.latest().is_none());
        assert!(session.internal().is_none());
        assert!(session.provider().is_some());
    }

    #[test]
    fn test_export_without_run_fails() {
        let session = ReconciliationSession::new();
        let err = session
            .export(Category::Matched, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ReconError::NoResult));
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(ReconciliationSession::new().id(), ReconciliationSession::new().id());
    }
}
