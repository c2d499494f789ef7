//! Reconciliation engine for internal ledger exports and provider statements
//!
//! Records from both sides are matched on their trimmed `transaction_reference`.
//! Every distinct reference ends up in exactly one of `matched`, `internal_only`
//! or `provider_only`. Matched pairs are checked for amount and status
//! discrepancies, which are reported inline as `issues` and in dedicated lists.
//!
//! Data problems never fail a run:
//!
//! - records with a blank or missing reference are dropped from every category
//! - a reference repeated on one side keeps only its last record; earlier ones
//!   are discarded
//! - an amount that is missing or not numeric counts as `0`; trailing text
//!   after a leading number is ignored
//! - a missing status compares unequal to any present status
//!
//! Dropped, overwritten and coerced records are counted in
//! [`ReconciliationDiagnostics`].

mod index;
pub mod normalize;

use tracing::debug;

use crate::config::ReconConfig;
use crate::types::*;
use crate::utils::validation::validate_tolerance;
use index::ReferenceIndex;
use normalize::{amounts_differ, statuses_differ};

/// Matches an internal record set against a provider record set
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconConfig,
}

impl ReconciliationEngine {
    pub fn new(config: ReconConfig) -> Self {
        Self { config }
    }

    /// Create an engine after validating the configuration
    pub fn try_new(config: ReconConfig) -> ReconResult<Self> {
        validate_tolerance(config.amount_tolerance)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Reconcile two record sets.
    ///
    /// Pure and total: the same inputs always give the same result, and no
    /// input makes it fail. See the module docs for how malformed records are
    /// treated.
    pub fn reconcile(
        &self,
        internal: &[TransactionRecord],
        provider: &[TransactionRecord],
    ) -> ReconciliationResult {
        debug!(
            internal = internal.len(),
            provider = provider.len(),
            tolerance = self.config.amount_tolerance,
            "starting reconciliation"
        );

        let internal_index = ReferenceIndex::build(internal, Source::Internal);
        let mut provider_index = ReferenceIndex::build(provider, Source::Provider);

        let diagnostics = ReconciliationDiagnostics {
            blank_reference_internal: internal_index.blank_references,
            blank_reference_provider: provider_index.blank_references,
            duplicate_internal: internal_index.overwritten,
            duplicate_provider: provider_index.overwritten,
            unparsable_amount_internal: internal_index.unparsable_amounts,
            unparsable_amount_provider: provider_index.unparsable_amounts,
        };

        let mut matched = Vec::new();
        let mut internal_only = Vec::new();
        let mut amount_mismatches = Vec::new();
        let mut status_mismatches = Vec::new();

        for internal_txn in internal_index.into_records() {
            let Some(provider_txn) = provider_index.take(&internal_txn.reference) else {
                internal_only.push(internal_txn);
                continue;
            };

            let mut issues = Vec::new();

            if amounts_differ(
                internal_txn.amount,
                provider_txn.amount,
                self.config.amount_tolerance,
            ) {
                issues.push(Issue::AmountMismatch);
                amount_mismatches.push(AmountMismatch {
                    reference: internal_txn.reference.clone(),
                    internal_amount: internal_txn.amount,
                    provider_amount: provider_txn.amount,
                    difference: internal_txn.amount - provider_txn.amount,
                });
            }

            if statuses_differ(
                internal_txn.status.as_deref(),
                provider_txn.status.as_deref(),
            ) {
                issues.push(Issue::StatusMismatch);
                status_mismatches.push(StatusMismatch {
                    reference: internal_txn.reference.clone(),
                    internal_status: internal_txn.status.clone(),
                    provider_status: provider_txn.status.clone(),
                });
            }

            matched.push(MatchedTransaction::new(
                internal_txn,
                provider_txn.amount,
                provider_txn.status,
                issues,
            ));
        }

        debug!(unmatched_provider = provider_index.len(), "matching pass done");
        let provider_only: Vec<_> = provider_index.into_records().collect();

        let summary = ReconciliationSummary {
            total_internal: internal.len(),
            total_provider: provider.len(),
            matched_count: matched.len(),
            internal_only_count: internal_only.len(),
            provider_only_count: provider_only.len(),
            amount_mismatch_count: amount_mismatches.len(),
            status_mismatch_count: status_mismatches.len(),
        };

        debug!(
            matched = summary.matched_count,
            internal_only = summary.internal_only_count,
            provider_only = summary.provider_only_count,
            amount_mismatches = summary.amount_mismatch_count,
            status_mismatches = summary.status_mismatch_count,
            "reconciliation complete"
        );

        ReconciliationResult {
            matched,
            internal_only,
            provider_only,
            amount_mismatches,
            status_mismatches,
            summary,
            diagnostics,
        }
    }
}

/// Reconcile with the default configuration (0.01 amount tolerance)
pub fn reconcile(
    internal: &[TransactionRecord],
    provider: &[TransactionRecord],
) -> ReconciliationResult {
    ReconciliationEngine::default().reconcile(internal, provider)
}
