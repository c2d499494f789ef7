// Property-based tests for the reconciliation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use reconciliation_core::{reconcile, Issue, TransactionRecord};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small reference space so both sides collide often; sometimes blank.
fn arb_reference() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => r" ?R[0-9]{1} ?",
        1 => Just("".to_string()),
        1 => Just("   ".to_string()),
    ]
}

/// Mostly numeric amounts, sometimes garbage or empty.
fn arb_amount() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => r"-?[0-9]{1,4}(\.[0-9]{1,2})?",
        1 => r"[a-z]{1,5}",
        1 => Just("".to_string()),
    ]
}

fn arb_status() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        4 => prop::sample::select(vec!["paid", "Paid", " PAID ", "pending", "failed"])
            .prop_map(|s| Some(s.to_string())),
        1 => Just(None),
    ]
}

fn arb_record() -> impl Strategy<Value = TransactionRecord> {
    (arb_reference(), arb_amount(), arb_status()).prop_map(|(reference, amount, status)| {
        let mut record = TransactionRecord::new()
            .with("transaction_reference", reference)
            .with("amount", amount)
            .with("date", "2024-01-01");
        if let Some(status) = status {
            record.insert("status", status);
        }
        record
    })
}

fn arb_side() -> impl Strategy<Value = Vec<TransactionRecord>> {
    prop::collection::vec(arb_record(), 0..20)
}

fn distinct_refs(records: &[TransactionRecord]) -> HashSet<String> {
    records
        .iter()
        .filter_map(|r| r.reference())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn every_reference_lands_in_exactly_one_category(
        internal in arb_side(),
        provider in arb_side(),
    ) {
        let result = reconcile(&internal, &provider);

        let internal_refs = distinct_refs(&internal);
        let provider_refs = distinct_refs(&provider);
        let all: HashSet<_> = internal_refs.union(&provider_refs).cloned().collect();

        prop_assert_eq!(
            result.matched.len() + result.internal_only.len() + result.provider_only.len(),
            all.len()
        );

        let mut seen = HashSet::new();
        for reference in result
            .matched
            .iter()
            .map(|m| &m.internal.reference)
            .chain(result.internal_only.iter().map(|t| &t.reference))
            .chain(result.provider_only.iter().map(|t| &t.reference))
        {
            prop_assert!(seen.insert(reference.clone()), "duplicate {}", reference);
        }
        prop_assert_eq!(seen, all);
    }

    #[test]
    fn issues_follow_comparison_rules(
        internal in arb_side(),
        provider in arb_side(),
    ) {
        let result = reconcile(&internal, &provider);

        for pair in &result.matched {
            let amount_off = (pair.internal.amount - pair.provider_amount).abs() > 0.01;
            let norm = |s: &Option<String>| s.as_ref().map(|s| s.trim().to_lowercase());
            let status_off = norm(&pair.internal.status) != norm(&pair.provider_status);

            prop_assert_eq!(pair.has_issue(Issue::AmountMismatch), amount_off);
            prop_assert_eq!(pair.has_issue(Issue::StatusMismatch), status_off);
            if amount_off && status_off {
                prop_assert_eq!(&pair.issues, &vec![Issue::AmountMismatch, Issue::StatusMismatch]);
            }
        }

        let with_issue = |issue| result.matched.iter().filter(|m| m.has_issue(issue)).count();
        let amount_issues = with_issue(Issue::AmountMismatch);
        let status_issues = with_issue(Issue::StatusMismatch);
        prop_assert_eq!(result.amount_mismatches.len(), amount_issues);
        prop_assert_eq!(result.status_mismatches.len(), status_issues);
    }

    #[test]
    fn summary_is_consistent(
        internal in arb_side(),
        provider in arb_side(),
    ) {
        let result = reconcile(&internal, &provider);
        let summary = &result.summary;

        prop_assert_eq!(summary.total_internal, internal.len());
        prop_assert_eq!(summary.total_provider, provider.len());
        prop_assert_eq!(summary.matched_count, result.matched.len());
        prop_assert_eq!(summary.internal_only_count, result.internal_only.len());
        prop_assert_eq!(summary.provider_only_count, result.provider_only.len());
        prop_assert_eq!(summary.amount_mismatch_count, result.amount_mismatches.len());
        prop_assert_eq!(summary.status_mismatch_count, result.status_mismatches.len());
    }

    #[test]
    fn reconcile_is_deterministic(
        internal in arb_side(),
        provider in arb_side(),
    ) {
        prop_assert_eq!(reconcile(&internal, &provider), reconcile(&internal, &provider));
    }
}
