//! Core types and data structures for the reconciliation system

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Field holding the matching key
pub const REFERENCE_FIELD: &str = "transaction_reference";
/// Field holding the transaction amount
pub const AMOUNT_FIELD: &str = "amount";
/// Field holding the transaction status
pub const STATUS_FIELD: &str = "status";
/// Field holding the transaction date
pub const DATE_FIELD: &str = "date";
/// Side tag added to every normalized record
pub const SOURCE_FIELD: &str = "source";
/// Provider amount added to matched records
pub const PROVIDER_AMOUNT_FIELD: &str = "provider_amount";
/// Provider status added to matched records
pub const PROVIDER_STATUS_FIELD: &str = "provider_status";
/// Issue list added to matched records
pub const ISSUES_FIELD: &str = "issues";

/// Which side of the reconciliation a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The internal ledger / system export
    Internal,
    /// The payment provider statement
    Provider,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Internal => write!(f, "internal"),
            Source::Provider => write!(f, "provider"),
        }
    }
}

/// A raw transaction record: field names mapped to string values.
///
/// Fields keep the order in which they were first inserted, so a record parsed
/// from a delimited file keeps its column order. Inserting an existing field
/// name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    fields: Vec<(String, String)>,
}

impl TransactionRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.fields.push((field, value));
                None
            }
        }
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<String> {
        let position = self.fields.iter().position(|(name, _)| name == field)?;
        Some(self.fields.remove(position).1)
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the field is present (even if empty)
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw (untrimmed) transaction reference
    pub fn reference(&self) -> Option<&str> {
        self.get(REFERENCE_FIELD)
    }

    /// Raw amount text
    pub fn amount(&self) -> Option<&str> {
        self.get(AMOUNT_FIELD)
    }

    /// Raw status text
    pub fn status(&self) -> Option<&str> {
        self.get(STATUS_FIELD)
    }

    /// Raw date text
    pub fn date(&self) -> Option<&str> {
        self.get(DATE_FIELD)
    }

    /// Copy of this record without the four reconciliation fields and the
    /// `source` tag, which the engine sets itself
    pub(crate) fn without_core_fields(&self) -> Self {
        self.fields
            .iter()
            .filter(|(name, _)| {
                !matches!(
                    name.as_str(),
                    REFERENCE_FIELD | AMOUNT_FIELD | STATUS_FIELD | DATE_FIELD | SOURCE_FIELD
                )
            })
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TransactionRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

impl Serialize for TransactionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Scalar cell value accepted when deserializing a record. Non-string
/// scalars are coerced to their textual form, nulls mean "absent".
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl ScalarValue {
    fn into_text(self) -> String {
        match self {
            ScalarValue::Text(text) => text,
            ScalarValue::Integer(value) => value.to_string(),
            ScalarValue::Float(value) => value.to_string(),
            ScalarValue::Flag(value) => value.to_string(),
        }
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = TransactionRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of field names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut record = TransactionRecord::new();
        while let Some((field, value)) = map.next_entry::<String, Option<ScalarValue>>()? {
            if let Some(value) = value {
                record.insert(field, value.into_text());
            }
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for TransactionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

/// A record after normalization: trimmed reference, numeric amount and a
/// source tag. Any extra fields of the input record are carried along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    /// Trimmed matching key
    #[serde(rename = "transaction_reference")]
    pub reference: String,
    /// Amount read as a number: its leading number, or 0 when absent or unparsable
    pub amount: f64,
    /// Status exactly as supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Date exactly as supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Which input this record came from
    pub source: Source,
    /// Every other field of the input record
    #[serde(flatten)]
    pub extra: TransactionRecord,
}

impl NormalizedTransaction {
    /// Build a normalized transaction from a raw record and its resolved key and amount
    pub fn from_record(
        record: &TransactionRecord,
        reference: String,
        amount: f64,
        source: Source,
    ) -> Self {
        Self {
            reference,
            amount,
            status: record.status().map(str::to_string),
            date: record.date().map(str::to_string),
            source,
            extra: record.without_core_fields(),
        }
    }
}

/// A discrepancy detected on a matched pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Issue {
    #[serde(rename = "Amount Mismatch")]
    AmountMismatch,
    #[serde(rename = "Status Mismatch")]
    StatusMismatch,
}

impl Issue {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Issue::AmountMismatch => "Amount Mismatch",
            Issue::StatusMismatch => "Status Mismatch",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reference present on both sides, merged into the internal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedTransaction {
    /// The internal side of the pair
    #[serde(flatten)]
    pub internal: NormalizedTransaction,
    /// Amount reported by the provider
    pub provider_amount: f64,
    /// Status reported by the provider
    pub provider_status: Option<String>,
    /// Discrepancies found, in fixed order (amount before status)
    pub issues: Vec<Issue>,
}

impl MatchedTransaction {
    /// Merge a matched pair. Input columns named like the provider fields
    /// are dropped from the internal record's extra fields.
    pub fn new(
        mut internal: NormalizedTransaction,
        provider_amount: f64,
        provider_status: Option<String>,
        issues: Vec<Issue>,
    ) -> Self {
        for field in [PROVIDER_AMOUNT_FIELD, PROVIDER_STATUS_FIELD, ISSUES_FIELD] {
            internal.extra.remove(field);
        }
        Self {
            internal,
            provider_amount,
            provider_status,
            issues,
        }
    }

    /// Whether both sides agree
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_issue(&self, issue: Issue) -> bool {
        self.issues.contains(&issue)
    }
}

/// Amount discrepancy between the two sides of a matched pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountMismatch {
    #[serde(rename = "transaction_reference")]
    pub reference: String,
    pub internal_amount: f64,
    pub provider_amount: f64,
    /// `internal_amount - provider_amount`
    pub difference: f64,
}

/// Status discrepancy between the two sides of a matched pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMismatch {
    #[serde(rename = "transaction_reference")]
    pub reference: String,
    pub internal_status: Option<String>,
    pub provider_status: Option<String>,
}

/// Counts per result category plus raw input sizes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub total_internal: usize,
    pub total_provider: usize,
    pub matched_count: usize,
    pub internal_only_count: usize,
    pub provider_only_count: usize,
    pub amount_mismatch_count: usize,
    pub status_mismatch_count: usize,
}

impl ReconciliationSummary {
    /// Number of distinct references that were classified
    pub fn classified_count(&self) -> usize {
        self.matched_count + self.internal_only_count + self.provider_only_count
    }

    /// Percentage of classified references that matched, 0 when nothing was classified
    pub fn match_rate(&self) -> f64 {
        let total = self.classified_count();
        if total == 0 {
            0.0
        } else {
            self.matched_count as f64 / total as f64 * 100.0
        }
    }
}

/// Data-quality events the engine absorbed without failing.
///
/// None of these affect classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationDiagnostics {
    /// Internal records dropped for a blank or missing reference
    pub blank_reference_internal: usize,
    /// Provider records dropped for a blank or missing reference
    pub blank_reference_provider: usize,
    /// Internal records overwritten by a later record with the same reference
    pub duplicate_internal: usize,
    /// Provider records overwritten by a later record with the same reference
    pub duplicate_provider: usize,
    /// Internal amounts that were not entirely numeric (leading number used, or 0)
    pub unparsable_amount_internal: usize,
    /// Provider amounts that were not entirely numeric (leading number used, or 0)
    pub unparsable_amount_provider: usize,
}

impl ReconciliationDiagnostics {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Full output of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub matched: Vec<MatchedTransaction>,
    pub internal_only: Vec<NormalizedTransaction>,
    pub provider_only: Vec<NormalizedTransaction>,
    pub amount_mismatches: Vec<AmountMismatch>,
    pub status_mismatches: Vec<StatusMismatch>,
    pub summary: ReconciliationSummary,
    #[serde(default)]
    pub diagnostics: ReconciliationDiagnostics,
}

impl ReconciliationResult {
    /// Number of rows in a category
    pub fn category_len(&self, category: Category) -> usize {
        match category {
            Category::Matched => self.matched.len(),
            Category::InternalOnly => self.internal_only.len(),
            Category::ProviderOnly => self.provider_only.len(),
            Category::AmountMismatches => self.amount_mismatches.len(),
            Category::StatusMismatches => self.status_mismatches.len(),
        }
    }

    /// Whether any matched pair carries an issue
    pub fn has_discrepancies(&self) -> bool {
        !self.amount_mismatches.is_empty() || !self.status_mismatches.is_empty()
    }
}

/// One of the exportable result lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Matched,
    InternalOnly,
    ProviderOnly,
    AmountMismatches,
    StatusMismatches,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Matched,
        Category::InternalOnly,
        Category::ProviderOnly,
        Category::AmountMismatches,
        Category::StatusMismatches,
    ];

    /// Stable key used in export file names
    pub fn key(&self) -> &'static str {
        match self {
            Category::Matched => "matched",
            Category::InternalOnly => "internalOnly",
            Category::ProviderOnly => "providerOnly",
            Category::AmountMismatches => "amountMismatches",
            Category::StatusMismatches => "statusMismatches",
        }
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        match self {
            Category::Matched => "Matched Transactions",
            Category::InternalOnly => "Present Only in Internal File",
            Category::ProviderOnly => "Present Only in Provider File",
            Category::AmountMismatches => "Amount Mismatches",
            Category::StatusMismatches => "Status Mismatches",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors raised around the engine: loading, session handling and export.
/// The engine itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("No {0} records supplied; both internal and provider records are required")]
    MissingInput(Source),
    #[error("No reconciliation has been run yet")]
    NoResult,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
