//! Per-category CSV export of reconciliation results

use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::*;

/// Flat representation of an exported row: column name and cell text
type ExportRow = Vec<(String, String)>;

/// File name for a category export, e.g. `reconciliation_matched_2024-01-31.csv`
pub fn export_filename(category: Category, date: NaiveDate) -> String {
    format!(
        "reconciliation_{}_{}.csv",
        category.key(),
        date.format("%Y-%m-%d")
    )
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn normalized_row(txn: &NormalizedTransaction) -> ExportRow {
    let mut row = vec![
        (REFERENCE_FIELD.to_string(), txn.reference.clone()),
        (AMOUNT_FIELD.to_string(), txn.amount.to_string()),
        (STATUS_FIELD.to_string(), opt(&txn.status)),
        (DATE_FIELD.to_string(), opt(&txn.date)),
    ];
    row.extend(
        txn.extra
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string())),
    );
    row.push((SOURCE_FIELD.to_string(), txn.source.to_string()));
    row
}

fn matched_row(txn: &MatchedTransaction) -> ExportRow {
    let mut row = normalized_row(&txn.internal);
    row.push((PROVIDER_AMOUNT_FIELD.to_string(), txn.provider_amount.to_string()));
    row.push((PROVIDER_STATUS_FIELD.to_string(), opt(&txn.provider_status)));
    let issues: Vec<_> = txn.issues.iter().map(Issue::label).collect();
    row.push((ISSUES_FIELD.to_string(), issues.join("; ")));
    row
}

fn amount_mismatch_row(mismatch: &AmountMismatch) -> ExportRow {
    vec![
        (REFERENCE_FIELD.to_string(), mismatch.reference.clone()),
        ("internal_amount".to_string(), mismatch.internal_amount.to_string()),
        ("provider_amount".to_string(), mismatch.provider_amount.to_string()),
        ("difference".to_string(), mismatch.difference.to_string()),
    ]
}

fn status_mismatch_row(mismatch: &StatusMismatch) -> ExportRow {
    vec![
        (REFERENCE_FIELD.to_string(), mismatch.reference.clone()),
        ("internal_status".to_string(), opt(&mismatch.internal_status)),
        ("provider_status".to_string(), opt(&mismatch.provider_status)),
    ]
}

fn category_rows(result: &ReconciliationResult, category: Category) -> Vec<ExportRow> {
    match category {
        Category::Matched => result.matched.iter().map(matched_row).collect(),
        Category::InternalOnly => result.internal_only.iter().map(normalized_row).collect(),
        Category::ProviderOnly => result.provider_only.iter().map(normalized_row).collect(),
        Category::AmountMismatches => result
            .amount_mismatches
            .iter()
            .map(amount_mismatch_row)
            .collect(),
        Category::StatusMismatches => result
            .status_mismatches
            .iter()
            .map(status_mismatch_row)
            .collect(),
    }
}

/// Write one category as CSV and return the number of data rows written.
///
/// The header is the union of the rows' columns in first-appearance order;
/// cells a row does not have are left empty. An empty category writes nothing.
pub fn write_category<W: Write>(
    result: &ReconciliationResult,
    category: Category,
    writer: W,
) -> ReconResult<usize> {
    let rows = category_rows(result, category);
    if rows.is_empty() {
        return Ok(0);
    }

    let mut header: Vec<&str> = Vec::new();
    for row in &rows {
        for (name, _) in row {
            if !header.contains(&name.as_str()) {
                header.push(name);
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&header)?;
    for row in &rows {
        let cells = header.iter().map(|column| {
            row.iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.as_str())
                .unwrap_or("")
        });
        csv_writer.write_record(cells)?;
    }
    csv_writer.flush()?;

    Ok(rows.len())
}

/// Render one category as CSV text
pub fn category_to_string(
    result: &ReconciliationResult,
    category: Category,
) -> ReconResult<String> {
    let mut buffer = Vec::new();
    write_category(result, category, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ReconError::Validation(e.to_string()))
}

/// Write one category to `dir` under its dated export file name
pub fn export_category(
    result: &ReconciliationResult,
    category: Category,
    dir: &Path,
    date: NaiveDate,
) -> ReconResult<PathBuf> {
    let path = dir.join(export_filename(category, date));
    let file = File::create(&path)?;
    let rows = write_category(result, category, file)?;
    info!(%category, rows, path = %path.display(), "exported reconciliation category");
    Ok(path)
}
