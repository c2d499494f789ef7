//! Validation utilities

use crate::types::*;

/// Validate that an amount tolerance is finite and not negative
pub fn validate_tolerance(tolerance: f64) -> ReconResult<()> {
    if !tolerance.is_finite() {
        return Err(ReconError::InvalidConfig(format!(
            "amount tolerance must be a finite number, got {}",
            tolerance
        )));
    }

    if tolerance < 0.0 {
        return Err(ReconError::InvalidConfig(format!(
            "amount tolerance cannot be negative, got {}",
            tolerance
        )));
    }

    Ok(())
}

/// Validate that both sides have at least one record
pub fn validate_inputs(
    internal: &[TransactionRecord],
    provider: &[TransactionRecord],
) -> ReconResult<()> {
    if internal.is_empty() {
        return Err(ReconError::MissingInput(Source::Internal));
    }

    if provider.is_empty() {
        return Err(ReconError::MissingInput(Source::Provider));
    }

    Ok(())
}

/// Whether the record carries a non-blank transaction reference
pub fn has_reference(record: &TransactionRecord) -> bool {
    record
        .reference()
        .is_some_and(|reference| !reference.trim().is_empty())
}

/// Validate that a record set exposes the reconciliation key column.
///
/// Returns an error only when no record at all has the reference field,
/// which usually means the wrong file or delimiter was supplied.
pub fn validate_reference_column(
    records: &[TransactionRecord],
    source: Source,
) -> ReconResult<()> {
    if !records.is_empty() && !records.iter().any(|r| r.contains(REFERENCE_FIELD)) {
        return Err(ReconError::Validation(format!(
            "{} records have no '{}' column",
            source, REFERENCE_FIELD
        )));
    }

    Ok(())
}
