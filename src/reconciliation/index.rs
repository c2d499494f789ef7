//! Insertion-ordered reference index for one side of a reconciliation

use std::collections::HashMap;
use tracing::trace;

use super::normalize::{normalize_reference, parse_amount, ParsedAmount};
use crate::types::*;

/// Normalized records of one side keyed by reference.
///
/// Inserting a reference that is already present replaces the stored record
/// but keeps the slot of the first occurrence, so iteration follows the
/// order in which references first appeared and the last record wins.
#[derive(Debug)]
pub(crate) struct ReferenceIndex {
    slots: Vec<Option<NormalizedTransaction>>,
    positions: HashMap<String, usize>,
    pub blank_references: usize,
    pub overwritten: usize,
    pub unparsable_amounts: usize,
}

impl ReferenceIndex {
    /// Normalize and index every record of one side
    pub fn build(records: &[TransactionRecord], source: Source) -> Self {
        let mut index = Self {
            slots: Vec::with_capacity(records.len()),
            positions: HashMap::with_capacity(records.len()),
            blank_references: 0,
            overwritten: 0,
            unparsable_amounts: 0,
        };

        for (row, record) in records.iter().enumerate() {
            let Some(reference) = normalize_reference(record.reference()) else {
                trace!(%source, row, "dropping record without transaction reference");
                index.blank_references += 1;
                continue;
            };

            let parsed = parse_amount(record.amount());
            match parsed {
                ParsedAmount::Exact(_) => {}
                ParsedAmount::Prefix(amount) => {
                    trace!(
                        %source,
                        row,
                        %reference,
                        amount,
                        "amount has trailing text, using leading number"
                    );
                    index.unparsable_amounts += 1;
                }
                ParsedAmount::Invalid => {
                    trace!(%source, row, %reference, "amount is not numeric, using 0");
                    index.unparsable_amounts += 1;
                }
            }
            let amount = parsed.value();

            let txn = NormalizedTransaction::from_record(record, reference, amount, source);
            index.insert(txn, row);
        }

        index
    }

    fn insert(&mut self, txn: NormalizedTransaction, row: usize) {
        match self.positions.get(&txn.reference) {
            Some(&slot) => {
                trace!(
                    source = %txn.source,
                    row,
                    reference = %txn.reference,
                    "duplicate reference overwrites earlier record"
                );
                self.overwritten += 1;
                self.slots[slot] = Some(txn);
            }
            None => {
                self.positions.insert(txn.reference.clone(), self.slots.len());
                self.slots.push(Some(txn));
            }
        }
    }

    /// Remove and return the record for a reference
    pub fn take(&mut self, reference: &str) -> Option<NormalizedTransaction> {
        let slot = self.positions.remove(reference)?;
        self.slots[slot].take()
    }

    /// Number of distinct references still held
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Remaining records in first-appearance order
    pub fn into_records(self) -> impl Iterator<Item = NormalizedTransaction> {
        self.slots.into_iter().flatten()
    }
}
