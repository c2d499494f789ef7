//! Delimited-text record source

use async_trait::async_trait;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Clone)]
enum CsvOrigin {
    Path(PathBuf),
    Text(String),
}

/// Reads transaction records from CSV.
///
/// The first row names the columns. Header names and cells are trimmed,
/// blank lines are skipped, and rows whose cell count differs from the
/// header are dropped. Invalid UTF-8 is replaced rather than rejected.
/// Reading is blocking.
#[derive(Debug, Clone)]
pub struct CsvSource {
    origin: CsvOrigin,
    delimiter: u8,
}

impl CsvSource {
    /// Read from a file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: CsvOrigin::Path(path.into()),
            delimiter: b',',
        }
    }

    /// Read from CSV text already in memory
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            origin: CsvOrigin::Text(text.into()),
            delimiter: b',',
        }
    }

    /// Use a different field delimiter (e.g. `b';'` or `b'\t'`)
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse every well-formed row of a CSV reader into records
    pub fn parse_reader<R: Read>(
        reader: R,
        delimiter: u8,
    ) -> ReconResult<Vec<TransactionRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.byte_headers()?.iter().map(decode).collect();
        let mut records = Vec::new();
        let mut ragged = 0usize;

        for row in csv_reader.byte_records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            if row.len() != headers.len() {
                warn!(
                    line,
                    expected = headers.len(),
                    found = row.len(),
                    "dropping row with mismatched cell count"
                );
                ragged += 1;
                continue;
            }

            if std::str::from_utf8(row.as_slice()).is_err() {
                warn!(line, "row contains invalid UTF-8, replacing bad bytes");
            }
            records.push(headers.iter().cloned().zip(row.iter().map(decode)).collect());
        }

        debug!(rows = records.len(), ragged, "parsed CSV records");
        Ok(records)
    }
}

fn decode(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}

#[async_trait]
impl RecordSource for CsvSource {
    async fn load_records(&self) -> ReconResult<Vec<TransactionRecord>> {
        match &self.origin {
            CsvOrigin::Path(path) => Self::parse_reader(File::open(path)?, self.delimiter),
            CsvOrigin::Text(text) => Self::parse_reader(text.as_bytes(), self.delimiter),
        }
    }

    fn describe(&self) -> String {
        match &self.origin {
            CsvOrigin::Path(path) => path.display().to_string(),
            CsvOrigin::Text(_) => "inline CSV".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_keeps_column_order() {
        let text = "transaction_reference , amount,status,date,memo\n A1 , 100.00 ,Paid,2024-01-01, first \n";
        let records = CsvSource::parse_reader(text.as_bytes(), b',').unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.reference(), Some("A1"));
        assert_eq!(record.amount(), Some("100.00"));
        assert_eq!(record.get("memo"), Some("first"));

        let columns: Vec<_> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(
            columns,
            vec!["transaction_reference", "amount", "status", "date", "memo"]
        );
    }

    #[test]
    fn test_parse_drops_ragged_rows_and_blank_lines() {
        let text = "transaction_reference,amount,status,date\nA1,1,paid,2024-01-01\n\nA2,2,paid\nA3,3,paid,2024-01-03,extra\nA4,4,paid,2024-01-04\n";
        let records = CsvSource::parse_reader(text.as_bytes(), b',').unwrap();

        let refs: Vec<_> = records.iter().filter_map(|r| r.reference()).collect();
        assert_eq!(refs, vec!["A1", "A4"]);
    }

    #[test]
    fn test_invalid_utf8_cell_keeps_the_row() {
        let bytes = b"transaction_reference,amount,memo\nA1,10,caf\xe9\nA2,20,ok\n";
        let records = CsvSource::parse_reader(&bytes[..], b',').unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reference(), Some("A1"));
        assert_eq!(records[0].get("memo"), Some("caf\u{FFFD}"));
        assert_eq!(records[1].get("memo"), Some("ok"));
    }

    #[tokio::test]
    async fn test_custom_delimiter() {
        let source =
            CsvSource::from_text("transaction_reference;amount\nA1;\"1,50\"\n").with_delimiter(b';');
        let records = source.load_records().await.unwrap();
        assert_eq!(records[0].amount(), Some("1,50"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = CsvSource::from_path("/definitely/not/here.csv");
        let err = source.load_records().await.unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
        assert_eq!(source.describe(), "/definitely/not/here.csv");
    }

    #[tokio::test]
    async fn test_inline_text_source() {
        let source = CsvSource::from_text("transaction_reference,amount\nX,5\n");
        let records = source.load_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.describe(), "inline CSV");
    }
}
