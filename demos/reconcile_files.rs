//! Reconcile two CSV files and export every category
//!
//! ```text
//! cargo run --example reconcile_files -- internal.csv provider.csv [out_dir]
//! ```
//!
//! Without arguments a small built-in data set is used. Set `RUST_LOG=debug`
//! to see engine events.

use reconciliation_core::utils::{CsvSource, MemorySource};
use reconciliation_core::{Category, ReconciliationSession, TransactionRecord};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn sample(reference: &str, amount: &str, status: &str, date: &str) -> TransactionRecord {
    TransactionRecord::new()
        .with("transaction_reference", reference)
        .with("amount", amount)
        .with("status", status)
        .with("date", date)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🔎 Transaction Reconciliation\n");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut session = ReconciliationSession::new();

    if args.len() >= 2 {
        let internal = CsvSource::from_path(&args[0]);
        let provider = CsvSource::from_path(&args[1]);
        session.load_internal(&internal).await?;
        session.load_provider(&provider).await?;
    } else {
        println!("No files given, using the built-in sample data.\n");
        let internal = MemorySource::new(
            "sample ledger",
            vec![
                sample("TXN-001", "100.00", "Paid", "2024-01-01"),
                sample("TXN-002", "250.00", "Completed", "2024-01-02"),
                sample("TXN-003", "75.50", "Pending", "2024-01-03"),
                sample("TXN-004", "12.00", "Paid", "2024-01-04"),
            ],
        );
        let provider = MemorySource::new(
            "sample statement",
            vec![
                sample("TXN-001", "100.00", "paid", "2024-01-01"),
                sample("TXN-002", "250.00", "pending", "2024-01-02"),
                sample("TXN-003", "75.60", "pending", "2024-01-03"),
                sample("TXN-005", "42.00", "paid", "2024-01-05"),
            ],
        );
        session.load_internal(&internal).await?;
        session.load_provider(&provider).await?;
    }

    let run = session.run()?;
    let summary = &run.result.summary;

    println!("📊 {} vs {}", run.internal_label, run.provider_label);
    println!(
        "  Records: {} internal, {} provider",
        summary.total_internal, summary.total_provider
    );
    println!("  ✓ Matched:        {}", summary.matched_count);
    println!("  ⚠ Internal only:  {}", summary.internal_only_count);
    println!("  ✗ Provider only:  {}", summary.provider_only_count);
    println!("  Match rate:       {:.1}%\n", summary.match_rate());

    if run.result.has_discrepancies() {
        println!("⚠ Discrepancies:");
        for mismatch in &run.result.amount_mismatches {
            println!(
                "  {}: amount {:.2} vs {:.2} (difference {:.2})",
                mismatch.reference,
                mismatch.internal_amount,
                mismatch.provider_amount,
                mismatch.difference
            );
        }
        for mismatch in &run.result.status_mismatches {
            println!(
                "  {}: status {:?} vs {:?}",
                mismatch.reference, mismatch.internal_status, mismatch.provider_status
            );
        }
        println!();
    }

    let diagnostics = &run.result.diagnostics;
    if !diagnostics.is_clean() {
        println!("ℹ Data quality: {:?}\n", diagnostics);
    }

    let out_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    println!("💾 Exporting to {}", out_dir.display());
    for category in Category::ALL {
        let path = session.export(category, &out_dir)?;
        println!("  ✓ {}: {}", category.title(), path.display());
    }

    Ok(())
}
