//! Canonical CSV export.
//!
//! The export schema is stable and self-describing: re-ingesting an
//! exported file through the pipeline with [`canonical_profile`]
//! reproduces the same rows, including user exclusions and grouped
//! categories.
//!
//! [`canonical_profile`]: crate::profile::canonical_profile

use std::io::Write;
use std::path::Path;

use spendtrack_core::{Error, Result, Transaction};

/// Header row of a canonical export, in column order.
pub const CANONICAL_HEADERS: [&str; 7] = [
    "Date",
    "Description",
    "Amount",
    "Raw Category",
    "Grouped Category",
    "Source Tag",
    "Excluded",
];

/// Write transactions as canonical CSV. Dates are ISO (`%Y-%m-%d`),
/// amounts keep the positive-expense sign with two decimals, and the
/// excluded flag is `true`/`false`.
pub fn write_canonical_csv<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CANONICAL_HEADERS)
        .map_err(|e| Error::Export(e.to_string()))?;
    for txn in transactions {
        out.write_record([
            txn.date.format("%Y-%m-%d").to_string(),
            txn.description.clone(),
            format!("{:.2}", txn.amount),
            txn.raw_category.clone().unwrap_or_default(),
            txn.grouped_category.clone(),
            txn.source_tag.clone(),
            txn.excluded.to_string(),
        ])
        .map_err(|e| Error::Export(e.to_string()))?;
    }
    out.flush().map_err(|e| Error::Export(e.to_string()))?;
    Ok(())
}

pub fn export_to_string(transactions: &[Transaction]) -> Result<String> {
    let mut buffer = Vec::new();
    write_canonical_csv(&mut buffer, transactions)?;
    String::from_utf8(buffer).map_err(|e| Error::Export(e.to_string()))
}

pub fn export_to_path(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| Error::Export(format!(
        "cannot create {}: {e}",
        path.display()
    )))?;
    write_canonical_csv(file, transactions)
}
