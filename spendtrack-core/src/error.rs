//! Error taxonomy shared across the workspace.
//!
//! Row-level failures (`AmountParse`, `DateParse`) are recovered into
//! per-row diagnostics by the ingestion pipeline; `Schema` and `Read`
//! abort a single file; `Config` is fatal at startup.

use chrono::NaiveDate;
use thiserror::Error;

use crate::transaction::TxnId;

#[derive(Debug, Error)]
pub enum Error {
    /// No candidate column was found for a required field.
    #[error("{file}: no column found for required field '{column}'")]
    Schema { file: String, column: String },

    /// An amount cell was non-numeric, or every amount-bearing cell was empty.
    #[error("could not parse amount '{value}'")]
    AmountParse { value: String },

    /// A date cell did not match any accepted format.
    #[error("could not parse date '{value}'")]
    DateParse { value: String },

    /// Malformed synonym table, category rules, or noise phrase list.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown transaction id {0}")]
    UnknownTransaction(TxnId),

    /// A source file could not be read at all.
    #[error("failed to read {file}: {message}")]
    Read { file: String, message: String },

    /// Canonical export could not be written.
    #[error("export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, Error>;
