//! Canonical transaction record all ingested data is normalized into.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouped-category sentinel for rows no mapping rule claims.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Stable synthetic id assigned by the store at ingestion.
///
/// Keys the user-edit overlay, so "what the source said" survives
/// underneath "what the user overrode".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized transaction.
///
/// Sign convention: positive = expense (money leaving the account),
/// negative = income/credit. The ingestion pipeline resolves every
/// source representation into this convention before a row gets here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxnId,
    pub date: NaiveDate,
    /// Free text; required but may be empty.
    pub description: String,
    pub amount: f64,
    /// Source-provided category label, if the export had one.
    pub raw_category: Option<String>,
    /// Canonical reporting category; never empty (falls back to
    /// [`UNCATEGORIZED`]).
    pub grouped_category: String,
    /// Which uploaded source/account the row came from.
    pub source_tag: String,
    /// User-settable; excluded rows are skipped by aggregation and
    /// budget paths but stay visible in the raw table.
    pub excluded: bool,
}

/// An id-less record produced by the ingestion pipeline, consumed by
/// `TransactionStore::add_batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub raw_category: Option<String>,
    pub grouped_category: String,
    pub source_tag: String,
    #[serde(default)]
    pub excluded: bool,
}

impl Transaction {
    /// True when money left the account. Zero-amount rows are neither
    /// expense nor income.
    pub fn is_expense(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_income(&self) -> bool {
        self.amount < 0.0
    }

    /// Year-month key this transaction aggregates under, e.g. `2024-05`.
    pub fn month_key(&self) -> String {
        month_key(self.date)
    }
}

/// Truncate a date to its `YYYY-MM` key.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(amount: f64) -> Transaction {
        Transaction {
            id: TxnId(1),
            date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            description: "COFFEE".to_string(),
            amount,
            raw_category: None,
            grouped_category: UNCATEGORIZED.to_string(),
            source_tag: "Chase".to_string(),
            excluded: false,
        }
    }

    #[test]
    fn test_expense_income_split() {
        assert!(txn(12.50).is_expense());
        assert!(!txn(12.50).is_income());
        assert!(txn(-1000.0).is_income());
        assert!(!txn(-1000.0).is_expense());
    }

    #[test]
    fn test_zero_amount_is_neither() {
        assert!(!txn(0.0).is_expense());
        assert!(!txn(0.0).is_income());
    }

    #[test]
    fn test_month_key_zero_pads() {
        assert_eq!(txn(1.0).month_key(), "2024-05");
        let d = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(month_key(d), "2023-12");
    }
}
