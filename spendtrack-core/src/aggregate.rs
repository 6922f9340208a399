//! Time-windowed aggregates computed over filtered views.
//!
//! All functions take a view slice and allocate their results; nothing
//! here touches the store. Empty views produce empty outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Spend/income/net for one `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_spend: f64,
    pub total_income: f64,
    pub net: f64,
}

/// Expense total for one grouped category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub grouped_category: String,
    pub total_spend: f64,
}

/// Expense total for one (month, grouped category) cell; feeds stacked
/// time-series output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCategoryTotal {
    pub month: String,
    pub grouped_category: String,
    pub total_spend: f64,
}

/// Per-month totals, months ascending.
///
/// `total_spend` sums positive amounts, `total_income` the magnitude of
/// negative amounts, `net = income - spend`. Zero-amount rows count
/// toward neither.
pub fn monthly_summary(view: &[Transaction]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for txn in view {
        let entry = months.entry(txn.month_key()).or_default();
        if txn.is_expense() {
            entry.0 += txn.amount;
        } else if txn.is_income() {
            entry.1 += -txn.amount;
        }
    }
    months
        .into_iter()
        .map(|(month, (spend, income))| MonthlySummary {
            month,
            total_spend: spend,
            total_income: income,
            net: income - spend,
        })
        .collect()
}

/// Expense-only totals per grouped category, largest first (category
/// name breaks ties). Categories with no expense rows are omitted
/// entirely rather than reported as zero.
pub fn category_breakdown(view: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for txn in view.iter().filter(|t| t.is_expense()) {
        *totals.entry(txn.grouped_category.as_str()).or_default() += txn.amount;
    }
    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            grouped_category: category.to_string(),
            total_spend: total,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_spend
            .partial_cmp(&a.total_spend)
            .expect("expense totals are finite")
            .then_with(|| a.grouped_category.cmp(&b.grouped_category))
    });
    rows
}

/// Expense-only totals per (month, grouped category), sorted by month
/// then category.
pub fn monthly_by_category(view: &[Transaction]) -> Vec<MonthCategoryTotal> {
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for txn in view.iter().filter(|t| t.is_expense()) {
        *totals
            .entry((txn.month_key(), txn.grouped_category.clone()))
            .or_default() += txn.amount;
    }
    totals
        .into_iter()
        .map(|((month, category), total)| MonthCategoryTotal {
            month,
            grouped_category: category,
            total_spend: total,
        })
        .collect()
}
