//! Budget-versus-actual evaluation for a reporting period.

use serde::{Deserialize, Serialize};

/// Outcome of comparing a period's spend against a budget limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// Period label, e.g. a `YYYY-MM` month key.
    pub period: String,
    pub spend: f64,
    pub budget_limit: f64,
    /// Raw `spend / budget_limit`; `None` when no budget is set.
    pub ratio: Option<f64>,
    /// Ratio clamped to `[0, 1]` for progress-bar display. Clamping
    /// never hides the over-budget condition below.
    pub progress: f64,
    pub over_budget: bool,
}

impl BudgetStatus {
    /// A zero (or negative) limit means "no budget set".
    pub fn has_budget(&self) -> bool {
        self.budget_limit > 0.0
    }
}

/// Compare `spend` against `budget_limit` for `period`.
///
/// A limit of zero is the distinct "no budget set" state: no ratio is
/// computed and the period is never over budget. Spending exactly the
/// limit is not over budget.
pub fn evaluate(period: impl Into<String>, spend: f64, budget_limit: f64) -> BudgetStatus {
    let period = period.into();
    if budget_limit <= 0.0 {
        return BudgetStatus {
            period,
            spend,
            budget_limit,
            ratio: None,
            progress: 0.0,
            over_budget: false,
        };
    }
    let ratio = spend / budget_limit;
    BudgetStatus {
        period,
        spend,
        budget_limit,
        ratio: Some(ratio),
        progress: ratio.clamp(0.0, 1.0),
        over_budget: spend > budget_limit,
    }
}
