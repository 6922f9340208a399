//! Filter parameters used to derive read-only views of the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive at both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Grouped-category selector; `All` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategorySelector {
    #[default]
    All,
    Only(String),
}

impl CategorySelector {
    pub fn matches(&self, grouped_category: &str) -> bool {
        match self {
            CategorySelector::All => true,
            CategorySelector::Only(name) => name == grouped_category,
        }
    }
}

/// Bundled filter parameters for `TransactionStore::view`.
///
/// `include_excluded` defaults to false, which is what every
/// calculation path wants; the raw-table display flips it on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub date_range: Option<DateRange>,
    pub category: CategorySelector,
    /// `YYYY-MM` month selector.
    pub month: Option<String>,
    pub include_excluded: bool,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn category(mut self, name: impl Into<String>) -> Self {
        self.category = CategorySelector::Only(name.into());
        self
    }

    pub fn month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    pub fn include_excluded(mut self, include: bool) -> Self {
        self.include_excluded = include;
        self
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if txn.excluded && !self.include_excluded {
            return false;
        }
        if let Some(range) = &self.date_range {
            if !range.contains(txn.date) {
                return false;
            }
        }
        if let Some(month) = &self.month {
            if *month != txn.month_key() {
                return false;
            }
        }
        self.category.matches(&txn.grouped_category)
    }
}
