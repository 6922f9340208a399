//! Per-source ingestion settings.
//!
//! Sign conventions differ between bank exports and are never
//! auto-detected — guessing wrong would silently flip a user's entire
//! financial picture, so the convention is an explicit per-source
//! setting.

use serde::{Deserialize, Serialize};

use spendtrack_core::{Error, Result};

/// What a positive number means in a source's single signed amount
/// column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    /// Positive already means expense; pass through.
    #[default]
    PositiveExpense,
    /// Positive means credit (Chase-style); negate on ingest.
    NegativeExpense,
}

/// How a source represents transaction amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AmountShape {
    /// One signed amount column under the configured convention.
    Signed {
        #[serde(default)]
        convention: SignConvention,
    },
    /// Separate Debit and Credit columns; `amount = debit - credit`,
    /// both holding non-negative magnitudes.
    DebitCredit,
    /// One unsigned amount column plus a transaction-type column whose
    /// value marks the row as debit or credit.
    TypedAmount {
        debit_marker: String,
        credit_marker: String,
    },
}

/// Settings for one upload source/account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    /// Tag stamped onto every transaction from this source.
    pub tag: String,
    #[serde(flatten)]
    pub amount: AmountShape,
}

impl SourceProfile {
    pub fn validate(&self) -> Result<()> {
        if self.tag.trim().is_empty() {
            return Err(Error::Config("source profile has a blank tag".to_string()));
        }
        if let AmountShape::TypedAmount {
            debit_marker,
            credit_marker,
        } = &self.amount
        {
            if debit_marker.trim().is_empty() || credit_marker.trim().is_empty() {
                return Err(Error::Config(format!(
                    "source '{}' has blank debit/credit type markers",
                    self.tag
                )));
            }
        }
        Ok(())
    }
}

/// The two bank exports the original tracker shipped support for.
/// Chase exports purchases as negative amounts; Capital One uses
/// separate Debit/Credit columns.
pub fn default_profiles() -> Vec<SourceProfile> {
    vec![
        SourceProfile {
            tag: "Chase".to_string(),
            amount: AmountShape::Signed {
                convention: SignConvention::NegativeExpense,
            },
        },
        SourceProfile {
            tag: "Capital One".to_string(),
            amount: AmountShape::DebitCredit,
        },
    ]
}

/// Profile for re-ingesting our own canonical exports: already signed
/// with positive = expense, source tags carried per row.
pub fn canonical_profile() -> SourceProfile {
    SourceProfile {
        tag: "import".to_string(),
        amount: AmountShape::Signed {
            convention: SignConvention::PositiveExpense,
        },
    }
}
