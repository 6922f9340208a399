//! spendtrack-core: canonical transaction model, classification, and
//! aggregation for the spending tracker.
//!
//! The ingestion pipeline (spendtrack-ingest) produces
//! [`NewTransaction`] rows; everything downstream — the append-only
//! [`TransactionStore`], filtered views, monthly/category aggregates,
//! and budget evaluation — lives here and is pure in-memory
//! computation.

pub mod aggregate;
pub mod budget;
pub mod error;
pub mod filter;
pub mod grouper;
pub mod noise;
pub mod store;
pub mod transaction;

pub use aggregate::{
    CategoryTotal, MonthCategoryTotal, MonthlySummary, category_breakdown, monthly_by_category,
    monthly_summary,
};
pub use budget::{BudgetStatus, evaluate};
pub use error::{Error, Result};
pub use filter::{CategorySelector, DateRange, FilterSpec};
pub use grouper::{CategoryGrouper, CategoryRule, MatchKind, default_rules};
pub use noise::{DEFAULT_NOISE_PHRASES, NoiseFilter};
pub use store::TransactionStore;
pub use transaction::{NewTransaction, Transaction, TxnId, UNCATEGORIZED, month_key};
