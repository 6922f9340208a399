//! In-memory canonical transaction collection.
//!
//! The base records are append-only; user edits (the excluded flag,
//! manual category overrides) live in an overlay keyed by transaction
//! id, applied when views are built. Filters never mutate stored rows.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::transaction::{NewTransaction, Transaction, TxnId};

#[derive(Debug, Clone, Default)]
struct UserOverride {
    excluded: Option<bool>,
    grouped_category: Option<String>,
}

/// Accumulates normalized transactions across ingestion batches within
/// a session. Re-ingesting the same file produces duplicate rows; no
/// dedup key is defined.
#[derive(Debug, Default)]
pub struct TransactionStore {
    base: Vec<Transaction>,
    overrides: HashMap<TxnId, UserOverride>,
    next_id: u64,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Append a batch of normalized rows, assigning each a stable id.
    /// Returns the ids in input order.
    pub fn add_batch(&mut self, rows: Vec<NewTransaction>) -> Vec<TxnId> {
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = TxnId(self.next_id);
            self.next_id += 1;
            self.base.push(Transaction {
                id,
                date: row.date,
                description: row.description,
                amount: row.amount,
                raw_category: row.raw_category,
                grouped_category: row.grouped_category,
                source_tag: row.source_tag,
                excluded: row.excluded,
            });
            ids.push(id);
        }
        tracing::debug!(added = ids.len(), total = self.base.len(), "batch appended");
        ids
    }

    /// Read-only, insertion-ordered projection satisfying the filter.
    /// On an empty store this is an empty vector, never an error.
    pub fn view(&self, spec: &FilterSpec) -> Vec<Transaction> {
        self.base
            .iter()
            .map(|txn| self.apply_overrides(txn))
            .filter(|txn| spec.matches(txn))
            .collect()
    }

    /// Every transaction with user edits applied, excluded rows
    /// included — the raw-table display.
    pub fn all(&self) -> Vec<Transaction> {
        self.view(&FilterSpec::new().include_excluded(true))
    }

    /// Flip a transaction's excluded flag. The base record is left
    /// untouched; the edit lands in the overlay.
    pub fn set_excluded(&mut self, id: TxnId, excluded: bool) -> Result<()> {
        self.ensure_known(id)?;
        self.overrides.entry(id).or_default().excluded = Some(excluded);
        Ok(())
    }

    /// Manually re-categorize a transaction, preserving what the
    /// grouper originally said in the base record.
    pub fn override_category(&mut self, id: TxnId, grouped_category: impl Into<String>) -> Result<()> {
        self.ensure_known(id)?;
        self.overrides.entry(id).or_default().grouped_category = Some(grouped_category.into());
        Ok(())
    }

    /// Month keys present in the store, newest first (the order the
    /// original month picker used).
    pub fn months(&self) -> Vec<String> {
        let set: BTreeSet<String> = self.base.iter().map(|t| t.month_key()).collect();
        set.into_iter().rev().collect()
    }

    /// Grouped categories present in the store, ascending, with user
    /// overrides applied.
    pub fn grouped_categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .base
            .iter()
            .map(|t| self.apply_overrides(t).grouped_category)
            .collect();
        set.into_iter().collect()
    }

    fn apply_overrides(&self, txn: &Transaction) -> Transaction {
        let mut txn = txn.clone();
        if let Some(edit) = self.overrides.get(&txn.id) {
            if let Some(excluded) = edit.excluded {
                txn.excluded = excluded;
            }
            if let Some(category) = &edit.grouped_category {
                txn.grouped_category = category.clone();
            }
        }
        txn
    }

    fn ensure_known(&self, id: TxnId) -> Result<()> {
        if self.base.iter().any(|t| t.id == id) {
            Ok(())
        } else {
            Err(Error::UnknownTransaction(id))
        }
    }
}
