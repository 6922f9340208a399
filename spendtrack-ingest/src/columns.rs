//! Column mapping: resolves arbitrary per-bank CSV header layouts onto
//! canonical fields through a configurable synonym table, so new
//! export formats are a configuration edit rather than a new parser.

use serde::{Deserialize, Serialize};

use spendtrack_core::{Error, Result};

use crate::profile::AmountShape;

/// Canonical fields a source column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Description,
    Amount,
    Debit,
    Credit,
    TxnType,
    Category,
    GroupedCategory,
    SourceTag,
    Excluded,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Description => "description",
            Field::Amount => "amount",
            Field::Debit => "debit",
            Field::Credit => "credit",
            Field::TxnType => "transaction type",
            Field::Category => "category",
            Field::GroupedCategory => "grouped category",
            Field::SourceTag => "source tag",
            Field::Excluded => "excluded",
        }
    }
}

fn date_synonyms() -> Vec<String> {
    to_strings(&["date", "trans date", "transaction date", "post date", "posted date"])
}

fn description_synonyms() -> Vec<String> {
    to_strings(&["description", "payee", "memo", "memo/description"])
}

fn amount_synonyms() -> Vec<String> {
    to_strings(&["amount"])
}

fn debit_synonyms() -> Vec<String> {
    to_strings(&["debit", "amount (debit)"])
}

fn credit_synonyms() -> Vec<String> {
    to_strings(&["credit", "amount (credit)"])
}

fn txn_type_synonyms() -> Vec<String> {
    to_strings(&["type", "transaction type", "tran type"])
}

fn category_synonyms() -> Vec<String> {
    to_strings(&["category", "raw category"])
}

fn grouped_category_synonyms() -> Vec<String> {
    to_strings(&["grouped category"])
}

fn source_tag_synonyms() -> Vec<String> {
    to_strings(&["source tag", "account"])
}

fn excluded_synonyms() -> Vec<String> {
    to_strings(&["excluded"])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Accepted source header names per canonical field. Matching is on
/// trimmed, lower-cased cells; the defaults cover Chase and Capital
/// One exports plus our own canonical export headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymTable {
    pub date: Vec<String>,
    pub description: Vec<String>,
    pub amount: Vec<String>,
    pub debit: Vec<String>,
    pub credit: Vec<String>,
    pub txn_type: Vec<String>,
    pub category: Vec<String>,
    pub grouped_category: Vec<String>,
    pub source_tag: Vec<String>,
    pub excluded: Vec<String>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self {
            date: date_synonyms(),
            description: description_synonyms(),
            amount: amount_synonyms(),
            debit: debit_synonyms(),
            credit: credit_synonyms(),
            txn_type: txn_type_synonyms(),
            category: category_synonyms(),
            grouped_category: grouped_category_synonyms(),
            source_tag: source_tag_synonyms(),
            excluded: excluded_synonyms(),
        }
    }
}

impl SynonymTable {
    /// Required fields must keep at least one accepted name, and no
    /// synonym may be blank.
    pub fn validate(&self) -> Result<()> {
        for (field, list) in [
            (Field::Date, &self.date),
            (Field::Description, &self.description),
            (Field::Amount, &self.amount),
            (Field::Debit, &self.debit),
            (Field::Credit, &self.credit),
        ] {
            if list.is_empty() {
                return Err(Error::Config(format!(
                    "synonym table has no accepted names for '{}'",
                    field.name()
                )));
            }
        }
        for list in self.all_lists() {
            if list.iter().any(|s| s.trim().is_empty()) {
                return Err(Error::Config(
                    "synonym table contains a blank column name".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn all_lists(&self) -> [&Vec<String>; 10] {
        [
            &self.date,
            &self.description,
            &self.amount,
            &self.debit,
            &self.credit,
            &self.txn_type,
            &self.category,
            &self.grouped_category,
            &self.source_tag,
            &self.excluded,
        ]
    }

    fn candidates(&self, field: Field) -> &[String] {
        match field {
            Field::Date => &self.date,
            Field::Description => &self.description,
            Field::Amount => &self.amount,
            Field::Debit => &self.debit,
            Field::Credit => &self.credit,
            Field::TxnType => &self.txn_type,
            Field::Category => &self.category,
            Field::GroupedCategory => &self.grouped_category,
            Field::SourceTag => &self.source_tag,
            Field::Excluded => &self.excluded,
        }
    }

    /// Index of the first (left-to-right) header cell matching one of
    /// the field's accepted names.
    pub fn find(&self, headers: &[String], field: Field) -> Option<usize> {
        let candidates = self.candidates(field);
        headers.iter().position(|header| {
            let normalized = header.trim().to_lowercase();
            candidates
                .iter()
                .any(|c| c.trim().to_lowercase() == normalized)
        })
    }

    /// Whether this row looks like a header at all (has a date-bearing
    /// column). Used to skip preamble lines above the real header.
    pub fn looks_like_header(&self, headers: &[String]) -> bool {
        self.find(headers, Field::Date).is_some()
    }
}

/// Amount-bearing columns, resolved per the source's [`AmountShape`].
/// Carrying the indices inside the variant means a resolved layout can
/// always be normalized; there is no "shape says debit/credit but no
/// debit column" state to defend against later.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountColumns {
    Signed { amount: usize, convention: crate::profile::SignConvention },
    DebitCredit { debit: usize, credit: usize },
    Typed {
        amount: usize,
        txn_type: usize,
        debit_marker: String,
        credit_marker: String,
    },
}

/// Resolved column indices for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub date: usize,
    pub description: usize,
    pub amounts: AmountColumns,
    pub category: Option<usize>,
    pub grouped_category: Option<usize>,
    pub source_tag: Option<usize>,
    pub excluded: Option<usize>,
}

/// Map a header row onto canonical fields.
///
/// Date and description are always required; which amount-bearing
/// columns are required depends on the source's [`AmountShape`]. A
/// missing required column is a `SchemaError` naming the file and
/// field, which aborts this file only.
pub fn resolve_layout(
    headers: &[String],
    table: &SynonymTable,
    shape: &AmountShape,
    file: &str,
) -> Result<ColumnLayout> {
    let require = |field: Field| {
        table.find(headers, field).ok_or_else(|| Error::Schema {
            file: file.to_string(),
            column: field.name().to_string(),
        })
    };

    let amounts = match shape {
        AmountShape::Signed { convention } => AmountColumns::Signed {
            amount: require(Field::Amount)?,
            convention: *convention,
        },
        AmountShape::DebitCredit => AmountColumns::DebitCredit {
            debit: require(Field::Debit)?,
            credit: require(Field::Credit)?,
        },
        AmountShape::TypedAmount {
            debit_marker,
            credit_marker,
        } => AmountColumns::Typed {
            amount: require(Field::Amount)?,
            txn_type: require(Field::TxnType)?,
            debit_marker: debit_marker.clone(),
            credit_marker: credit_marker.clone(),
        },
    };

    Ok(ColumnLayout {
        date: require(Field::Date)?,
        description: require(Field::Description)?,
        amounts,
        category: table.find(headers, Field::Category),
        grouped_category: table.find(headers, Field::GroupedCategory),
        source_tag: table.find(headers, Field::SourceTag),
        excluded: table.find(headers, Field::Excluded),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SignConvention;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn signed() -> AmountShape {
        AmountShape::Signed {
            convention: SignConvention::PositiveExpense,
        }
    }

    #[test]
    fn test_resolves_chase_style_header() {
        let table = SynonymTable::default();
        let h = headers(&["Transaction Date", "Description", "Category", "Amount"]);
        let layout = resolve_layout(&h, &table, &signed(), "chase.csv").unwrap();
        assert_eq!(layout.date, 0);
        assert_eq!(layout.description, 1);
        assert_eq!(layout.category, Some(2));
        assert!(matches!(layout.amounts, AmountColumns::Signed { amount: 3, .. }));
    }

    #[test]
    fn test_resolves_old_chase_header_variant() {
        let table = SynonymTable::default();
        let h = headers(&["Trans Date", "Description", "Category", "Amount"]);
        let layout = resolve_layout(&h, &table, &signed(), "chase.csv").unwrap();
        assert_eq!(layout.date, 0);
    }

    #[test]
    fn test_header_matching_ignores_case_and_whitespace() {
        let table = SynonymTable::default();
        let h = headers(&["  TRANSACTION DATE ", "description", "AMOUNT"]);
        let layout = resolve_layout(&h, &table, &signed(), "x.csv").unwrap();
        assert_eq!(layout.date, 0);
        assert!(matches!(layout.amounts, AmountColumns::Signed { amount: 2, .. }));
    }

    #[test]
    fn test_debit_credit_shape_requires_both_columns() {
        let table = SynonymTable::default();
        let h = headers(&["Transaction Date", "Description", "Category", "Debit", "Credit"]);
        let layout = resolve_layout(&h, &table, &AmountShape::DebitCredit, "capone.csv").unwrap();
        assert!(matches!(
            layout.amounts,
            AmountColumns::DebitCredit { debit: 3, credit: 4 }
        ));

        let missing = headers(&["Transaction Date", "Description", "Debit"]);
        let err = resolve_layout(&missing, &table, &AmountShape::DebitCredit, "capone.csv")
            .unwrap_err();
        assert!(matches!(err, Error::Schema { ref column, .. } if column == "credit"));
    }

    #[test]
    fn test_missing_date_column_reports_file() {
        let table = SynonymTable::default();
        let h = headers(&["Description", "Amount"]);
        let err = resolve_layout(&h, &table, &signed(), "weird.csv").unwrap_err();
        match err {
            Error::Schema { file, column } => {
                assert_eq!(file, "weird.csv");
                assert_eq!(column, "date");
            }
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_canonical_export_headers_resolve() {
        let table = SynonymTable::default();
        let h = headers(&[
            "Date",
            "Description",
            "Amount",
            "Raw Category",
            "Grouped Category",
            "Source Tag",
            "Excluded",
        ]);
        let layout = resolve_layout(&h, &table, &signed(), "export.csv").unwrap();
        assert_eq!(layout.category, Some(3));
        assert_eq!(layout.grouped_category, Some(4));
        assert_eq!(layout.source_tag, Some(5));
        assert_eq!(layout.excluded, Some(6));
    }

    #[test]
    fn test_empty_required_synonym_list_is_config_error() {
        let table = SynonymTable {
            date: vec![],
            ..SynonymTable::default()
        };
        assert!(matches!(table.validate(), Err(Error::Config(_))));
    }
}
