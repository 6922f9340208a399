//! Sign normalization: every source representation of an amount is
//! resolved into one signed value where positive means expense.

use csv::StringRecord;

use spendtrack_core::{Error, Result};

use crate::columns::AmountColumns;
use crate::profile::SignConvention;

/// Parse a money cell, tolerating `$`, thousands separators, and
/// `(...)` accounting negatives. An empty or non-numeric cell is an
/// `AmountParseError`, never a silent zero. `f64::from_str` accepts
/// `nan`/`inf`, which are not money; those are rejected too.
pub fn parse_decimal(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().trim_matches('"').replace([',', '$'], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(Error::AmountParse {
            value: raw.trim().to_string(),
        });
    }
    if let Some(inner) = cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Ok(-parse_finite(inner.trim(), raw)?);
    }
    parse_finite(cleaned, raw)
}

fn parse_finite(cleaned: &str, raw: &str) -> Result<f64> {
    let value: f64 = cleaned.parse().map_err(|_| Error::AmountParse {
        value: raw.trim().to_string(),
    })?;
    if !value.is_finite() {
        return Err(Error::AmountParse {
            value: raw.trim().to_string(),
        });
    }
    Ok(value)
}

fn cell<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("")
}

/// Resolve a row's amount columns into the canonical signed value.
///
/// Errors here are row-level value problems; the caller turns them
/// into diagnostics and keeps going.
pub fn normalize_amount(record: &StringRecord, amounts: &AmountColumns) -> Result<f64> {
    match amounts {
        AmountColumns::Signed { amount, convention } => {
            let value = parse_decimal(cell(record, *amount))?;
            Ok(match convention {
                SignConvention::PositiveExpense => value,
                SignConvention::NegativeExpense => -value,
            })
        }
        AmountColumns::DebitCredit { debit, credit } => {
            let debit_raw = cell(record, *debit);
            let credit_raw = cell(record, *credit);
            if debit_raw.trim().is_empty() && credit_raw.trim().is_empty() {
                return Err(Error::AmountParse {
                    value: "empty debit and credit".to_string(),
                });
            }
            // One empty side is a 0 magnitude, not an error.
            let debit = if debit_raw.trim().is_empty() {
                0.0
            } else {
                parse_decimal(debit_raw)?
            };
            let credit = if credit_raw.trim().is_empty() {
                0.0
            } else {
                parse_decimal(credit_raw)?
            };
            Ok(debit - credit)
        }
        AmountColumns::Typed {
            amount,
            txn_type,
            debit_marker,
            credit_marker,
        } => {
            let raw = cell(record, *amount);
            let marker = cell(record, *txn_type).trim();
            let magnitude = parse_decimal(raw)?.abs();
            if marker.eq_ignore_ascii_case(debit_marker) {
                Ok(magnitude)
            } else if marker.eq_ignore_ascii_case(credit_marker) {
                Ok(-magnitude)
            } else {
                Err(Error::AmountParse {
                    value: format!("{raw} (type '{marker}')"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_parse_decimal_tolerates_formatting() {
        assert_eq!(parse_decimal("1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_decimal("$50.00").unwrap(), 50.0);
        assert_eq!(parse_decimal("  -42.50  ").unwrap(), -42.5);
        assert_eq!(parse_decimal("(500.00)").unwrap(), -500.0);
        assert_eq!(parse_decimal("\"2,000.00\"").unwrap(), 2000.0);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage_and_empty() {
        assert!(matches!(
            parse_decimal("not_a_number"),
            Err(Error::AmountParse { .. })
        ));
        assert!(matches!(parse_decimal(""), Err(Error::AmountParse { .. })));
        assert!(matches!(parse_decimal("   "), Err(Error::AmountParse { .. })));
    }

    #[test]
    fn test_parse_decimal_rejects_non_finite_values() {
        // f64::from_str would happily produce NaN/inf, which then
        // count toward neither spend nor income.
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "(inf)"] {
            assert!(
                matches!(parse_decimal(raw), Err(Error::AmountParse { .. })),
                "{raw} should not parse as money"
            );
        }
    }

    #[test]
    fn test_signed_positive_expense_passes_through() {
        let amounts = AmountColumns::Signed {
            amount: 2,
            convention: SignConvention::PositiveExpense,
        };
        let value = normalize_amount(&record(&["05/02/2024", "X", "50.00"]), &amounts).unwrap();
        assert_eq!(value, 50.0);
    }

    #[test]
    fn test_signed_negative_expense_flips() {
        // Chase-style: purchases come in negative, credits positive.
        let amounts = AmountColumns::Signed {
            amount: 2,
            convention: SignConvention::NegativeExpense,
        };
        let spend = normalize_amount(&record(&["05/02/2024", "X", "-50.00"]), &amounts).unwrap();
        let credit = normalize_amount(&record(&["05/02/2024", "X", "25.00"]), &amounts).unwrap();
        assert_eq!(spend, 50.0);
        assert_eq!(credit, -25.0);
    }

    #[test]
    fn test_debit_credit_combines() {
        let amounts = AmountColumns::DebitCredit { debit: 2, credit: 3 };
        let spend =
            normalize_amount(&record(&["05/02/2024", "X", "17.82", ""]), &amounts).unwrap();
        let income =
            normalize_amount(&record(&["05/02/2024", "X", "", "1000.00"]), &amounts).unwrap();
        assert_eq!(spend, 17.82);
        assert_eq!(income, -1000.0);
    }

    #[test]
    fn test_debit_credit_both_empty_is_an_error() {
        let amounts = AmountColumns::DebitCredit { debit: 2, credit: 3 };
        let err = normalize_amount(&record(&["05/02/2024", "X", "", ""]), &amounts).unwrap_err();
        assert!(matches!(err, Error::AmountParse { .. }));
    }

    #[test]
    fn test_typed_amount_maps_markers() {
        let amounts = AmountColumns::Typed {
            amount: 2,
            txn_type: 3,
            debit_marker: "D".to_string(),
            credit_marker: "C".to_string(),
        };
        let spend = normalize_amount(&record(&["05/02/2024", "X", "9.99", "d"]), &amounts).unwrap();
        let income =
            normalize_amount(&record(&["05/02/2024", "X", "-120.00", "C"]), &amounts).unwrap();
        assert_eq!(spend, 9.99);
        assert_eq!(income, -120.0);
    }

    #[test]
    fn test_typed_amount_unknown_marker_is_an_error() {
        let amounts = AmountColumns::Typed {
            amount: 2,
            txn_type: 3,
            debit_marker: "D".to_string(),
            credit_marker: "C".to_string(),
        };
        let err = normalize_amount(&record(&["05/02/2024", "X", "9.99", "X"]), &amounts).unwrap_err();
        assert!(matches!(err, Error::AmountParse { .. }));
    }
}
