//! The row-level ingestion pipeline: column mapping, date and sign
//! normalization, noise filtering, and category grouping, with
//! partial-failure semantics — bad rows become diagnostics, a bad file
//! sinks only itself, and the rest of the batch proceeds.

use std::fmt;
use std::path::Path;

use csv::ReaderBuilder;

use spendtrack_core::{CategoryGrouper, Error, NewTransaction, NoiseFilter, Result, default_rules};

use crate::columns::{ColumnLayout, Field, SynonymTable, resolve_layout};
use crate::profile::{SourceProfile, canonical_profile};
use crate::sign::normalize_amount;

/// Date formats accepted across the bank exports we ingest, tried in
/// order. Canonical exports use the first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y"];

fn parse_date(raw: &str) -> Result<chrono::NaiveDate> {
    let raw = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    Err(Error::DateParse {
        value: raw.to_string(),
    })
}

/// One skipped row, with enough context to point the user at it.
#[derive(Debug)]
pub struct RowDiagnostic {
    pub file: String,
    /// 1-based physical record index within the file.
    pub row: usize,
    pub error: Error,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}: {}", self.file, self.row, self.error)
    }
}

/// Result of ingesting one file: the surviving normalized rows plus
/// everything that was skipped and why.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub rows: Vec<NewTransaction>,
    pub skipped: Vec<RowDiagnostic>,
    /// Payment/reversal rows dropped by the noise filter. These are
    /// intentional drops, not errors, but worth reporting.
    pub noise_dropped: usize,
}

/// A file that could not be ingested at all (unreadable, or no usable
/// columns).
#[derive(Debug)]
pub struct FileFailure {
    pub file: String,
    pub error: Error,
}

/// Combined outcome of a multi-file batch. One failing file never
/// aborts the others.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rows: Vec<NewTransaction>,
    pub skipped: Vec<RowDiagnostic>,
    pub noise_dropped: usize,
    pub failed_files: Vec<FileFailure>,
}

/// The normalization pipeline. All classification inputs (synonym
/// table, noise phrases, category rules) are configuration; the
/// pipeline itself has no per-bank branches.
pub struct Pipeline {
    synonyms: SynonymTable,
    noise: NoiseFilter,
    grouper: CategoryGrouper,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            SynonymTable::default(),
            NoiseFilter::default(),
            CategoryGrouper::new(default_rules()).expect("default rules are valid"),
        )
        .expect("default synonym table is valid")
    }
}

impl Pipeline {
    pub fn new(
        synonyms: SynonymTable,
        noise: NoiseFilter,
        grouper: CategoryGrouper,
    ) -> Result<Self> {
        synonyms.validate()?;
        Ok(Self {
            synonyms,
            noise,
            grouper,
        })
    }

    /// Ingest one file's text under the given source profile.
    ///
    /// Preamble lines above the header are skipped; the header is the
    /// first record with a date-bearing column. Row-level parse
    /// failures become diagnostics; a file with no usable header is a
    /// `SchemaError`.
    pub fn ingest_str(
        &self,
        text: &str,
        profile: &SourceProfile,
        file_label: &str,
    ) -> Result<IngestOutcome> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut layout: Option<ColumnLayout> = None;
        let mut outcome = IngestOutcome::default();

        for (index, result) in reader.records().enumerate() {
            let row = index + 1;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    outcome.skipped.push(RowDiagnostic {
                        file: file_label.to_string(),
                        row,
                        error: Error::Read {
                            file: file_label.to_string(),
                            message: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            let resolved = match &layout {
                Some(resolved) => resolved,
                None => {
                    let headers: Vec<String> = record.iter().map(str::to_string).collect();
                    if self.synonyms.looks_like_header(&headers) {
                        layout = Some(resolve_layout(
                            &headers,
                            &self.synonyms,
                            &profile.amount,
                            file_label,
                        )?);
                    }
                    continue;
                }
            };

            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let date_raw = record.get(resolved.date).unwrap_or("");
            let date = match parse_date(date_raw) {
                Ok(date) => date,
                Err(error) => {
                    tracing::debug!(file = file_label, row, %error, "row skipped");
                    outcome.skipped.push(RowDiagnostic {
                        file: file_label.to_string(),
                        row,
                        error,
                    });
                    continue;
                }
            };

            let amount = match normalize_amount(&record, &resolved.amounts) {
                Ok(amount) => amount,
                Err(error) => {
                    tracing::debug!(file = file_label, row, %error, "row skipped");
                    outcome.skipped.push(RowDiagnostic {
                        file: file_label.to_string(),
                        row,
                        error,
                    });
                    continue;
                }
            };

            let description = record
                .get(resolved.description)
                .unwrap_or("")
                .trim()
                .to_string();

            if self.noise.is_noise(&description) {
                tracing::debug!(file = file_label, row, description, "noise row dropped");
                outcome.noise_dropped += 1;
                continue;
            }

            let raw_category = resolved
                .category
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            // Canonical re-imports carry their grouped category along;
            // everything else goes through the rule table.
            let grouped_category = resolved
                .grouped_category
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.grouper.group(raw_category.as_deref(), &description));

            let source_tag = resolved
                .source_tag
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| profile.tag.clone());

            let excluded = resolved
                .excluded
                .and_then(|i| record.get(i))
                .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"))
                .unwrap_or(false);

            outcome.rows.push(NewTransaction {
                date,
                description,
                amount,
                raw_category,
                grouped_category,
                source_tag,
                excluded,
            });
        }

        if layout.is_none() {
            return Err(Error::Schema {
                file: file_label.to_string(),
                column: "date".to_string(),
            });
        }

        Ok(outcome)
    }

    pub fn ingest_path(&self, path: &Path, profile: &SourceProfile) -> Result<IngestOutcome> {
        let file_label = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Read {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.ingest_str(&text, profile, &file_label)
    }

    /// Ingest several files, each under its own profile. Failures are
    /// per-file; everything that parsed is returned.
    pub fn ingest_batch<'a>(
        &self,
        inputs: impl IntoIterator<Item = (&'a Path, &'a SourceProfile)>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (path, profile) in inputs {
            match self.ingest_path(path, profile) {
                Ok(outcome) => {
                    report.rows.extend(outcome.rows);
                    report.skipped.extend(outcome.skipped);
                    report.noise_dropped += outcome.noise_dropped;
                }
                Err(error) => {
                    tracing::warn!(file = %path.display(), %error, "file skipped");
                    report.failed_files.push(FileFailure {
                        file: path.display().to_string(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Pick which configured source a file belongs to.
    ///
    /// Our own canonical exports are recognized first, by the columns
    /// no bank file carries (`Grouped Category`, `Source Tag`,
    /// `Excluded`); letting a bank profile claim an export would apply
    /// the wrong sign convention to every row. Otherwise the first
    /// profile (in configuration order) whose required columns all
    /// resolve against some header row claims the file.
    pub fn detect_profile(
        &self,
        text: &str,
        profiles: &[SourceProfile],
    ) -> Option<SourceProfile> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let candidate_rows: Vec<Vec<String>> = reader
            .records()
            .take(100)
            .filter_map(|r| r.ok())
            .map(|record| record.iter().map(str::to_string).collect::<Vec<String>>())
            .filter(|headers| self.synonyms.looks_like_header(headers))
            .collect();

        let canonical = canonical_profile();
        if candidate_rows.iter().any(|headers| {
            self.synonyms.find(headers, Field::GroupedCategory).is_some()
                && self.synonyms.find(headers, Field::SourceTag).is_some()
                && self.synonyms.find(headers, Field::Excluded).is_some()
                && resolve_layout(headers, &self.synonyms, &canonical.amount, "<detect>").is_ok()
        }) {
            return Some(canonical);
        }

        profiles
            .iter()
            .find(|profile| {
                candidate_rows.iter().any(|headers| {
                    resolve_layout(headers, &self.synonyms, &profile.amount, "<detect>").is_ok()
                })
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{canonical_profile, default_profiles};
    use chrono::NaiveDate;

    const CHASE_CSV: &str = "\
Transaction Date,Description,Category,Amount
05/02/2024,WHOLEFDS MKT 10245,Groceries,-54.12
05/03/2024,AUTOPAY PYMT - THANK YOU,,-230.00
05/07/2024,CHIPOTLE 1290,Food & Drink,-17.82
05/10/2024,REFUND ACME STORE,Shopping,12.00
";

    const CAPONE_CSV: &str = "\
Transaction Date,Posted Date,Description,Category,Debit,Credit
2024-05-04,2024-05-05,WALMART GROCERY,Groceries,23.50,
2024-05-15,2024-05-15,PAYROLL ACME INC,,,1000.00
2024-05-20,2024-05-21,oops,Groceries,not-a-number,
";

    fn pipeline() -> Pipeline {
        Pipeline::default()
    }

    fn chase() -> SourceProfile {
        default_profiles().remove(0)
    }

    fn capital_one() -> SourceProfile {
        default_profiles().remove(1)
    }

    #[test]
    fn test_chase_rows_normalize_with_flipped_sign() {
        let outcome = pipeline().ingest_str(CHASE_CSV, &chase(), "chase.csv").unwrap();
        assert_eq!(outcome.rows.len(), 3);

        let groceries = &outcome.rows[0];
        assert_eq!(groceries.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(groceries.amount, 54.12);
        assert_eq!(groceries.grouped_category, "Groceries");
        assert_eq!(groceries.source_tag, "Chase");

        // A Chase refund (positive in the export) becomes income.
        let refund = &outcome.rows[2];
        assert_eq!(refund.amount, -12.00);
    }

    #[test]
    fn test_autopay_row_is_dropped_as_noise() {
        let outcome = pipeline().ingest_str(CHASE_CSV, &chase(), "chase.csv").unwrap();
        assert_eq!(outcome.noise_dropped, 1);
        assert!(outcome.rows.iter().all(|r| !r.description.contains("AUTOPAY")));
        // Noise drops are not diagnostics.
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_debit_credit_source_and_row_diagnostics() {
        let outcome = pipeline()
            .ingest_str(CAPONE_CSV, &capital_one(), "capone.csv")
            .unwrap();
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].amount, 23.50);
        assert_eq!(outcome.rows[1].amount, -1000.0);
        assert_eq!(outcome.rows[1].grouped_category, "Uncategorized");

        assert_eq!(outcome.skipped.len(), 1);
        let diag = &outcome.skipped[0];
        assert_eq!(diag.file, "capone.csv");
        assert_eq!(diag.row, 4);
        assert!(matches!(diag.error, Error::AmountParse { .. }));
    }

    #[test]
    fn test_bad_dates_are_diagnostics_not_aborts() {
        let csv = "\
Transaction Date,Description,Category,Amount
not-a-date,SOMETHING,Groceries,-10.00
05/02/2024,KROGER,Groceries,-20.00
";
        let outcome = pipeline().ingest_str(csv, &chase(), "x.csv").unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(outcome.skipped[0].error, Error::DateParse { .. }));
    }

    #[test]
    fn test_preamble_lines_above_header_are_skipped() {
        let csv = "\
Account Name: Everyday Checking
Account Number: ****1234

Transaction Date,Description,Category,Amount
05/02/2024,KROGER,Groceries,-20.00
";
        let outcome = pipeline().ingest_str(csv, &chase(), "x.csv").unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_file_without_usable_header_is_schema_error() {
        let csv = "Payee,Total\nKROGER,20.00\n";
        let err = pipeline().ingest_str(csv, &chase(), "weird.csv").unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_missing_amount_column_for_profile_is_schema_error() {
        // Header resolves a date but the Chase profile needs an Amount column.
        let err = pipeline()
            .ingest_str(CAPONE_CSV, &chase(), "capone.csv")
            .unwrap_err();
        assert!(matches!(err, Error::Schema { ref column, .. } if column == "amount"));
    }

    #[test]
    fn test_empty_description_survives_and_is_not_noise() {
        let csv = "\
Transaction Date,Description,Category,Amount
05/02/2024,,Groceries,-20.00
";
        let outcome = pipeline().ingest_str(csv, &chase(), "x.csv").unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].description, "");
    }

    #[test]
    fn test_detect_profile_prefers_matching_shape() {
        let p = pipeline();
        let profiles = default_profiles();
        let chase_hit = p.detect_profile(CHASE_CSV, &profiles).unwrap();
        assert_eq!(chase_hit.tag, "Chase");
        let capone_hit = p.detect_profile(CAPONE_CSV, &profiles).unwrap();
        assert_eq!(capone_hit.tag, "Capital One");
        assert!(p.detect_profile("Payee,Total\n", &profiles).is_none());
    }

    #[test]
    fn test_detect_profile_recognizes_canonical_exports() {
        // A canonical export's header also contains "Amount", so a
        // signed bank profile would claim it and flip every sign; the
        // export-only columns must win.
        let canonical = "\
Date,Description,Amount,Raw Category,Grouped Category,Source Tag,Excluded
2024-05-02,WHOLEFDS MKT 10245,54.12,Groceries,Groceries,Chase,false
";
        let p = pipeline();
        let hit = p.detect_profile(canonical, &default_profiles()).unwrap();
        assert_eq!(hit.tag, "import");
        assert!(matches!(
            hit.amount,
            crate::profile::AmountShape::Signed {
                convention: crate::profile::SignConvention::PositiveExpense
            }
        ));

        let outcome = p.ingest_str(canonical, &hit, "export.csv").unwrap();
        assert_eq!(outcome.rows[0].amount, 54.12);
        assert_eq!(outcome.rows[0].source_tag, "Chase");
    }

    #[test]
    fn test_ingest_batch_sinks_only_the_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("chase.csv");
        let bad = dir.path().join("missing.csv");
        std::fs::write(&good, CHASE_CSV).unwrap();

        let chase_profile = chase();
        let inputs = [
            (good.as_path(), &chase_profile),
            (bad.as_path(), &chase_profile),
        ];
        let report = pipeline().ingest_batch(inputs);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.failed_files.len(), 1);
        assert!(matches!(report.failed_files[0].error, Error::Read { .. }));
    }

    #[test]
    fn test_normalization_is_idempotent_on_canonical_rows() {
        // Already-canonical rows pass through the full pipeline unchanged.
        let canonical = "\
Date,Description,Amount,Raw Category,Grouped Category,Source Tag,Excluded
2024-05-02,WHOLEFDS MKT 10245,54.12,Groceries,Groceries,Chase,false
2024-05-15,PAYROLL ACME INC,-1000.00,,Uncategorized,Capital One,true
";
        let p = pipeline();
        let profile = canonical_profile();
        let first = p.ingest_str(canonical, &profile, "export.csv").unwrap();
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.rows[0].source_tag, "Chase");
        assert_eq!(first.rows[1].source_tag, "Capital One");
        assert!(first.rows[1].excluded);

        // Second pass over the same canonical text is identical.
        let second = p.ingest_str(canonical, &profile, "export.csv").unwrap();
        assert_eq!(first.rows, second.rows);
    }
}
