//! spendtrack-ingest: CSV ingestion for bank exports — column mapping,
//! sign and date normalization, noise filtering — plus canonical
//! round-trippable export.

pub mod columns;
pub mod export;
pub mod pipeline;
pub mod profile;
pub mod sign;

pub use columns::{AmountColumns, ColumnLayout, Field, SynonymTable, resolve_layout};
pub use export::{CANONICAL_HEADERS, export_to_path, export_to_string, write_canonical_csv};
pub use pipeline::{BatchReport, FileFailure, IngestOutcome, Pipeline, RowDiagnostic};
pub use profile::{
    AmountShape, SignConvention, SourceProfile, canonical_profile, default_profiles,
};
pub use sign::{normalize_amount, parse_decimal};
