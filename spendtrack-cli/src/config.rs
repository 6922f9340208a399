use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use spendtrack_core::{CategoryGrouper, CategoryRule, DEFAULT_NOISE_PHRASES, NoiseFilter, default_rules};
use spendtrack_ingest::{Pipeline, SourceProfile, SynonymTable, default_profiles};

/// TOML configuration. Every table has a default, so a missing file or
/// a partial one reproduces the stock Chase + Capital One setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[[source]]` — one per account/export format.
    pub source: Vec<SourceProfile>,
    /// `[columns]` — header synonym overrides.
    pub columns: SynonymTable,
    pub noise: NoiseSection,
    /// `[[category_rule]]`
    pub category_rule: Vec<CategoryRule>,
    pub budget: BudgetSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSection {
    pub phrases: Vec<String>,
}

impl Default for NoiseSection {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_NOISE_PHRASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSection {
    /// Default `--limit` for the budget subcommand.
    pub monthly_limit: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_profiles(),
            columns: SynonymTable::default(),
            noise: NoiseSection::default(),
            category_rule: default_rules(),
            budget: BudgetSection::default(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        None => Config::default(),
        Some(p) => {
            let text =
                fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
            toml::from_str(&text).with_context(|| format!("parse {}", p.display()))?
        }
    };
    // Invalid configuration is fatal, not per-file.
    for profile in &config.source {
        profile.validate()?;
    }
    Ok(config)
}

impl Config {
    pub fn pipeline(&self) -> Result<Pipeline> {
        let noise = NoiseFilter::new(self.noise.phrases.iter().cloned())?;
        let grouper = CategoryGrouper::new(self.category_rule.iter().cloned())?;
        Ok(Pipeline::new(self.columns.clone(), noise, grouper)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendtrack_ingest::AmountShape;
    use std::io::Write;

    #[test]
    fn test_missing_config_file_means_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.source.len(), 2);
        assert_eq!(config.source[0].tag, "Chase");
        assert!(config.budget.monthly_limit.is_none());
        config.pipeline().unwrap();
    }

    #[test]
    fn test_partial_config_keeps_unnamed_defaults() {
        let toml_text = r#"
            [budget]
            monthly_limit = 2000.0
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.budget.monthly_limit, Some(2000.0));
        assert_eq!(config.source.len(), 2);
        assert!(!config.noise.phrases.is_empty());
    }

    #[test]
    fn test_full_config_round_trips_through_toml() {
        let toml_text = r#"
            [[source]]
            tag = "Chase"
            shape = "signed"
            convention = "negative_expense"

            [[source]]
            tag = "BofA"
            shape = "typed_amount"
            debit_marker = "DEBIT"
            credit_marker = "CREDIT"

            [noise]
            phrases = ["autopay pymt", "balance transfer"]

            [[category_rule]]
            pattern = "Groceries"
            group = "Groceries"

            [[category_rule]]
            pattern = "uber"
            match = "contains"
            group = "Auto & Travel"

            [budget]
            monthly_limit = 1500.0
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.source[1].tag, "BofA");
        assert!(matches!(config.source[1].amount, AmountShape::TypedAmount { .. }));
        assert_eq!(config.category_rule.len(), 2);
        config.pipeline().unwrap();
    }

    #[test]
    fn test_blank_source_tag_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[[source]]\ntag = \"  \"\nshape = \"debit_credit\"\n"
        )
        .unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_malformed_toml_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[source\ntag=").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
