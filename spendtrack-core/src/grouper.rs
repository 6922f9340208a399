//! Maps raw source categories (and descriptions) onto the small set of
//! grouped categories used for reporting.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transaction::UNCATEGORIZED;

/// How a rule's pattern is applied to the candidate text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Exact,
    Prefix,
    Contains,
    Regex,
}

/// One mapping rule: `pattern` (under `match_kind`) sends the row to
/// `group`. This is the serde-facing shape configuration files use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: String,
    #[serde(default, rename = "match")]
    pub match_kind: MatchKind,
    pub group: String,
}

impl CategoryRule {
    pub fn exact(pattern: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_kind: MatchKind::Exact,
            group: group.into(),
        }
    }

    pub fn contains(pattern: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_kind: MatchKind::Contains,
            group: group.into(),
        }
    }
}

#[derive(Debug)]
enum Matcher {
    Exact(String),
    Prefix(String),
    Contains(String),
    Regex(Regex),
}

#[derive(Debug)]
struct CompiledRule {
    matcher: Matcher,
    group: String,
}

impl CompiledRule {
    fn matches(&self, text: &str, lowered: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(p) => lowered == p,
            Matcher::Prefix(p) => lowered.starts_with(p.as_str()),
            Matcher::Contains(p) => lowered.contains(p.as_str()),
            Matcher::Regex(re) => re.is_match(text),
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self.matcher, Matcher::Exact(_))
    }
}

/// Table-driven categorizer. Lookup is case-insensitive and
/// first-match-wins over the configured order, with exact rules always
/// taking priority over prefix/contains/regex rules so ambiguous
/// patterns resolve deterministically.
#[derive(Debug)]
pub struct CategoryGrouper {
    rules: Vec<CompiledRule>,
}

impl CategoryGrouper {
    pub fn new(rules: impl IntoIterator<Item = CategoryRule>) -> Result<Self> {
        let mut compiled = Vec::new();
        for rule in rules {
            let pattern = rule.pattern.trim();
            if pattern.is_empty() {
                return Err(Error::Config(
                    "category rule has a blank pattern".to_string(),
                ));
            }
            if rule.group.trim().is_empty() {
                return Err(Error::Config(format!(
                    "category rule '{pattern}' has a blank target group"
                )));
            }
            let matcher = match rule.match_kind {
                MatchKind::Exact => Matcher::Exact(pattern.to_lowercase()),
                MatchKind::Prefix => Matcher::Prefix(pattern.to_lowercase()),
                MatchKind::Contains => Matcher::Contains(pattern.to_lowercase()),
                MatchKind::Regex => {
                    let re = RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            Error::Config(format!("invalid category rule regex '{pattern}': {e}"))
                        })?;
                    Matcher::Regex(re)
                }
            };
            compiled.push(CompiledRule {
                matcher,
                group: rule.group.trim().to_string(),
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Resolve a grouped category for a row. The raw source category is
    /// consulted first, then the description; unmapped rows fall back
    /// to [`UNCATEGORIZED`] rather than failing, so categorization can
    /// never block ingestion.
    pub fn group(&self, raw_category: Option<&str>, description: &str) -> String {
        if let Some(raw) = raw_category {
            if let Some(group) = self.lookup(raw) {
                return group;
            }
        }
        if let Some(group) = self.lookup(description) {
            return group;
        }
        UNCATEGORIZED.to_string()
    }

    fn lookup(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        for rule in self.rules.iter().filter(|r| r.is_exact()) {
            if rule.matches(text, &lowered) {
                return Some(rule.group.clone());
            }
        }
        for rule in self.rules.iter().filter(|r| !r.is_exact()) {
            if rule.matches(text, &lowered) {
                return Some(rule.group.clone());
            }
        }
        None
    }
}

/// The mapping the original spending tracker shipped with: raw
/// bank-provided labels onto six reporting buckets.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::exact("Groceries", "Groceries"),
        CategoryRule::exact("Food & Drink", "Dining Out"),
        CategoryRule::exact("Dining", "Dining Out"),
        CategoryRule::exact("Shopping", "Shopping"),
        CategoryRule::exact("Merchandise", "Shopping"),
        CategoryRule::exact("Personal", "Personal/Health"),
        CategoryRule::exact("Health & Wellness", "Personal/Health"),
        CategoryRule::exact("Education", "Personal/Health"),
        CategoryRule::exact("Insurance", "Bills & Utilities"),
        CategoryRule::exact("Internet", "Bills & Utilities"),
        CategoryRule::exact("Gas", "Auto & Travel"),
        CategoryRule::exact("Automotive", "Auto & Travel"),
        CategoryRule::exact("Travel", "Auto & Travel"),
    ]
}
