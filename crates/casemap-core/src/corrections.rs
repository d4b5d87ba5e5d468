//! Analyst-maintained anomaly corrections.
//!
//! Each entry adjusts one date for one scope (the national total or a single
//! region). The table is loaded from YAML and validated so that every
//! no two entries for the same date and scope can apply to the same source.
//! An entry without a `source` applies to every source.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::observations::SourceKind;
use crate::{read_file, ConfigError};

/// What a correction applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrectionScope {
    National,
    Region(String),
}

impl std::str::FromStr for CorrectionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("national") || trimmed.eq_ignore_ascii_case("us") {
            return Ok(CorrectionScope::National);
        }
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Ok(CorrectionScope::Region(trimmed.to_ascii_uppercase()));
        }
        Err(format!(
            "invalid scope '{trimmed}'; expected 'national' or a two-letter region code"
        ))
    }
}

impl TryFrom<String> for CorrectionScope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for CorrectionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionScope::National => f.write_str("national"),
            CorrectionScope::Region(code) => f.write_str(code),
        }
    }
}

/// How a correction changes the reported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Add to the reported value.
    Delta(i64),
    /// Replace the reported value outright.
    SetTo(i64),
}

impl Adjustment {
    #[must_use]
    pub fn apply(self, value: i64) -> i64 {
        match self {
            Adjustment::Delta(delta) => value + delta,
            Adjustment::SetTo(replacement) => replacement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyCorrection {
    pub date: NaiveDate,
    pub scope: CorrectionScope,
    pub adjustment: Adjustment,
    /// Restricts the correction to one source; `None` applies to all.
    pub source: Option<SourceKind>,
    pub note: Option<String>,
}

impl AnomalyCorrection {
    #[must_use]
    pub fn applies_to(&self, source: SourceKind) -> bool {
        self.source.is_none_or(|s| s == source)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CorrectionEntry {
    date: NaiveDate,
    #[serde(deserialize_with = "deserialize_scope")]
    scope: CorrectionScope,
    delta: Option<i64>,
    set_to: Option<i64>,
    source: Option<SourceKind>,
    note: Option<String>,
}

fn deserialize_scope<'de, D>(deserializer: D) -> Result<CorrectionScope, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    CorrectionScope::try_from(raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
struct CorrectionsFile {
    #[serde(default)]
    corrections: Vec<CorrectionEntry>,
}

/// Load and validate the corrections table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_corrections(path: &Path) -> Result<Vec<AnomalyCorrection>, ConfigError> {
    let content = read_file(path)?;
    parse_corrections(&content)
}

/// Parse and validate a corrections table from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::YamlParse`] on malformed YAML and
/// [`ConfigError::Validation`] when an entry sets both or neither of
/// `delta` / `set_to`, or when two entries for the same date and scope
/// overlap on source (an entry without `source` overlaps every other).
pub fn parse_corrections(yaml: &str) -> Result<Vec<AnomalyCorrection>, ConfigError> {
    let file: CorrectionsFile = serde_yaml::from_str(yaml)?;
    let mut seen: HashMap<(NaiveDate, CorrectionScope), Vec<Option<SourceKind>>> = HashMap::new();
    let mut out = Vec::with_capacity(file.corrections.len());

    for entry in file.corrections {
        let adjustment = match (entry.delta, entry.set_to) {
            (Some(delta), None) => Adjustment::Delta(delta),
            (None, Some(value)) => Adjustment::SetTo(value),
            (Some(_), Some(_)) => {
                return Err(ConfigError::Validation(format!(
                    "correction for {} ({}) sets both delta and set_to",
                    entry.date, entry.scope
                )));
            }
            (None, None) => {
                return Err(ConfigError::Validation(format!(
                    "correction for {} ({}) needs one of delta or set_to",
                    entry.date, entry.scope
                )));
            }
        };

        let sources = seen.entry((entry.date, entry.scope.clone())).or_default();
        if sources
            .iter()
            .any(|s| s.is_none() || entry.source.is_none() || *s == entry.source)
        {
            return Err(ConfigError::Validation(format!(
                "duplicate correction for {} ({}): sources overlap",
                entry.date, entry.scope
            )));
        }
        sources.push(entry.source);

        out.push(AnomalyCorrection {
            date: entry.date,
            scope: entry.scope,
            adjustment,
            source: entry.source,
            note: entry.note,
        });
    }

    Ok(out)
}

#[cfg(test)]
#[path = "corrections_test.rs"]
mod tests;
