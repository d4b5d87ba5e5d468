//! Static region lookup tables: full name to postal code and back, plus an
//! optional population table for per-capita rates.
//!
//! Tables are loaded once per run and passed explicitly to whatever needs
//! them; nothing here is global.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::{read_file, ConfigError};

/// A lookup-table value: either a bare string or a list whose first element
/// is the canonical entry (`{"California": ["CA", "Calif."]}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableValue {
    Single(String),
    Many(Vec<String>),
}

impl TableValue {
    fn into_first(self) -> Option<String> {
        match self {
            TableValue::Single(s) => Some(s),
            TableValue::Many(v) => v.into_iter().next(),
        }
    }
}

/// Bidirectional region name / postal code lookup.
#[derive(Debug, Clone, Default)]
pub struct RegionLookup {
    /// Lower-cased full name to code.
    by_name: HashMap<String, String>,
    /// Code to display name.
    by_code: HashMap<String, String>,
}

impl RegionLookup {
    /// Builds a lookup from a name-to-code table and a code-to-name table.
    ///
    /// Codes are upper-cased and names are matched case-insensitively. Names
    /// from the code table are also accepted as full-name tokens.
    #[must_use]
    pub fn from_tables(names: HashMap<String, String>, codes: HashMap<String, String>) -> Self {
        let mut by_name = HashMap::with_capacity(names.len());
        let mut by_code = HashMap::with_capacity(codes.len());

        for (code, name) in codes {
            let code = code.trim().to_ascii_uppercase();
            by_name.insert(name.trim().to_lowercase(), code.clone());
            by_code.insert(code, name.trim().to_string());
        }
        for (name, code) in names {
            by_name.insert(name.trim().to_lowercase(), code.trim().to_ascii_uppercase());
        }

        Self { by_name, by_code }
    }

    /// Resolves a raw region token (postal code or full name) to its code.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&str> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let upper = token.to_ascii_uppercase();
        if let Some((code, _)) = self.by_code.get_key_value(&upper) {
            return Some(code.as_str());
        }
        self.by_name.get(&token.to_lowercase()).map(String::as_str)
    }

    /// Returns the display name for a code.
    #[must_use]
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(&code.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Number of known region codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Population by region code.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    by_code: HashMap<String, u64>,
}

impl PopulationTable {
    #[must_use]
    pub fn from_map(by_code: HashMap<String, u64>) -> Self {
        Self { by_code }
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<u64> {
        self.by_code.get(code).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
        path: path.display().to_string(),
        source: e,
    })
}

fn flatten_table(
    raw: HashMap<String, TableValue>,
    path: &Path,
) -> Result<HashMap<String, String>, ConfigError> {
    raw.into_iter()
        .map(|(key, value)| {
            value
                .into_first()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (key.clone(), v))
                .ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "{}: entry '{key}' has no value",
                        path.display()
                    ))
                })
        })
        .collect()
}

/// Load the two region lookup tables and validate that they agree.
///
/// # Errors
///
/// Returns `ConfigError` if either file cannot be read or parsed, if an
/// entry is empty, or if the name table points at a code that the code table
/// does not define.
pub fn load_region_lookup(names_path: &Path, codes_path: &Path) -> Result<RegionLookup, ConfigError> {
    let names = flatten_table(parse_json(names_path)?, names_path)?;
    let codes = flatten_table(parse_json(codes_path)?, codes_path)?;

    for (name, code) in &names {
        let known = codes
            .keys()
            .any(|c| c.trim().eq_ignore_ascii_case(code.trim()));
        if !known {
            return Err(ConfigError::Validation(format!(
                "region '{name}' maps to code '{code}', which is missing from {}",
                codes_path.display()
            )));
        }
    }

    Ok(RegionLookup::from_tables(names, codes))
}

/// Load a population table keyed by region name or code.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if a key
/// does not resolve through `lookup`.
pub fn load_population(path: &Path, lookup: &RegionLookup) -> Result<PopulationTable, ConfigError> {
    let raw: HashMap<String, u64> = parse_json(path)?;
    let mut by_code = HashMap::with_capacity(raw.len());
    for (key, population) in raw {
        let code = lookup.resolve(&key).ok_or_else(|| {
            ConfigError::Validation(format!(
                "{}: population entry '{key}' is not a known region",
                path.display()
            ))
        })?;
        by_code.insert(code.to_string(), population);
    }
    Ok(PopulationTable::from_map(by_code))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn sample_lookup() -> RegionLookup {
        let names = HashMap::from([
            ("California".to_string(), "CA".to_string()),
            ("New York".to_string(), "NY".to_string()),
        ]);
        let codes = HashMap::from([
            ("CA".to_string(), "California".to_string()),
            ("NY".to_string(), "New York".to_string()),
        ]);
        RegionLookup::from_tables(names, codes)
    }

    fn write_temp(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn resolve_accepts_codes_and_names() {
        let lookup = sample_lookup();
        assert_eq!(lookup.resolve("CA"), Some("CA"));
        assert_eq!(lookup.resolve("ca"), Some("CA"));
        assert_eq!(lookup.resolve("California"), Some("CA"));
        assert_eq!(lookup.resolve("new york"), Some("NY"));
    }

    #[test]
    fn resolve_rejects_unknown_tokens() {
        let lookup = sample_lookup();
        assert_eq!(lookup.resolve("Fooland"), None);
        assert_eq!(lookup.resolve(""), None);
        assert_eq!(lookup.resolve("ZZ"), None);
    }

    #[test]
    fn name_of_returns_display_name() {
        let lookup = sample_lookup();
        assert_eq!(lookup.name_of("ny"), Some("New York"));
        assert_eq!(lookup.name_of("TX"), None);
    }

    #[test]
    fn load_region_lookup_accepts_list_values() {
        let dir = tempfile::tempdir().unwrap();
        let names = write_temp(&dir, "names.json", r#"{"California": ["CA", "Calif."]}"#);
        let codes = write_temp(&dir, "codes.json", r#"{"CA": "California"}"#);
        let lookup = load_region_lookup(&names, &codes).unwrap();
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.resolve("California"), Some("CA"));
    }

    #[test]
    fn load_region_lookup_rejects_dangling_code() {
        let dir = tempfile::tempdir().unwrap();
        let names = write_temp(&dir, "names.json", r#"{"Texas": "TX"}"#);
        let codes = write_temp(&dir, "codes.json", r#"{"CA": "California"}"#);
        let err = load_region_lookup(&names, &codes).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("TX")));
    }

    #[test]
    fn load_region_lookup_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let names = write_temp(&dir, "names.json", r#"{"California": []}"#);
        let codes = write_temp(&dir, "codes.json", r#"{"CA": "California"}"#);
        let err = load_region_lookup(&names, &codes).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn load_region_lookup_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let codes = write_temp(&dir, "codes.json", r#"{"CA": "California"}"#);
        let err = load_region_lookup(&dir.path().join("absent.json"), &codes).unwrap_err();
        assert!(matches!(err, ConfigError::FileIo { .. }));
    }

    #[test]
    fn load_population_resolves_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "pop.json", r#"{"California": 39512223, "NY": 19453561}"#);
        let table = load_population(&path, &sample_lookup()).unwrap();
        assert_eq!(table.get("CA"), Some(39_512_223));
        assert_eq!(table.get("NY"), Some(19_453_561));
    }

    #[test]
    fn load_population_rejects_unknown_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "pop.json", r#"{"Fooland": 10}"#);
        let err = load_population(&path, &sample_lookup()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("Fooland")));
    }

    #[test]
    fn load_region_lookup_from_shipped_tables() {
        let config_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config");
        let lookup = load_region_lookup(
            &config_dir.join("fullNameStateDict.json"),
            &config_dir.join("statesDict.json"),
        )
        .expect("failed to load shipped region tables");
        assert!(lookup.len() >= 51);
        assert_eq!(lookup.resolve("District of Columbia"), Some("DC"));
        assert_eq!(lookup.resolve("pr"), Some("PR"));
        assert_eq!(lookup.name_of("TX"), Some("Texas"));
    }
}
