use std::path::PathBuf;

use crate::observations::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Directory the three JSON artifacts (and the optional QA CSV) land in.
    pub data_dir: PathBuf,
    pub region_names_path: PathBuf,
    pub region_codes_path: PathBuf,
    pub boundary_path: PathBuf,
    /// Feature property holding the two-letter region code, e.g. `st`.
    pub boundary_key: String,
    pub population_path: Option<PathBuf>,
    pub corrections_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub ctp_url: String,
    pub jhu_url: String,
    pub cdc_url: String,
    pub cdc_app_token: Option<String>,
    pub cdc_row_limit: u32,
}

impl AppConfig {
    /// Returns the configured endpoint for a source.
    #[must_use]
    pub fn source_url(&self, source: SourceKind) -> &str {
        match source {
            SourceKind::Ctp => &self.ctp_url,
            SourceKind::Jhu => &self.jhu_url,
            SourceKind::Cdc => &self.cdc_url,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("region_names_path", &self.region_names_path)
            .field("region_codes_path", &self.region_codes_path)
            .field("boundary_path", &self.boundary_path)
            .field("boundary_key", &self.boundary_key)
            .field("population_path", &self.population_path)
            .field("corrections_path", &self.corrections_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("ctp_url", &self.ctp_url)
            .field("jhu_url", &self.jhu_url)
            .field("cdc_url", &self.cdc_url)
            .field(
                "cdc_app_token",
                &self.cdc_app_token.as_ref().map(|_| "[redacted]"),
            )
            .field("cdc_row_limit", &self.cdc_row_limit)
            .finish()
    }
}
