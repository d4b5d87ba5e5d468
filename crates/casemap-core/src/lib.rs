mod app_config;
mod config;
pub mod corrections;
pub mod observations;
pub mod regions;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use corrections::{
    load_corrections, parse_corrections, Adjustment, AnomalyCorrection, CorrectionScope,
};
pub use observations::{
    DailyCount, NationalPoint, NormalizedObservation, PercentChange, RegionMetric, SourceKind,
    ValueKind,
};
pub use regions::{load_population, load_region_lookup, PopulationTable, RegionLookup};

use thiserror::Error;

/// Errors raised while loading configuration and the static tables a run
/// depends on.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    JsonParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse corrections YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Reads a file into a string, attaching the path to any I/O failure.
pub(crate) fn read_file(path: &std::path::Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })
}
