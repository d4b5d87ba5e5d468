use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_CTP_URL: &str = "https://covidtracking.com/api/v1/states/daily.json";
const DEFAULT_JHU_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_US.csv";
const DEFAULT_CDC_URL: &str = "https://data.cdc.gov/resource/9mfq-cb36.json";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if any value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development configuration.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let non_empty = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let env = parse_environment(&or_default("CASEMAP_ENV", "development"))?;
    let log_level = or_default("CASEMAP_LOG_LEVEL", "info");

    let data_dir = PathBuf::from(or_default("CASEMAP_DATA_DIR", "./data"));
    let region_names_path = PathBuf::from(or_default(
        "CASEMAP_REGION_NAMES_PATH",
        "./config/fullNameStateDict.json",
    ));
    let region_codes_path = PathBuf::from(or_default(
        "CASEMAP_REGION_CODES_PATH",
        "./config/statesDict.json",
    ));
    let boundary_path = PathBuf::from(or_default(
        "CASEMAP_BOUNDARY_PATH",
        "./config/states.topo.json",
    ));
    let boundary_key = or_default("CASEMAP_BOUNDARY_KEY", "st");
    if boundary_key.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "CASEMAP_BOUNDARY_KEY".to_string(),
            reason: "must be non-empty".to_string(),
        });
    }
    let population_path = non_empty("CASEMAP_POPULATION_PATH").map(PathBuf::from);
    let corrections_path = PathBuf::from(or_default(
        "CASEMAP_CORRECTIONS_PATH",
        "./config/corrections.yaml",
    ));

    let request_timeout_secs = parse_u64("CASEMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CASEMAP_USER_AGENT", "casemap/0.1 (case-trends)");

    let ctp_url = or_default("CASEMAP_CTP_URL", DEFAULT_CTP_URL);
    let jhu_url = or_default("CASEMAP_JHU_URL", DEFAULT_JHU_URL);
    let cdc_url = or_default("CASEMAP_CDC_URL", DEFAULT_CDC_URL);
    let cdc_app_token = non_empty("CASEMAP_CDC_APP_TOKEN");
    let cdc_row_limit = parse_u32("CASEMAP_CDC_ROW_LIMIT", "5000")?;

    Ok(AppConfig {
        env,
        log_level,
        data_dir,
        region_names_path,
        region_codes_path,
        boundary_path,
        boundary_key,
        population_path,
        corrections_path,
        request_timeout_secs,
        user_agent,
        ctp_url,
        jhu_url,
        cdc_url,
        cdc_app_token,
        cdc_row_limit,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CASEMAP_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
