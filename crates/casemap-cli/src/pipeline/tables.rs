//! Loading of the read-only tables every run depends on.

use std::path::Path;

use casemap_core::{AnomalyCorrection, AppConfig, PopulationTable, RegionLookup};
use serde_json::Value;

/// Static inputs for a run, loaded once before any fetch.
#[derive(Debug)]
pub(crate) struct StaticTables {
    pub lookup: RegionLookup,
    pub corrections: Vec<AnomalyCorrection>,
    pub population: Option<PopulationTable>,
    pub boundary: Value,
}

/// Loads the region tables, corrections, optional population table, and the
/// boundary document named by `config`.
///
/// # Errors
///
/// Returns an error if any configured file is missing or malformed. A
/// missing population file is an error only when a path is configured.
pub(crate) fn load_static_tables(config: &AppConfig) -> anyhow::Result<StaticTables> {
    let lookup =
        casemap_core::load_region_lookup(&config.region_names_path, &config.region_codes_path)?;
    let corrections = casemap_core::load_corrections(&config.corrections_path)?;
    let population = config
        .population_path
        .as_deref()
        .map(|path| casemap_core::load_population(path, &lookup))
        .transpose()?;
    let boundary = load_boundary(&config.boundary_path)?;

    tracing::info!(
        regions = lookup.len(),
        corrections = corrections.len(),
        population = population.as_ref().map_or(0, PopulationTable::len),
        "loaded static tables"
    );

    Ok(StaticTables {
        lookup,
        corrections,
        population,
        boundary,
    })
}

/// Reads the boundary document as untyped JSON.
fn load_boundary(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read boundary file {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("boundary file {} is not valid JSON: {e}", path.display()))
}
