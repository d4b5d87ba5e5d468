//! `check`: load every static table and report what a run would see.

use casemap_core::{AppConfig, RegionLookup};

use crate::pipeline::load_static_tables;

/// Loads config-named tables and prints a short report.
///
/// Boundary features whose code the lookup does not know are listed but do
/// not fail the check; they simply never receive metrics.
///
/// # Errors
///
/// Returns an error if any table fails to load or the boundary document has
/// an unsupported shape.
pub(crate) fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    tracing::debug!(config = ?config, "checking configuration");
    let tables = load_static_tables(config)?;
    let codes = casemap_metrics::boundary_region_codes(&tables.boundary, &config.boundary_key)?;
    let unknown = unknown_codes(&codes, &tables.lookup);

    println!("environment: {}", config.env);
    println!("regions: {}", tables.lookup.len());
    println!("corrections: {}", tables.corrections.len());
    match &tables.population {
        Some(population) => println!("population entries: {}", population.len()),
        None => println!("population: not configured"),
    }
    println!(
        "boundary features keyed by '{}': {}",
        config.boundary_key,
        codes.len()
    );
    if unknown.is_empty() {
        println!("all boundary codes resolve");
    } else {
        println!("boundary codes not in the region tables: {}", unknown.join(", "));
    }
    Ok(())
}

/// Boundary codes the lookup cannot resolve, deduplicated in first-seen order.
fn unknown_codes(codes: &[String], lookup: &RegionLookup) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    for code in codes {
        if lookup.resolve(code).is_none() && !unknown.contains(code) {
            unknown.push(code.clone());
        }
    }
    unknown
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn unknown_codes_are_deduplicated() {
        let lookup = RegionLookup::from_tables(
            HashMap::new(),
            HashMap::from([("CA".to_string(), "California".to_string())]),
        );
        let codes = ["CA", "GU", "PR", "GU"].map(String::from);
        assert_eq!(unknown_codes(&codes, &lookup), vec!["GU".to_string(), "PR".to_string()]);
    }
}
