//! Normalization of raw source rows into [`NormalizedObservation`]s.
//!
//! Region tokens resolve through the static lookup tables, dates through
//! [`crate::dates`]. Records that fail either step are dropped and counted.
//! Cumulative sources are then differenced per region into daily counts.

use std::collections::{BTreeMap, HashSet};

use casemap_core::{NormalizedObservation, RegionLookup, ValueKind};
use chrono::NaiveDate;

use crate::dates::parse_raw_date;
use crate::error::NormalizeError;
use crate::types::{DropReport, RawDataset, RawObservation};

/// The normalized observations of one dataset, sorted by region then date.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub observations: Vec<NormalizedObservation>,
    /// Drops from parsing and normalization combined.
    pub dropped: DropReport,
}

/// Resolves one raw record's region and date. The value is carried through
/// unchanged; differencing happens across the whole series.
///
/// # Errors
///
/// - [`NormalizeError::UnknownRegion`] if the token is not in `lookup`.
/// - [`NormalizeError::UnparseableDate`] if the date matches no known encoding.
pub fn normalize_observation(
    raw: &RawObservation,
    lookup: &RegionLookup,
) -> Result<NormalizedObservation, NormalizeError> {
    let region = lookup
        .resolve(&raw.region)
        .ok_or_else(|| NormalizeError::UnknownRegion(raw.region.clone()))?;
    let date = parse_raw_date(&raw.date)?;
    Ok(NormalizedObservation {
        region: region.to_string(),
        date,
        new_cases: raw.value,
    })
}

/// Converts a cumulative series into per-step increments.
///
/// The first increment equals the first cumulative value. Downward revisions
/// come out negative and are left that way.
#[must_use]
pub fn cumulative_to_incremental(values: &[i64]) -> Vec<i64> {
    let mut prev = 0;
    values
        .iter()
        .map(|&v| {
            let diff = v - prev;
            prev = v;
            diff
        })
        .collect()
}

/// Normalizes a whole dataset.
///
/// One observation is kept per `(region, date)`; later duplicates are
/// dropped and counted. For cumulative sources each region's series is
/// sorted by date and differenced.
#[must_use]
pub fn normalize(dataset: RawDataset, lookup: &RegionLookup) -> NormalizeOutcome {
    let mut dropped = dataset.dropped;
    let mut warned_regions: HashSet<String> = HashSet::new();
    let mut by_region: BTreeMap<String, BTreeMap<NaiveDate, i64>> = BTreeMap::new();

    for raw in &dataset.observations {
        let obs = match normalize_observation(raw, lookup) {
            Ok(obs) => obs,
            Err(NormalizeError::UnknownRegion(token)) => {
                if warned_regions.insert(token.clone()) {
                    tracing::warn!(region = %token, "dropping records for unknown region");
                }
                dropped.unknown_region += 1;
                continue;
            }
            Err(e @ NormalizeError::UnparseableDate(_)) => {
                tracing::warn!(region = %raw.region, error = %e, "dropping record");
                dropped.unparseable_date += 1;
                continue;
            }
        };

        let series = by_region.entry(obs.region).or_default();
        if series.contains_key(&obs.date) {
            tracing::warn!(region = %raw.region, date = %obs.date, "dropping duplicate record");
            dropped.duplicate += 1;
            continue;
        }
        series.insert(obs.date, obs.new_cases);
    }

    let value_kind = dataset.source.value_kind();
    let mut observations = Vec::new();
    for (region, series) in by_region {
        let (dates, values): (Vec<NaiveDate>, Vec<i64>) = series.into_iter().unzip();
        let values = match value_kind {
            ValueKind::Cumulative => cumulative_to_incremental(&values),
            ValueKind::Incremental => values,
        };
        observations.extend(dates.into_iter().zip(values).map(|(date, new_cases)| {
            NormalizedObservation {
                region: region.clone(),
                date,
                new_cases,
            }
        }));
    }

    if dropped.total() > 0 {
        tracing::info!(%dropped, "normalization finished with dropped records");
    }

    NormalizeOutcome {
        observations,
        dropped,
    }
}
