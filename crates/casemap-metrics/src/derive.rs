//! One-call derivation of every metric a run publishes.

use casemap_core::{
    AnomalyCorrection, CorrectionScope, NationalPoint, NormalizedObservation, PopulationTable,
    RegionMetric, SourceKind,
};
use chrono::NaiveDate;

use crate::corrections::apply_corrections;
use crate::series::{group_by_region, national_series, national_totals, truncate_to};
use crate::window::window_metric;

/// Inputs to [`derive_metrics`]. All tables are read-only for the run.
#[derive(Debug, Clone, Copy)]
pub struct DeriveInput<'a> {
    pub observations: &'a [NormalizedObservation],
    pub source: SourceKind,
    pub corrections: &'a [AnomalyCorrection],
    pub population: Option<&'a PopulationTable>,
    /// Ignore data after this date; `None` uses everything.
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct DerivedMetrics {
    pub national: Vec<NationalPoint>,
    /// Sorted by region code.
    pub regions: Vec<RegionMetric>,
    /// Regions left out for lack of history.
    pub omitted: Vec<String>,
    pub corrections_applied: usize,
}

/// Derives the national series and the per-region window summaries.
///
/// Region corrections are applied to each region's series first, so they
/// flow into both the region's windows and the national total. National
/// corrections are applied to the summed series before its rolling average.
#[must_use]
pub fn derive_metrics(input: DeriveInput<'_>) -> DerivedMetrics {
    let mut by_region = group_by_region(input.observations);
    let mut corrections_applied = 0;

    for (region, series) in &mut by_region {
        if let Some(as_of) = input.as_of {
            truncate_to(series, as_of);
        }
        corrections_applied += apply_corrections(
            series,
            &CorrectionScope::Region(region.clone()),
            input.source,
            input.corrections,
        );
    }

    let mut regions = Vec::with_capacity(by_region.len());
    let mut omitted = Vec::new();
    for (region, series) in &by_region {
        match window_metric(region, series) {
            Ok(mut metric) => {
                metric.curr_rate = input
                    .population
                    .and_then(|p| p.get(region))
                    .and_then(|pop| per_100k(metric.curr_avg, pop));
                regions.push(metric);
            }
            Err(e) => {
                tracing::warn!(region = %region, error = %e, "omitting region metric");
                omitted.push(region.clone());
            }
        }
    }

    let mut totals = national_totals(by_region.values());
    corrections_applied += apply_corrections(
        &mut totals,
        &CorrectionScope::National,
        input.source,
        input.corrections,
    );
    let national = national_series(&totals);

    DerivedMetrics {
        national,
        regions,
        omitted,
        corrections_applied,
    }
}

#[allow(clippy::cast_precision_loss)]
fn per_100k(average: f64, population: u64) -> Option<f64> {
    if population == 0 {
        return None;
    }
    Some(average / population as f64 * 100_000.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use casemap_core::{Adjustment, PercentChange};
    use chrono::Days;

    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, 1).unwrap()
    }

    fn region_obs(region: &str, values: &[i64]) -> Vec<NormalizedObservation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &new_cases)| NormalizedObservation {
                region: region.to_string(),
                date: start() + Days::new(i as u64),
                new_cases,
            })
            .collect()
    }

    fn input<'a>(
        observations: &'a [NormalizedObservation],
        corrections: &'a [AnomalyCorrection],
    ) -> DeriveInput<'a> {
        DeriveInput {
            observations,
            source: SourceKind::Ctp,
            corrections,
            population: None,
            as_of: None,
        }
    }

    #[test]
    fn short_history_regions_are_omitted_not_zeroed() {
        let mut obs = region_obs("CA", &[10; 14]);
        obs.extend(region_obs("VT", &[1; 5]));
        let derived = derive_metrics(input(&obs, &[]));

        assert_eq!(derived.regions.len(), 1);
        assert_eq!(derived.regions[0].region, "CA");
        assert_eq!(derived.omitted, vec!["VT".to_string()]);
        // VT still counts toward the national total.
        assert_eq!(derived.national[0].cases, 11);
        assert_eq!(derived.national.len(), 14);
    }

    #[test]
    fn national_correction_only_touches_national_series() {
        let obs = region_obs("CA", &[10_000; 14]);
        let corrections = [AnomalyCorrection {
            date: start() + Days::new(9),
            scope: CorrectionScope::National,
            adjustment: Adjustment::Delta(-6142),
            source: None,
            note: Some("backlog".to_string()),
        }];
        let derived = derive_metrics(input(&obs, &corrections));

        assert_eq!(derived.corrections_applied, 1);
        assert_eq!(derived.national[9].cases, 10_000 - 6142);
        assert_eq!(derived.regions[0].change, PercentChange::Change(0.0));
    }

    #[test]
    fn region_correction_flows_into_region_and_national() {
        let obs = region_obs("NY", &[100; 14]);
        let corrections = [AnomalyCorrection {
            date: start() + Days::new(13),
            scope: CorrectionScope::Region("NY".to_string()),
            adjustment: Adjustment::Delta(700),
            source: None,
            note: None,
        }];
        let derived = derive_metrics(input(&obs, &corrections));

        assert!((derived.regions[0].curr_avg - 200.0).abs() < 1e-9);
        assert_eq!(derived.national[13].cases, 800);
    }

    #[test]
    fn as_of_truncates_all_series() {
        let obs = region_obs("CA", &(1..=20).collect::<Vec<_>>());
        let mut inp = input(&obs, &[]);
        inp.as_of = Some(start() + Days::new(13));
        let derived = derive_metrics(inp);

        assert_eq!(derived.national.len(), 14);
        assert_eq!(derived.regions[0].curr_date, start() + Days::new(13));
        assert!((derived.regions[0].curr_avg - 11.0).abs() < 1e-9);
    }

    #[test]
    fn population_yields_rate_per_100k() {
        let obs = region_obs("CA", &[400; 14]);
        let population = PopulationTable::from_map(HashMap::from([("CA".to_string(), 40_000_000)]));
        let mut inp = input(&obs, &[]);
        inp.population = Some(&population);
        let derived = derive_metrics(inp);

        let rate = derived.regions[0].curr_rate.unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_population_leaves_rate_unset() {
        let obs = region_obs("CA", &[400; 14]);
        let population = PopulationTable::default();
        let mut inp = input(&obs, &[]);
        inp.population = Some(&population);
        assert!(derive_metrics(inp).regions[0].curr_rate.is_none());
    }
}
