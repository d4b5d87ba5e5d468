//! Current/prior 7-day window averages and week-over-week change.

use casemap_core::{DailyCount, PercentChange, RegionMetric};

use crate::error::MetricError;

/// Days in one averaging window.
pub const WINDOW_DAYS: usize = 7;

/// Arithmetic mean of a window's counts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn window_average(window: &[DailyCount]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: i64 = window.iter().map(|d| d.cases).sum();
    sum as f64 / window.len() as f64
}

/// Percent change from `prior` to `current`.
///
/// A zero prior window yields [`PercentChange::FirstCases`] when the current
/// window is positive and [`PercentChange::NoChange`] otherwise.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn percent_change(current: f64, prior: f64) -> PercentChange {
    if prior == 0.0 {
        return if current > 0.0 {
            PercentChange::FirstCases
        } else {
            PercentChange::NoChange
        };
    }
    PercentChange::Change((current - prior) / prior * 100.0)
}

/// Computes the window summary for one region from its date-ordered series.
///
/// The current window is the last [`WINDOW_DAYS`] entries, ending on the
/// as-of date; the prior window is the [`WINDOW_DAYS`] entries before it.
/// Entries are dates with data, so a gap in the series does not add zeros.
///
/// # Errors
///
/// Returns [`MetricError::InsufficientHistory`] if the series holds fewer
/// than two full windows.
pub fn window_metric(region: &str, series: &[DailyCount]) -> Result<RegionMetric, MetricError> {
    debug_assert!(
        series.windows(2).all(|w| w[0].date < w[1].date),
        "series must be sorted by date"
    );

    let required = 2 * WINDOW_DAYS;
    if series.len() < required {
        return Err(MetricError::InsufficientHistory {
            region: region.to_string(),
            available: series.len(),
            required,
        });
    }

    let recent = &series[series.len() - required..];
    let (prior, current) = recent.split_at(WINDOW_DAYS);
    let curr_avg = window_average(current);
    let prev_avg = window_average(prior);

    Ok(RegionMetric {
        region: region.to_string(),
        curr_date: current[WINDOW_DAYS - 1].date,
        prev_date: prior[WINDOW_DAYS - 1].date,
        curr_avg,
        prev_avg,
        change: percent_change(curr_avg, prev_avg),
        curr_rate: None,
        daily: recent.to_vec(),
    })
}
