//! Grouping normalized observations into per-region and national series.

use std::collections::BTreeMap;

use casemap_core::{DailyCount, NationalPoint, NormalizedObservation};
use chrono::{Days, NaiveDate};

use crate::rolling::rolling_average;

/// Groups observations by region, each series sorted by date.
///
/// Observations repeating a `(region, date)` are summed; normalized input
/// never repeats one.
#[must_use]
pub fn group_by_region(observations: &[NormalizedObservation]) -> BTreeMap<String, Vec<DailyCount>> {
    let mut grouped: BTreeMap<String, BTreeMap<NaiveDate, i64>> = BTreeMap::new();
    for obs in observations {
        *grouped
            .entry(obs.region.clone())
            .or_default()
            .entry(obs.date)
            .or_insert(0) += obs.new_cases;
    }

    grouped
        .into_iter()
        .map(|(region, by_date)| {
            let series = by_date
                .into_iter()
                .map(|(date, cases)| DailyCount { date, cases })
                .collect();
            (region, series)
        })
        .collect()
}

/// Drops every entry dated after `as_of`.
pub fn truncate_to(series: &mut Vec<DailyCount>, as_of: NaiveDate) {
    series.retain(|d| d.date <= as_of);
}

/// Sums regions per date across the full observed range.
///
/// Every calendar date from the earliest to the latest observation gets an
/// entry; dates no region reported are zero.
#[must_use]
pub fn national_totals<'a, I>(regions: I) -> Vec<DailyCount>
where
    I: IntoIterator<Item = &'a Vec<DailyCount>>,
{
    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for series in regions {
        for day in series {
            *totals.entry(day.date).or_insert(0) += day.cases;
        }
    }

    let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut date = first;
    while date <= last {
        out.push(DailyCount {
            date,
            cases: totals.get(&date).copied().unwrap_or(0),
        });
        let Some(next) = date.checked_add_days(Days::new(1)) else {
            break;
        };
        date = next;
    }
    out
}

/// Attaches the rolling average to a gap-free national series.
#[must_use]
pub fn national_series(totals: &[DailyCount]) -> Vec<NationalPoint> {
    let values: Vec<i64> = totals.iter().map(|d| d.cases).collect();
    totals
        .iter()
        .zip(rolling_average(&values))
        .map(|(day, avg)| NationalPoint {
            date: day.date,
            cases: day.cases,
            avg,
        })
        .collect()
}
