//! Domain records shared by the ingest, metrics, and CLI crates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// The public datasets a run can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The COVID Tracking Project daily state JSON.
    Ctp,
    /// Johns Hopkins CSSE wide-format county time series CSV.
    Jhu,
    /// CDC Socrata case surveillance JSON.
    Cdc,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Ctp => "ctp",
            SourceKind::Jhu => "jhu",
            SourceKind::Cdc => "cdc",
        }
    }

    /// Whether the source reports running totals or per-day counts.
    #[must_use]
    pub fn value_kind(self) -> ValueKind {
        match self {
            SourceKind::Jhu => ValueKind::Cumulative,
            SourceKind::Ctp | SourceKind::Cdc => ValueKind::Incremental,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ctp" => Ok(SourceKind::Ctp),
            "jhu" => Ok(SourceKind::Jhu),
            "cdc" => Ok(SourceKind::Cdc),
            other => Err(format!("unknown source '{other}'; expected ctp, jhu, or cdc")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Cumulative,
    Incremental,
}

/// One day of new cases for one region, after region and date resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedObservation {
    /// Two-letter postal code.
    pub region: String,
    pub date: NaiveDate,
    /// May be negative when a source revised a running total downward.
    pub new_cases: i64,
}

/// A dated count, used for per-region series and QA output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub cases: i64,
}

/// Week-over-week change between two window averages.
///
/// The two sentinels cover a zero prior window, which the map renders as
/// text rather than as a percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentChange {
    Change(f64),
    /// Prior window was zero and the current window is positive.
    FirstCases,
    /// Both windows were zero.
    NoChange,
}

impl PercentChange {
    /// Returns the numeric change, or `None` for either sentinel.
    #[must_use]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            PercentChange::Change(v) => Some(v),
            PercentChange::FirstCases | PercentChange::NoChange => None,
        }
    }
}

impl std::fmt::Display for PercentChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PercentChange::Change(v) => write!(f, "{v}"),
            PercentChange::FirstCases => f.write_str("first_cases"),
            PercentChange::NoChange => f.write_str("no_change"),
        }
    }
}

impl Serialize for PercentChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PercentChange::Change(v) => serializer.serialize_f64(*v),
            PercentChange::FirstCases => serializer.serialize_str("first_cases"),
            PercentChange::NoChange => serializer.serialize_str("no_change"),
        }
    }
}

/// Current and prior 7-day window summary for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetric {
    #[serde(rename = "state")]
    pub region: String,
    /// Last date of the current window (the as-of date).
    pub curr_date: NaiveDate,
    /// Last date of the prior window.
    pub prev_date: NaiveDate,
    pub curr_avg: f64,
    pub prev_avg: f64,
    pub change: PercentChange,
    /// Current average per 100 000 residents, when population is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curr_rate: Option<f64>,
    /// The 14 daily values behind both windows, oldest first.
    #[serde(skip)]
    pub daily: Vec<DailyCount>,
}

/// One date of the national series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalPoint {
    pub date: NaiveDate,
    pub cases: i64,
    pub avg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_parses_case_insensitively() {
        assert_eq!("CTP".parse::<SourceKind>().unwrap(), SourceKind::Ctp);
        assert_eq!(" jhu ".parse::<SourceKind>().unwrap(), SourceKind::Jhu);
        assert!("nyt".parse::<SourceKind>().is_err());
    }

    #[test]
    fn only_jhu_is_cumulative() {
        assert_eq!(SourceKind::Jhu.value_kind(), ValueKind::Cumulative);
        assert_eq!(SourceKind::Ctp.value_kind(), ValueKind::Incremental);
        assert_eq!(SourceKind::Cdc.value_kind(), ValueKind::Incremental);
    }

    #[test]
    fn percent_change_serializes_sentinels_as_strings() {
        assert_eq!(
            serde_json::to_value(PercentChange::Change(50.0)).unwrap(),
            serde_json::json!(50.0)
        );
        assert_eq!(
            serde_json::to_value(PercentChange::FirstCases).unwrap(),
            serde_json::json!("first_cases")
        );
        assert_eq!(
            serde_json::to_value(PercentChange::NoChange).unwrap(),
            serde_json::json!("no_change")
        );
    }

    #[test]
    fn region_metric_uses_artifact_field_names() {
        let metric = RegionMetric {
            region: "CA".to_string(),
            curr_date: NaiveDate::from_ymd_opt(2020, 9, 30).unwrap(),
            prev_date: NaiveDate::from_ymd_opt(2020, 9, 23).unwrap(),
            curr_avg: 150.0,
            prev_avg: 100.0,
            change: PercentChange::Change(50.0),
            curr_rate: None,
            daily: Vec::new(),
        };
        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "state": "CA",
                "currDate": "2020-09-30",
                "prevDate": "2020-09-23",
                "currAvg": 150.0,
                "prevAvg": 100.0,
                "change": 50.0
            })
        );
    }
}
