use casemap_core::SourceKind;
use serde::Deserialize;

/// A source date before normalization: `20200922`, `"9/22/20"`,
/// `"2020-09-22T00:00:00.000"`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Integer(i64),
    Text(String),
}

impl std::fmt::Display for RawDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawDate::Integer(n) => write!(f, "{n}"),
            RawDate::Text(s) => f.write_str(s),
        }
    }
}

/// One source row for one region and one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    /// Full name or postal code, depending on the source.
    pub region: String,
    pub date: RawDate,
    /// Cumulative or incremental, per [`SourceKind::value_kind`].
    pub value: i64,
}

/// Every row a source produced, plus what was rejected while reading it.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub source: SourceKind,
    pub observations: Vec<RawObservation>,
    pub dropped: DropReport,
}

/// Counts of records dropped during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropReport {
    pub unknown_region: usize,
    pub unparseable_date: usize,
    pub unparseable_value: usize,
    pub duplicate: usize,
}

impl DropReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.unknown_region + self.unparseable_date + self.unparseable_value + self.duplicate
    }

    /// Adds another report's counts into this one.
    pub fn merge(&mut self, other: DropReport) {
        self.unknown_region += other.unknown_region;
        self.unparseable_date += other.unparseable_date;
        self.unparseable_value += other.unparseable_value;
        self.duplicate += other.duplicate;
    }
}

impl std::fmt::Display for DropReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} dropped (unknown region: {}, unparseable date: {}, unparseable value: {}, duplicate: {})",
            self.total(),
            self.unknown_region,
            self.unparseable_date,
            self.unparseable_value,
            self.duplicate
        )
    }
}

/// A row of The COVID Tracking Project's `states/daily.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CtpRow {
    pub date: RawDate,
    pub state: String,
    /// Null on days before a state began reporting.
    #[serde(rename = "positiveIncrease", default)]
    pub positive_increase: Option<i64>,
}

/// A row of the CDC Socrata case surveillance dataset. Socrata sends
/// numeric columns as strings (`"123.0"`).
#[derive(Debug, Clone, Deserialize)]
pub struct CdcRow {
    pub submission_date: RawDate,
    pub state: String,
    #[serde(default)]
    pub new_case: Option<serde_json::Value>,
}
