//! Per-source payload parsing into [`RawObservation`]s.
//!
//! Row-level problems (a missing count, an unreadable cell) drop the row and
//! are counted in the dataset's [`DropReport`]. Structural problems (the body
//! is not JSON, the CSV has no region column) fail the whole payload.

use std::collections::HashMap;
use std::path::Path;

use casemap_core::SourceKind;

use crate::dates::parse_date_text;
use crate::error::IngestError;
use crate::types::{CdcRow, CtpRow, DropReport, RawDataset, RawDate, RawObservation};

/// Column holding the full region name in the JHU time series.
const JHU_REGION_COLUMN: &str = "Province_State";

/// Parses a fetched or on-disk payload for the given source.
///
/// # Errors
///
/// - [`IngestError::Deserialize`] if a JSON source is not an array of rows.
/// - [`IngestError::Csv`] / [`IngestError::MissingColumn`] for a malformed CSV.
/// - [`IngestError::EmptyDataset`] if no rows survive parsing.
pub fn parse_payload(source: SourceKind, body: &str) -> Result<RawDataset, IngestError> {
    let (observations, dropped) = match source {
        SourceKind::Ctp => parse_ctp(body)?,
        SourceKind::Cdc => parse_cdc(body)?,
        SourceKind::Jhu => parse_jhu(body)?,
    };

    if observations.is_empty() {
        return Err(IngestError::EmptyDataset { kind: source });
    }

    tracing::info!(
        source = %source,
        rows = observations.len(),
        dropped = dropped.total(),
        "parsed source payload"
    );

    Ok(RawDataset {
        source,
        observations,
        dropped,
    })
}

/// Reads a dataset from a local file instead of fetching it.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read, otherwise any
/// error from [`parse_payload`].
pub fn read_dataset(source: SourceKind, path: &Path) -> Result<RawDataset, IngestError> {
    let body = std::fs::read_to_string(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_payload(source, &body)
}

fn parse_ctp(body: &str) -> Result<(Vec<RawObservation>, DropReport), IngestError> {
    let rows: Vec<CtpRow> = serde_json::from_str(body).map_err(|e| IngestError::Deserialize {
        context: "ctp daily rows".to_string(),
        source: e,
    })?;

    let observations = rows
        .into_iter()
        .map(|row| RawObservation {
            region: row.state,
            date: row.date,
            value: row.positive_increase.unwrap_or(0),
        })
        .collect();

    Ok((observations, DropReport::default()))
}

fn parse_cdc(body: &str) -> Result<(Vec<RawObservation>, DropReport), IngestError> {
    let rows: Vec<CdcRow> = serde_json::from_str(body).map_err(|e| IngestError::Deserialize {
        context: "cdc case rows".to_string(),
        source: e,
    })?;

    let mut dropped = DropReport::default();
    let mut observations = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(value) = row.new_case.as_ref().and_then(parse_count) else {
            tracing::warn!(
                state = %row.state,
                date = %row.submission_date,
                "dropping row: unreadable new_case"
            );
            dropped.unparseable_value += 1;
            continue;
        };
        observations.push(RawObservation {
            region: row.state,
            date: row.submission_date,
            value,
        });
    }

    Ok((observations, dropped))
}

/// Reads a count that may arrive as a JSON number or a numeric string.
#[allow(clippy::cast_possible_truncation)]
fn parse_count(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.round() as i64)
        }),
        serde_json::Value::String(s) => parse_count_str(s),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_count_str(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64)
    })
}

/// Parses the wide JHU CSV: one row per county, one column per date.
///
/// County rows are summed per region for each date column; the values stay
/// cumulative. Columns whose header is not a date are treated as metadata.
fn parse_jhu(body: &str) -> Result<(Vec<RawObservation>, DropReport), IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let region_idx = headers
        .iter()
        .position(|h| h.trim() == JHU_REGION_COLUMN)
        .ok_or_else(|| IngestError::MissingColumn {
            column: JHU_REGION_COLUMN.to_string(),
        })?;
    let date_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| parse_date_text(h).is_some())
        .collect();

    let mut dropped = DropReport::default();
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, Vec<i64>> = HashMap::new();

    for record in reader.records() {
        let record = record?;
        let region = record.get(region_idx).unwrap_or_default().trim().to_string();

        let cells: Option<Vec<i64>> = date_columns
            .iter()
            .map(|(idx, _)| record.get(*idx).and_then(parse_count_str))
            .collect();
        let Some(cells) = cells else {
            tracing::warn!(region = %region, "dropping county row: unreadable cumulative count");
            dropped.unparseable_value += 1;
            continue;
        };

        let sums = totals.entry(region.clone()).or_insert_with(|| {
            order.push(region.clone());
            vec![0; date_columns.len()]
        });
        for (sum, cell) in sums.iter_mut().zip(cells) {
            *sum += cell;
        }
    }

    let mut observations = Vec::with_capacity(order.len() * date_columns.len());
    for region in order {
        let Some(sums) = totals.remove(&region) else {
            continue;
        };
        for ((_, header), value) in date_columns.iter().zip(sums) {
            observations.push(RawObservation {
                region: region.clone(),
                date: RawDate::Text((*header).to_string()),
                value,
            });
        }
    }

    Ok((observations, dropped))
}
