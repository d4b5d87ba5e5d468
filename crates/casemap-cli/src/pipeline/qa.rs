//! The 14-day case growth sheet analysts review before publishing.

use casemap_core::{NationalPoint, RegionMetric};
use chrono::{Datelike, NaiveDate};

use super::artifacts::Artifact;

const QA_DAYS: usize = 14;

/// AP-style month label used in the sheet's file name.
fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan.",
        2 => "Feb.",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "Aug.",
        9 => "Sept.",
        10 => "Oct.",
        11 => "Nov.",
        _ => "Dec.",
    }
}

/// `"Sept. 30 case growth.csv"` for 2020-09-30.
pub(crate) fn qa_file_name(as_of: NaiveDate) -> String {
    format!("{} {} case growth.csv", month_label(as_of.month()), as_of.day())
}

fn short_date(date: NaiveDate) -> String {
    format!("{}/{}/{:02}", date.month(), date.day(), date.year() % 100)
}

/// Renders the growth sheet, or `None` when the national series is empty.
///
/// Date columns are the last 14 dates of the national series. A region with
/// no value for one of those dates gets an empty cell.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub(crate) fn render_qa_csv(
    national: &[NationalPoint],
    regions: &[RegionMetric],
) -> anyhow::Result<Option<Artifact>> {
    let Some(last) = national.last() else {
        return Ok(None);
    };
    let dates: Vec<NaiveDate> = national[national.len().saturating_sub(QA_DAYS)..]
        .iter()
        .map(|p| p.date)
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["state".to_string()];
    header.extend(dates.iter().copied().map(short_date));
    header.extend(["weekOne", "weekTwo", "change"].map(String::from));
    writer.write_record(&header)?;

    for metric in regions {
        let mut row = vec![metric.region.clone()];
        for date in &dates {
            let cell = metric
                .daily
                .iter()
                .find(|d| d.date == *date)
                .map(|d| d.cases.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        row.push(metric.prev_avg.to_string());
        row.push(metric.curr_avg.to_string());
        row.push(metric.change.to_string());
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to finish QA CSV: {e}"))?;
    Ok(Some(Artifact {
        file_name: qa_file_name(last.date),
        bytes,
    }))
}
