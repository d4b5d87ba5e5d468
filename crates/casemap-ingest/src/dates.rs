//! Date decoding for the encodings the sources use.
//!
//! | Encoding           | Example                     | Source          |
//! |--------------------|-----------------------------|-----------------|
//! | `YYYYMMDD` integer | `20200922`                  | CTP             |
//! | `M/D/YY`, `MM/DD/YY` | `9/22/20`, `09/22/20`     | JHU CSV headers |
//! | ISO date or timestamp | `2020-09-22T00:00:00.000` | CDC             |

use chrono::NaiveDate;

use crate::error::NormalizeError;
use crate::types::RawDate;

/// Decodes a [`RawDate`] into a calendar date.
///
/// # Errors
///
/// Returns [`NormalizeError::UnparseableDate`] if no supported encoding matches.
pub fn parse_raw_date(raw: &RawDate) -> Result<NaiveDate, NormalizeError> {
    let parsed = match raw {
        RawDate::Integer(n) => parse_compact(*n),
        RawDate::Text(s) => parse_date_text(s),
    };
    parsed.ok_or_else(|| NormalizeError::UnparseableDate(raw.to_string()))
}

/// Decodes a textual date in any supported encoding.
///
/// Returns `None` if the string matches none of them.
#[must_use]
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(parse_compact);
    }
    if s.contains('/') {
        return parse_slashed(s);
    }
    // ISO date, optionally followed by a time component.
    s.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .filter(|_| s.len() == 10 || s[10..].starts_with(['T', ' ']))
}

fn parse_compact(n: i64) -> Option<NaiveDate> {
    if !(10_000_101..=99_991_231).contains(&n) {
        return None;
    }
    let year = i32::try_from(n / 10_000).ok()?;
    let month = u32::try_from(n / 100 % 100).ok()?;
    let day = u32::try_from(n % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `M/D/YY` and `MM/DD/YY`; two-digit years are 20xx. Four-digit years are
/// accepted as-is.
fn parse_slashed(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let month = month.parse::<u32>().ok()?;
    let day = day.parse::<u32>().ok()?;
    let year = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse::<i32>().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
