//! Application of analyst corrections to a dated series.

use casemap_core::{AnomalyCorrection, CorrectionScope, DailyCount, SourceKind};

/// Applies every correction for `scope` and `source` to `series`, in table
/// order, and returns how many were applied.
///
/// Entries are not de-duplicated here: the same table applied twice adjusts
/// twice. The table loader rejects repeated keys, and the driver calls this
/// once per series.
///
/// A correction whose date is absent from the series is logged and skipped.
pub fn apply_corrections(
    series: &mut [DailyCount],
    scope: &CorrectionScope,
    source: SourceKind,
    corrections: &[AnomalyCorrection],
) -> usize {
    let mut applied = 0;
    for correction in corrections
        .iter()
        .filter(|c| &c.scope == scope && c.applies_to(source))
    {
        let Ok(idx) = series.binary_search_by_key(&correction.date, |d| d.date) else {
            tracing::warn!(
                scope = %scope,
                date = %correction.date,
                "correction date not in series; skipped"
            );
            continue;
        };

        let entry = &mut series[idx];
        let before = entry.cases;
        entry.cases = correction.adjustment.apply(before);
        applied += 1;
        tracing::info!(
            scope = %scope,
            date = %correction.date,
            before,
            after = entry.cases,
            note = correction.note.as_deref().unwrap_or(""),
            "applied correction"
        );
    }
    applied
}
