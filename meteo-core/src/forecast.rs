//! Collapses the 3-hourly forecast feed into one summary per day.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};

use crate::model::{DailySummary, ForecastSample};

/// Maximum number of days returned by [`aggregate`].
pub const MAX_DAYS: usize = 5;

/// Local hours `[start, end)` preferred for the representative sample.
const REPRESENTATIVE_HOURS: std::ops::Range<u32> = 12..18;

/// Summarize `samples` per local calendar day.
///
/// Days on or before `reference_date` are dropped, the rest are returned in
/// ascending order, at most [`MAX_DAYS`] of them. Temperatures are the min/max
/// across the whole day; everything else comes from the representative sample,
/// which is the first one in the early afternoon or the first of the day.
/// `offset` decides where day boundaries fall and must be the same offset the
/// reference date was taken in.
pub fn aggregate(
    samples: &[ForecastSample],
    reference_date: NaiveDate,
    offset: FixedOffset,
) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, Vec<(u32, &ForecastSample)>> = BTreeMap::new();

    for sample in samples {
        let Some(local) = local_time(sample.timestamp_utc, offset) else {
            tracing::debug!(ts = sample.timestamp_utc, "Skipping forecast sample with invalid timestamp");
            continue;
        };

        let date = local.date_naive();
        if date <= reference_date {
            continue;
        }

        days.entry(date).or_default().push((local.hour(), sample));
    }

    days.into_iter()
        .take(MAX_DAYS)
        .filter_map(|(date, group)| summarize_day(date, &group))
        .collect()
}

fn summarize_day(date: NaiveDate, group: &[(u32, &ForecastSample)]) -> Option<DailySummary> {
    let (_, first) = *group.first()?;

    let representative = group
        .iter()
        .find(|(hour, _)| REPRESENTATIVE_HOURS.contains(hour))
        .map(|(_, sample)| *sample)
        .unwrap_or(first);

    let temp_min_of_day = group.iter().map(|(_, s)| s.temp_min).fold(f64::INFINITY, f64::min);
    let temp_max_of_day = group.iter().map(|(_, s)| s.temp_max).fold(f64::NEG_INFINITY, f64::max);

    Some(DailySummary {
        date,
        representative: representative.clone(),
        temp_min_of_day,
        temp_max_of_day,
    })
}

fn local_time(ts: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&offset))
}

/// Calendar date of `now` as seen from `offset`.
pub fn local_date(now: DateTime<chrono::Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
