use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::TimeSeries;

/// Aggregation period for resampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Month,
    Year,
}

impl Period {
    /// First instant (UTC) of the period containing `timestamp`
    #[must_use]
    pub fn floor(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let date = timestamp.date_naive();
        let start = match self {
            Period::Day => Some(date),
            Period::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        // The first day of an existing month or year always exists
        start.unwrap_or(date).and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

/// Arithmetic mean of the series per period, labelled with the period start.
///
/// Non-finite values do not contribute. Periods without any finite value
/// are left out instead of being filled.
#[must_use]
pub fn resample_mean(series: &TimeSeries, period: Period) -> TimeSeries {
    let mut buckets: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();

    for (timestamp, value) in series.iter() {
        if !value.is_finite() {
            continue;
        }
        let bucket = buckets.entry(period.floor(timestamp)).or_insert((0.0, 0));
        bucket.0 += value;
        bucket.1 += 1;
    }

    let (timestamps, values) = buckets
        .into_iter()
        .map(|(start, (sum, count))| (start, sum / count as f64))
        .unzip();

    // BTreeMap keys are unique and ordered, so the invariants hold
    TimeSeries { timestamps, values }
}
