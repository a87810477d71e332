//! Date-indexed numeric series
//!
//! - Builder: turns a provider daily block into a [`TimeSeries`]
//! - Resample: aggregates a series to a coarser [`Period`]

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClimateError, Result};

pub mod builder;
pub mod resample;

pub use builder::build_series;
pub use resample::{Period, resample_mean};

/// Date format used for every date rendered to clients
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ordered `(timestamp, value)` pairs with strictly increasing timestamps.
///
/// Missing provider values are kept as `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

/// Unchecked wire form, validated through [`TimeSeries::new`]
#[derive(Deserialize)]
struct RawSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TryFrom<RawSeries> for TimeSeries {
    type Error = ClimateError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        Self::new(raw.timestamps, raw.values)
    }
}

impl TimeSeries {
    /// Create a series, checking that both columns line up and timestamps increase
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ClimateError::data_integrity(format!(
                "{} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }
        if let Some(pair) = timestamps.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ClimateError::data_integrity(format!(
                "timestamps not strictly increasing at {}",
                pair[1]
            )));
        }
        Ok(Self { timestamps, values })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Timestamps rendered as `YYYY-MM-DD`
    #[must_use]
    pub fn date_strings(&self) -> Vec<String> {
        format_dates(&self.timestamps)
    }

    /// Split into the timestamp and value columns
    #[must_use]
    pub fn into_parts(self) -> (Vec<DateTime<Utc>>, Vec<f64>) {
        (self.timestamps, self.values)
    }
}

#[must_use]
pub fn format_dates(timestamps: &[DateTime<Utc>]) -> Vec<String> {
    timestamps
        .iter()
        .map(|ts| ts.format(DATE_FORMAT).to_string())
        .collect()
}

/// Spacing between consecutive points of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Constant duration between points
    Fixed(TimeDelta),
    /// One calendar month between points
    Monthly,
    /// One calendar year between points
    Yearly,
}

impl Frequency {
    /// Infer the spacing of a series.
    ///
    /// Calendar spacings are checked before fixed durations so that month
    /// starts of unequal length are recognised as monthly. Returns `None`
    /// for fewer than two points or irregular spacing.
    #[must_use]
    pub fn infer(timestamps: &[DateTime<Utc>]) -> Option<Self> {
        if timestamps.len() < 2 {
            return None;
        }

        let spaced_by_months = |months: u32| {
            timestamps
                .windows(2)
                .all(|pair| pair[0].checked_add_months(Months::new(months)) == Some(pair[1]))
        };

        if spaced_by_months(1) {
            return Some(Frequency::Monthly);
        }
        if spaced_by_months(12) {
            return Some(Frequency::Yearly);
        }

        let delta = timestamps[1] - timestamps[0];
        if delta > TimeDelta::zero() && timestamps.windows(2).all(|pair| pair[1] - pair[0] == delta) {
            Some(Frequency::Fixed(delta))
        } else {
            None
        }
    }

    /// The timestamp one step after `from`
    #[must_use]
    pub fn step(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Frequency::Fixed(delta) => from.checked_add_signed(*delta),
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
            Frequency::Yearly => from.checked_add_months(Months::new(12)),
        }
    }

    /// `count` timestamps continuing after `from`
    #[must_use]
    pub fn extrapolate(&self, from: DateTime<Utc>, count: usize) -> Option<Vec<DateTime<Utc>>> {
        let mut out = Vec::with_capacity(count);
        let mut current = from;
        for _ in 0..count {
            current = self.step(current)?;
            out.push(current);
        }
        Some(out)
    }
}
