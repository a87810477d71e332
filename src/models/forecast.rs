//! Forecast result model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timeseries::format_dates;

/// Predicted values at future timestamps, in time order
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastResult {
    /// Future timestamps, strictly increasing
    pub timestamps: Vec<DateTime<Utc>>,
    /// Predicted value for each timestamp
    pub values: Vec<f64>,
}

impl ForecastResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Future timestamps rendered as `YYYY-MM-DD`
    #[must_use]
    pub fn date_strings(&self) -> Vec<String> {
        format_dates(&self.timestamps)
    }
}
