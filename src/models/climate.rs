//! Provider request parameters and daily block responses

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Location;

/// Parameters for one daily climate data request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRequest {
    pub location: Location,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Climate model identifiers, e.g. `CMCC_CM2_VHR4`
    pub models: Vec<String>,
    /// Daily variable name, e.g. `temperature_2m_max`
    pub variable: String,
}

impl DailyRequest {
    #[must_use]
    pub fn new(
        location: Location,
        start_date: NaiveDate,
        end_date: NaiveDate,
        models: &[&str],
        variable: &str,
    ) -> Self {
        Self {
            location,
            start_date,
            end_date,
            models: models.iter().map(|m| (*m).to_string()).collect(),
            variable: variable.to_string(),
        }
    }
}

/// One named value array of a daily block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVariable {
    name: String,
    values: Vec<f64>,
}

impl DailyVariable {
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in time order, `NaN` where the provider had no value
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Daily block of a single model's provider response.
///
/// Times are unix seconds; `time_end` is exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResponse {
    model: String,
    location: Location,
    time: i64,
    time_end: i64,
    interval: i64,
    variables: Vec<DailyVariable>,
}

impl DailyResponse {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        location: Location,
        time: i64,
        time_end: i64,
        interval: i64,
        variables: Vec<DailyVariable>,
    ) -> Self {
        Self {
            model: model.into(),
            location,
            time,
            time_end,
            interval,
            variables,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Grid cell location reported by the provider
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Start of the block in unix seconds
    #[must_use]
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Exclusive end of the block in unix seconds
    #[must_use]
    pub fn time_end(&self) -> i64 {
        self.time_end
    }

    /// Sampling interval in seconds
    #[must_use]
    pub fn interval(&self) -> i64 {
        self.interval
    }

    #[must_use]
    pub fn variables_length(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn variable(&self, index: usize) -> Option<&DailyVariable> {
        self.variables.get(index)
    }
}
