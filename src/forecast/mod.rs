//! Forecasting of date-indexed series
//!
//! Fits a fixed-order ARIMA model to a [`TimeSeries`] and extends its
//! timestamps at the series' own spacing.

pub mod arima;

use crate::models::ForecastResult;
use crate::timeseries::{Frequency, TimeSeries};
use crate::{ClimateError, Result};
use arima::{Arima, ArimaOrder};

/// Order used for every forecast served by the API
pub const DEFAULT_ORDER: ArimaOrder = ArimaOrder::new(5, 1, 0);

/// Produces future points for a regularly spaced series
#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    model: Arima,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

impl Forecaster {
    #[must_use]
    pub const fn new(order: ArimaOrder) -> Self {
        Self {
            model: Arima::new(order),
        }
    }

    #[must_use]
    pub const fn order(&self) -> ArimaOrder {
        self.model.order()
    }

    /// Forecast `horizon` points after the last observation.
    ///
    /// The model is fitted on the whole series; future timestamps follow
    /// the spacing inferred from the input.
    #[tracing::instrument(level = "debug", skip(self, series), fields(points = series.len()))]
    pub fn forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ClimateError::validation("forecast horizon must be positive"));
        }

        let fitted = self.model.fit(series.values())?;

        let frequency = Frequency::infer(series.timestamps()).ok_or_else(|| {
            ClimateError::model_fit("cannot infer a regular spacing from the series timestamps")
        })?;
        let last = series
            .last_timestamp()
            .ok_or_else(|| ClimateError::model_fit("series is empty"))?;
        let timestamps = frequency
            .extrapolate(last, horizon)
            .ok_or_else(|| ClimateError::model_fit("forecast dates run out of range"))?;

        Ok(ForecastResult {
            timestamps,
            values: fitted.forecast(horizon),
        })
    }
}
