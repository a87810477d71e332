//! HTTP API: climate series and monthly forecasts

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::forecast::Forecaster;
use crate::models::{DailyRequest, Location};
use crate::timeseries::{Period, build_series, resample_mean};
use crate::weather::ClimateProvider;
use crate::{ClimateError, Result};

/// Daily variable served by both endpoints
pub const DAILY_VARIABLE: &str = "temperature_2m_max";

/// Location of the climate-data endpoint (Berlin)
pub const CLIMATE_LOCATION: Location = Location::new(52.52, 13.41);

/// Models requested by the climate-data endpoint
pub const CLIMATE_MODELS: [&str; 7] = [
    "CMCC_CM2_VHR4",
    "FGOALS_f3_H",
    "HiRAM_SIT_HR",
    "MRI_AGCM3_2_S",
    "EC_Earth3P_HR",
    "MPI_ESM1_2_XR",
    "NICAM16_8S",
];

/// Model fitted by the forecast endpoint
pub const FORECAST_MODEL: &str = "CMCC_CM2_VHR4";

/// Number of months forecast
pub const FORECAST_HORIZON: usize = 12;

/// Shared handler dependencies, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ClimateProvider>,
    pub forecaster: Forecaster,
}

impl AppState {
    pub fn new(provider: Arc<dyn ClimateProvider>) -> Self {
        Self {
            provider,
            forecaster: Forecaster::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClimateDataResponse {
    pub dates: Vec<String>,
    pub temperature_2m_max: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub future_dates: Vec<String>,
    pub forecast: Vec<f64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/climate-data", get(get_climate_data))
        .route("/forecast/{lat}/{lng}", get(get_forecast))
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ClimateError::config(format!("invalid date {year}-{month}-{day}")))
}

#[instrument(skip(state))]
async fn get_climate_data(State(state): State<AppState>) -> Result<Json<ClimateDataResponse>> {
    let request = DailyRequest::new(
        CLIMATE_LOCATION,
        date(1950, 1, 1)?,
        date(2050, 12, 31)?,
        &CLIMATE_MODELS,
        DAILY_VARIABLE,
    );

    let responses = state.provider.fetch_daily(&request).await?;
    let response = responses
        .first()
        .ok_or_else(|| ClimateError::upstream("Climate API returned no model responses"))?;

    let series = build_series(response, 0)?;
    tracing::info!(points = series.len(), model = response.model(), "Built climate series");

    let dates = series.date_strings();
    let (_, temperature_2m_max) = series.into_parts();
    Ok(Json(ClimateDataResponse {
        dates,
        temperature_2m_max,
    }))
}

#[instrument(skip(state))]
async fn get_forecast(
    State(state): State<AppState>,
    Path((lat, lng)): Path<(f64, f64)>,
) -> Result<Json<ForecastResponse>> {
    let location = Location::parse(lat, lng)?;
    let request = DailyRequest::new(
        location,
        date(2010, 1, 1)?,
        date(2023, 12, 31)?,
        &[FORECAST_MODEL],
        DAILY_VARIABLE,
    );

    let responses = state.provider.fetch_daily(&request).await?;
    let response = responses
        .first()
        .ok_or_else(|| ClimateError::upstream("Climate API returned no model responses"))?;

    let daily = build_series(response, 0)?;
    let monthly = resample_mean(&daily, Period::Month);
    let result = state.forecaster.forecast(&monthly, FORECAST_HORIZON)?;

    tracing::info!(
        daily_points = daily.len(),
        monthly_points = monthly.len(),
        horizon = result.len(),
        "Computed forecast"
    );

    Ok(Json(ForecastResponse {
        future_dates: result.date_strings(),
        forecast: result.values,
    }))
}
