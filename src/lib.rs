//! Climate data and temperature forecast service
//!
//! Fetches daily climate model series from Open-Meteo, reshapes them into
//! date-indexed series, resamples them and forecasts future monthly values
//! with a fixed ARIMA model.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod telemetry;
pub mod timeseries;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use cache::PersistentCache;
pub use config::ClimateConfig;
pub use error::ClimateError;
pub use forecast::Forecaster;
pub use models::{DailyRequest, DailyResponse, DailyVariable, ForecastResult, Location};
pub use timeseries::{Period, TimeSeries};
pub use weather::{ClimateProvider, OpenMeteoClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ClimateError>;
