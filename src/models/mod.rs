//! Data models for the climate forecast service
//!
//! - Location: geographic coordinates
//! - Climate: provider request parameters and daily block responses
//! - Forecast: future timestamps with predicted values

pub mod climate;
pub mod forecast;
pub mod location;

pub use climate::{DailyRequest, DailyResponse, DailyVariable};
pub use forecast::ForecastResult;
pub use location::Location;
