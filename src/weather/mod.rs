//! Climate data providers

use async_trait::async_trait;

use crate::Result;
use crate::models::{DailyRequest, DailyResponse};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

/// Source of daily climate series.
///
/// Returns one [`DailyResponse`] per requested model, in request order.
#[async_trait]
pub trait ClimateProvider: Send + Sync {
    async fn fetch_daily(&self, request: &DailyRequest) -> Result<Vec<DailyResponse>>;
}
