use std::sync::Arc;

use anyhow::{Context, Result};
use climate_forecast::{AppState, ClimateConfig, OpenMeteoClient, PersistentCache, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClimateConfig::load()?;
    let _telemetry = telemetry::init(&config.logging)?;

    let mut provider = OpenMeteoClient::new(&config.provider)?;
    if config.cache.enabled {
        let cache = PersistentCache::open(&config.cache.location).with_context(|| {
            format!("Failed to open cache database at {}", config.cache.location)
        })?;
        provider = provider.with_cache(cache, &config.cache);
        tracing::info!("Caching provider responses in {}", config.cache.location);
    }

    let state = AppState::new(Arc::new(provider));
    web::run(&config.server, state).await
}
