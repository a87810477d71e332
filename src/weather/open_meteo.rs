//! Open-Meteo climate API client
//!
//! Requests go through `reqwest-middleware` with transient-failure retries
//! and exponential backoff. Bodies that parse into daily blocks are cached on disk
//! keyed by request URL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::ClimateProvider;
use crate::cache::{PersistentCache, jittered};
use crate::config::{CacheConfig, ProviderConfig};
use crate::models::{DailyRequest, DailyResponse, DailyVariable, Location};
use crate::{ClimateError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Client for the Open-Meteo climate endpoint
pub struct OpenMeteoClient {
    http: ClientWithMiddleware,
    base_url: String,
    cache: Option<PersistentCache>,
    cache_ttl: Duration,
}

impl OpenMeteoClient {
    /// Create a client with the configured timeout and retry policy
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClimateError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(
                Duration::from_millis(config.backoff_min_ms),
                Duration::from_millis(config.backoff_max_ms),
            )
            .build_with_max_retries(config.max_retries);

        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: None,
            cache_ttl: Duration::ZERO,
        })
    }

    /// Cache successful response bodies for the configured TTL
    #[must_use]
    pub fn with_cache(mut self, cache: PersistentCache, config: &CacheConfig) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = config.ttl();
        self
    }

    /// Full request URL, also used as the cache key
    #[must_use]
    pub fn request_url(&self, request: &DailyRequest) -> String {
        format!(
            "{}?latitude={}&longitude={}&start_date={}&end_date={}&models={}&daily={}&timeformat=unixtime",
            self.base_url,
            request.location.latitude,
            request.location.longitude,
            request.start_date.format("%Y-%m-%d"),
            request.end_date.format("%Y-%m-%d"),
            urlencoding::encode(&request.models.join(",")),
            urlencoding::encode(&request.variable),
        )
    }

    async fn cached_body(&self, url: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get::<String>(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Ignoring unreadable cache entry: {e:#}");
                None
            }
        }
    }

    async fn store_body(&self, url: &str, body: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, body.to_string(), jittered(self.cache_ttl)).await {
                warn!("Failed to cache provider response: {e:#}");
            }
        }
    }

    #[instrument(skip(self))]
    async fn fetch_body(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClimateError::upstream(format!("Request to climate API failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ClimateError::upstream(format!("Failed to read climate API response: {e}"))
        })?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|err| err.reason)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(ClimateError::upstream(format!(
                "Climate API returned {status}: {reason}"
            )));
        }

        let elapsed = start_time.elapsed();
        info!(
            "Climate API responded in {:.3}s ({} bytes)",
            elapsed.as_secs_f64(),
            body.len()
        );
        if elapsed.as_secs() > 10 {
            warn!("Slow climate API response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(body)
    }
}

#[async_trait]
impl ClimateProvider for OpenMeteoClient {
    #[instrument(skip(self, request), fields(location = %request.location.format_coordinates(), models = request.models.len()))]
    async fn fetch_daily(&self, request: &DailyRequest) -> Result<Vec<DailyResponse>> {
        let url = self.request_url(request);
        if let Some(body) = self.cached_body(&url).await {
            match parse_body(&body, request) {
                Ok(responses) => {
                    debug!("Serving provider response from cache");
                    return Ok(responses);
                }
                Err(e) => warn!("Discarding unusable cache entry: {e}"),
            }
        }

        let body = self.fetch_body(&url).await?;
        let responses = parse_body(&body, request)?;
        self.store_body(&url, &body).await;
        Ok(responses)
    }
}

fn parse_body(body: &str, request: &DailyRequest) -> Result<Vec<DailyResponse>> {
    let response: ClimateApiResponse = serde_json::from_str(body)
        .map_err(|e| ClimateError::upstream(format!("Invalid climate API response: {e}")))?;
    daily_responses(response, request)
}

/// Climate API response with `timeformat=unixtime`
#[derive(Debug, Deserialize)]
struct ClimateApiResponse {
    latitude: f64,
    longitude: f64,
    daily: Option<DailyPayload>,
}

#[derive(Debug, Deserialize)]
struct DailyPayload {
    time: Vec<i64>,
    /// One array per variable; suffixed `_{MODEL}` when several models are requested
    #[serde(flatten)]
    series: HashMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: String,
}

/// Split a multi-model payload into one daily block per requested model
fn daily_responses(
    response: ClimateApiResponse,
    request: &DailyRequest,
) -> Result<Vec<DailyResponse>> {
    let daily = response
        .daily
        .ok_or_else(|| ClimateError::upstream("Climate API response has no daily block"))?;

    let (Some(first), Some(last)) = (daily.time.first(), daily.time.last()) else {
        return Err(ClimateError::upstream(
            "Climate API daily block has no timestamps",
        ));
    };
    let interval = match daily.time.as_slice() {
        [a, b, ..] => b.checked_sub(*a).ok_or_else(|| {
            ClimateError::upstream(format!("Climate API timestamps {a} and {b} overflow"))
        })?,
        _ => SECONDS_PER_DAY,
    };
    let end = last.checked_add(interval).ok_or_else(|| {
        ClimateError::upstream(format!("Climate API block end after {last} overflows"))
    })?;
    let location = Location::new(response.latitude, response.longitude);

    request
        .models
        .iter()
        .map(|model| {
            let suffixed = format!("{}_{model}", request.variable);
            let values = daily
                .series
                .get(&suffixed)
                .or_else(|| {
                    (request.models.len() == 1)
                        .then(|| daily.series.get(&request.variable))
                        .flatten()
                })
                .ok_or_else(|| {
                    ClimateError::upstream(format!(
                        "Climate API response is missing '{}' for model {model}",
                        request.variable
                    ))
                })?;

            let values = values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            Ok(DailyResponse::new(
                model.clone(),
                location,
                *first,
                end,
                interval,
                vec![DailyVariable::new(request.variable.clone(), values)],
            ))
        })
        .collect()
}
