//! Open-Meteo client against a mocked climate API

use chrono::NaiveDate;
use climate_forecast::config::{CacheConfig, ProviderConfig};
use climate_forecast::timeseries::build_series;
use climate_forecast::{
    ClimateError, ClimateProvider, DailyRequest, Location, OpenMeteoClient, PersistentCache,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(server: &MockServer, max_retries: u32) -> ProviderConfig {
    ProviderConfig {
        base_url: format!("{}/v1/climate", server.uri()),
        timeout_seconds: 5,
        max_retries,
        backoff_min_ms: 1,
        backoff_max_ms: 5,
        ..ProviderConfig::default()
    }
}

fn request() -> DailyRequest {
    DailyRequest::new(
        Location::new(52.52, 13.41),
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
        &["CMCC_CM2_VHR4"],
        "temperature_2m_max",
    )
}

fn three_days() -> serde_json::Value {
    json!({
        "latitude": 52.5,
        "longitude": 13.4,
        "generationtime_ms": 0.5,
        "utc_offset_seconds": 0,
        "daily_units": { "time": "unixtime", "temperature_2m_max": "°C" },
        "daily": {
            "time": [1577836800, 1577923200, 1578009600],
            "temperature_2m_max": [10.0, 12.0, 11.0]
        }
    })
}

#[tokio::test]
async fn test_fetch_daily_builds_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .and(query_param("latitude", "52.52"))
        .and(query_param("longitude", "13.41"))
        .and(query_param("start_date", "2020-01-01"))
        .and(query_param("end_date", "2020-01-03"))
        .and(query_param("models", "CMCC_CM2_VHR4"))
        .and(query_param("daily", "temperature_2m_max"))
        .and(query_param("timeformat", "unixtime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_days()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoClient::new(&provider_config(&server, 0)).unwrap();
    let responses = client.fetch_daily(&request()).await.unwrap();
    assert_eq!(responses.len(), 1);

    let series = build_series(&responses[0], 0).unwrap();
    assert_eq!(
        series.date_strings(),
        vec!["2020-01-01", "2020-01-02", "2020-01-03"]
    );
    assert_eq!(series.values(), &[10.0, 12.0, 11.0]);
}

#[tokio::test]
async fn test_provider_error_reason_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": true,
            "reason": "Latitude must be in range of -90 to 90°."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoClient::new(&provider_config(&server, 3)).unwrap();
    let err = client.fetch_daily(&request()).await.unwrap_err();

    assert!(matches!(err, ClimateError::Upstream { .. }));
    assert!(err.to_string().contains("Latitude must be in range"));
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_days()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoClient::new(&provider_config(&server, 2)).unwrap();
    let responses = client.fetch_daily(&request()).await.unwrap();
    assert_eq!(responses[0].variable(0).unwrap().values().len(), 3);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = OpenMeteoClient::new(&provider_config(&server, 2)).unwrap();
    let err = client.fetch_daily(&request()).await.unwrap_err();
    assert!(matches!(err, ClimateError::Upstream { .. }));
}

#[tokio::test]
async fn test_malformed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = OpenMeteoClient::new(&provider_config(&server, 0)).unwrap();
    let err = client.fetch_daily(&request()).await.unwrap_err();
    assert!(matches!(err, ClimateError::Upstream { .. }));
}

#[tokio::test]
async fn test_cached_response_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_days()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = PersistentCache::open(dir.path()).unwrap();
    let client = OpenMeteoClient::new(&provider_config(&server, 0))
        .unwrap()
        .with_cache(cache, &CacheConfig::default());

    let first = client.fetch_daily(&request()).await.unwrap();
    let second = client.fetch_daily(&request()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unusable_payload_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "latitude": 1.0, "longitude": 1.0 })),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_days()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = PersistentCache::open(dir.path()).unwrap();
    let client = OpenMeteoClient::new(&provider_config(&server, 0))
        .unwrap()
        .with_cache(cache, &CacheConfig::default());

    let first = client.fetch_daily(&request()).await;
    assert!(matches!(first, Err(ClimateError::Upstream { .. })));

    let second = client.fetch_daily(&request()).await.unwrap();
    assert_eq!(second[0].variable(0).unwrap().values(), &[10.0, 12.0, 11.0]);
}

#[tokio::test]
async fn test_unreadable_cache_entry_falls_back_to_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/climate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_days()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = PersistentCache::open(dir.path()).unwrap();
    let client = OpenMeteoClient::new(&provider_config(&server, 0))
        .unwrap()
        .with_cache(cache.clone(), &CacheConfig::default());

    // An entry under the request URL that does not decode as a response body
    let url = client.request_url(&request());
    cache
        .put(&url, 42_u64, std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let responses = client.fetch_daily(&request()).await.unwrap();
    assert_eq!(responses[0].variable(0).unwrap().values(), &[10.0, 12.0, 11.0]);
}
