//! Amap client behaviour against a mock REST endpoint.

use std::time::Duration;

use nimbus_core::{
    GeoPoint, LocationProvider, LocationSource, WeatherProvider, WeatherSnapshot, WeatherSource,
};
use nimbus_enrich::{AmapClient, AmapConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tiananmen() -> GeoPoint {
    GeoPoint::new(39.9087, 116.3974).unwrap()
}

fn client(server: &MockServer) -> AmapClient {
    AmapClient::new(AmapConfig::with_key(server.uri(), "test-key")).unwrap()
}

fn regeo_body() -> serde_json::Value {
    serde_json::json!({
        "status": "1",
        "info": "OK",
        "infocode": "10000",
        "regeocode": {
            "formatted_address": "北京市东城区东华门街道天安门广场",
            "addressComponent": {
                "country": "中国",
                "province": "北京市",
                "city": [],
                "citycode": "010",
                "district": "东城区",
                "adcode": "110101"
            }
        }
    })
}

fn weather_body() -> serde_json::Value {
    serde_json::json!({
        "status": "1",
        "count": "1",
        "info": "OK",
        "infocode": "10000",
        "lives": [{
            "province": "北京",
            "city": "东城区",
            "adcode": "110101",
            "weather": "晴",
            "temperature": "22",
            "winddirection": "南",
            "windpower": "≤3",
            "humidity": "30",
            "reporttime": "2025-05-01 08:00:00"
        }]
    })
}

async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/geocode/regeo"))
        .and(query_param("location", "116.397400,39.908700"))
        .and(query_param("key", "test-key"))
        .and(query_param("extensions", "base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regeo_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/weatherInfo"))
        .and(query_param("city", "110101"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_reverse_geocode_beijing() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let location = client(&server).reverse_geocode(&tiananmen()).await;
    assert!(location.formatted_address.contains("天安门广场"));
    assert_eq!(location.city, "东城区");
    assert_eq!(location.country, "中国");
    assert_eq!(location.source, LocationSource::Geocoded);
}

#[tokio::test]
async fn test_city_code_and_weather() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    let amap = client(&server);

    assert_eq!(amap.city_code(&tiananmen()).await, "110101");

    let weather = amap.current_weather(&tiananmen()).await;
    assert_eq!(weather.description, "晴");
    assert_eq!(weather.condition, "晴");
    assert_eq!(weather.icon_key, "clear");
    assert_eq!(weather.temperature_celsius, 22.0);
    assert_eq!(weather.source, WeatherSource::Live);
}

#[tokio::test]
async fn test_enrich_runs_both_lookups() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let (location, weather) = client(&server).enrich(&tiananmen()).await;
    assert!(location.is_geocoded());
    assert!(weather.is_live());
}

#[tokio::test]
async fn test_http_500_yields_documented_fallbacks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let amap = client(&server);

    let (location, weather) = amap.enrich(&tiananmen()).await;
    assert_eq!(location.formatted_address, "位置 39.9087, 116.3974");
    assert_eq!(location.city, "未知城市");
    assert_eq!(location.country, "中国");
    assert!(!location.is_geocoded());

    assert_eq!(weather, WeatherSnapshot::fallback());
    assert_eq!(weather.condition, "Clouds");
    assert_eq!(weather.description, "多云");
    assert_eq!(weather.icon_key, "02d");
    assert_eq!(weather.temperature_celsius, 22.5);

    assert_eq!(amap.city_code(&tiananmen()).await, "110101");
}

#[tokio::test]
async fn test_status_zero_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/regeo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "0",
            "info": "INVALID_USER_KEY",
            "infocode": "10001"
        })))
        .mount(&server)
        .await;

    let location = client(&server).reverse_geocode(&tiananmen()).await;
    assert_eq!(location.formatted_address, "位置 39.9087, 116.3974");
    assert!(!location.is_geocoded());
}

#[tokio::test]
async fn test_city_code_falls_back_to_configured_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/regeo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "1",
            "info": "OK",
            "regeocode": { "formatted_address": [], "addressComponent": { "adcode": [] } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/weatherInfo"))
        .and(query_param("city", "310000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "1",
            "lives": [{ "weather": "小雨", "temperature": "17" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let amap = AmapClient::new(AmapConfig {
        default_city_code: "310000".to_string(),
        ..AmapConfig::with_key(server.uri(), "test-key")
    })
    .unwrap();

    let location = amap.reverse_geocode(&tiananmen()).await;
    assert!(!location.is_geocoded());

    let weather = amap.current_weather(&tiananmen()).await;
    assert_eq!(weather.icon_key, "rain");
    assert_eq!(weather.temperature_celsius, 17.0);
}

#[tokio::test]
async fn test_malformed_weather_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/regeo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regeo_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/weatherInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let weather = client(&server).current_weather(&tiananmen()).await;
    assert_eq!(weather, WeatherSnapshot::fallback());
}

#[tokio::test]
async fn test_unparseable_temperature_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/regeo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regeo_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/weatherInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "1",
            "lives": [{ "weather": "晴", "temperature": "warm" }]
        })))
        .mount(&server)
        .await;

    let weather = client(&server).current_weather(&tiananmen()).await;
    assert!(!weather.is_live());
}

#[tokio::test]
async fn test_empty_lives_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/regeo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regeo_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/weatherInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "1",
            "lives": []
        })))
        .mount(&server)
        .await;

    let weather = client(&server).current_weather(&tiananmen()).await;
    assert_eq!(weather, WeatherSnapshot::fallback());
}

#[tokio::test]
async fn test_missing_key_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regeo_body()))
        .expect(0)
        .mount(&server)
        .await;

    let amap = AmapClient::new(AmapConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();
    let (location, weather) = amap.enrich(&tiananmen()).await;
    assert!(!location.is_geocoded());
    assert!(!weather.is_live());
}

#[tokio::test]
async fn test_slow_provider_times_out_to_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(regeo_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let amap = AmapClient::new(AmapConfig {
        timeout_seconds: 1,
        ..AmapConfig::with_key(server.uri(), "test-key")
    })
    .unwrap();
    let location = amap.reverse_geocode(&tiananmen()).await;
    assert!(!location.is_geocoded());
}
