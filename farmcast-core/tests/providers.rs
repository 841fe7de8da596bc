//! Adapter tests against mock upstreams.
//!
//! Each test mounts a fixed provider payload on a wiremock server and checks
//! the normalized reading field by field.

use farmcast_core::{
    Coordinate, ProviderId, UnitSystem, WeatherError, WeatherProvider,
    provider::{GoogleWeatherProvider, OpenMeteoProvider, OpenWeatherProvider},
};
use reqwest::Client;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn delhi() -> Coordinate {
    Coordinate::new(28.6139, 77.209).unwrap()
}

fn openweather_payload() -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": 77.209, "lat": 28.6139},
        "weather": [
            {"id": 721, "main": "Haze", "description": "haze", "icon": "50d"},
            {"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}
        ],
        "base": "stations",
        "main": {
            "temp": 31.05,
            "feels_like": 35.2,
            "temp_min": 30.0,
            "temp_max": 32.1,
            "pressure": 1004,
            "humidity": 62
        },
        "visibility": 3000,
        "wind": {"speed": 2.57, "deg": 290},
        "clouds": {"all": 40},
        "dt": 1_726_574_400,
        "sys": {"country": "IN", "sunrise": 1_726_532_720, "sunset": 1_726_577_040},
        "timezone": 19800,
        "id": 1_273_294,
        "name": "Delhi",
        "cod": 200
    })
}

fn open_meteo_payload(code: i64) -> serde_json::Value {
    serde_json::json!({
        "latitude": 28.625,
        "longitude": 77.25,
        "utc_offset_seconds": 19800,
        "timezone": "Asia/Kolkata",
        "current_units": {"time": "unixtime", "temperature_2m": "°C"},
        "current": {
            "time": 1_726_574_400,
            "interval": 900,
            "temperature_2m": 29.4,
            "relative_humidity_2m": 74,
            "apparent_temperature": 33.8,
            "cloud_cover": 100,
            "pressure_msl": 1003.2,
            "wind_speed_10m": 3.1,
            "wind_direction_10m": 95,
            "weather_code": code
        }
    })
}

fn google_payload() -> serde_json::Value {
    serde_json::json!({
        "currentTime": "2025-01-28T22:04:12.025273178Z",
        "timeZone": {"id": "America/Los_Angeles"},
        "isDaytime": true,
        "weatherCondition": {
            "iconBaseUri": "https://maps.gstatic.com/weather/v1/sunny",
            "description": {"text": "Sunny", "languageCode": "en"},
            "type": "CLEAR"
        },
        "temperature": {"degrees": 13.7, "unit": "CELSIUS"},
        "feelsLikeTemperature": {"degrees": 13.1, "unit": "CELSIUS"},
        "relativeHumidity": 42,
        "airPressure": {"meanSeaLevelMillibars": 1019.16},
        "wind": {
            "direction": {"degrees": 335, "cardinal": "NORTH_NORTHWEST"},
            "speed": {"value": 18, "unit": "KILOMETERS_PER_HOUR"},
            "gust": {"value": 25, "unit": "KILOMETERS_PER_HOUR"}
        },
        "visibility": {"distance": 16, "unit": "KILOMETERS"},
        "cloudCover": 0,
        "currentConditionsHistory": {
            "maxTemperature": {"degrees": 14.3, "unit": "CELSIUS"},
            "minTemperature": {"degrees": 3.7, "unit": "CELSIUS"}
        }
    })
}

#[tokio::test]
async fn openweather_passes_units_and_normalizes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "28.6139"))
        .and(query_param("lon", "77.209"))
        .and(query_param("appid", "OW_KEY"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openweather_payload()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new(Client::new(), "OW_KEY".to_string())
        .with_endpoint(mock_server.uri());

    let reading = provider
        .fetch_current(&delhi(), UnitSystem::Imperial)
        .await
        .unwrap();

    assert_eq!(reading.source, ProviderId::OpenWeather);
    assert_eq!(reading.units, UnitSystem::Imperial);
    assert_eq!(reading.place_name.as_deref(), Some("Delhi"));
    assert_eq!(reading.timezone_offset_secs, 19800);
    assert_eq!(reading.observed_at, 1_726_574_400);

    assert_eq!(reading.conditions.len(), 2);
    assert_eq!(reading.conditions[0].id, 721);
    assert_eq!(reading.conditions[0].main, "Haze");
    assert_eq!(reading.conditions[1].description, "light rain");

    assert_eq!(reading.temperature.current, 31.05);
    assert_eq!(reading.temperature.feels_like, 35.2);
    assert_eq!(reading.temperature.min, 30.0);
    assert_eq!(reading.temperature.max, 32.1);
    assert_eq!(reading.atmosphere.pressure, 1004.0);
    assert_eq!(reading.atmosphere.humidity, 62.0);
    assert_eq!(reading.atmosphere.visibility, 3000.0);
    assert_eq!(reading.wind.speed, 2.57);
    assert_eq!(reading.wind.direction_degrees, 290.0);
    assert_eq!(reading.clouds.coverage_percent, 40.0);
}

#[tokio::test]
async fn openweather_non_success_is_upstream_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new(Client::new(), "BAD".to_string())
        .with_endpoint(mock_server.uri());

    let err = provider
        .fetch_current(&delhi(), UnitSystem::Metric)
        .await
        .unwrap_err();

    match err {
        WeatherError::UpstreamUnavailable {
            provider,
            status,
            detail,
        } => {
            assert_eq!(provider, ProviderId::OpenWeather);
            assert_eq!(status, Some(401));
            assert!(detail.contains("Invalid API key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn open_meteo_clear_sky_metric() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "28.6139"))
        .and(query_param("longitude", "77.209"))
        .and(query_param("timeformat", "unixtime"))
        .and(query_param("temperature_unit", "celsius"))
        .and(query_param("wind_speed_unit", "ms"))
        .and(query_param("daily", "temperature_2m_max,temperature_2m_min"))
        .and(query_param("forecast_days", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(open_meteo_payload(0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenMeteoProvider::new(Client::new()).with_endpoint(mock_server.uri());

    let reading = provider
        .fetch_current(&delhi(), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(reading.source, ProviderId::OpenMeteo);
    assert_eq!(reading.location, delhi());
    assert_eq!(reading.place_name, None);
    assert_eq!(reading.observed_at, 1_726_574_400);
    assert_eq!(reading.timezone_offset_secs, 19800);

    assert_eq!(reading.conditions.len(), 1);
    assert_eq!(reading.conditions[0].id, 800);
    assert_eq!(reading.conditions[0].main, "Clear");
    assert_eq!(reading.conditions[0].icon, "01d");

    assert_eq!(reading.temperature.current, 29.4);
    assert_eq!(reading.temperature.feels_like, 33.8);
    assert_eq!(reading.temperature.min, 29.4);
    assert_eq!(reading.temperature.max, 29.4);
    assert_eq!(reading.atmosphere.pressure, 1003.2);
    assert_eq!(reading.atmosphere.humidity, 74.0);
    assert_eq!(reading.atmosphere.visibility, 10_000.0);
    assert_eq!(reading.wind.speed, 3.1);
    assert_eq!(reading.wind.direction_degrees, 95.0);
    assert_eq!(reading.clouds.coverage_percent, 100.0);
}

#[tokio::test]
async fn open_meteo_thunderstorm_imperial() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("wind_speed_unit", "mph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(open_meteo_payload(95)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenMeteoProvider::new(Client::new()).with_endpoint(mock_server.uri());

    let reading = provider
        .fetch_current(&delhi(), UnitSystem::Imperial)
        .await
        .unwrap();

    assert_eq!(reading.units, UnitSystem::Imperial);
    assert_eq!(reading.conditions[0].id, 200);
    assert_eq!(reading.conditions[0].main, "Thunderstorm");
    assert_eq!(reading.conditions[0].icon, "11d");
}

#[tokio::test]
async fn open_meteo_malformed_body_is_upstream_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenMeteoProvider::new(Client::new()).with_endpoint(mock_server.uri());

    let err = provider
        .fetch_current(&delhi(), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WeatherError::UpstreamUnavailable {
            provider: ProviderId::OpenMeteo,
            status: Some(200),
            ..
        }
    ));
}

#[tokio::test]
async fn transport_failure_is_upstream_unavailable() {
    // Nothing listens on the discard port.
    let provider =
        OpenMeteoProvider::new(Client::new()).with_endpoint("http://127.0.0.1:9");

    let err = provider
        .fetch_current(&delhi(), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WeatherError::UpstreamUnavailable {
            provider: ProviderId::OpenMeteo,
            status: None,
            ..
        }
    ));
}

#[tokio::test]
async fn google_is_normalized_into_the_canonical_model() {
    let mock_server = MockServer::start().await;
    let here = Coordinate::new(37.4220, -122.0841).unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/currentConditions:lookup"))
        .and(query_param("location.latitude", "37.422"))
        .and(query_param("location.longitude", "-122.0841"))
        .and(query_param("unitsSystem", "METRIC"))
        .and(query_param("key", "G_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_payload()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = GoogleWeatherProvider::new(Client::new(), "G_KEY".to_string())
        .with_endpoint(mock_server.uri());

    let reading = provider.fetch_current(&here, UnitSystem::Metric).await.unwrap();

    assert_eq!(reading.source, ProviderId::Google);
    assert_eq!(reading.location, here);
    assert_eq!(reading.observed_at, 1_738_101_852);

    assert_eq!(reading.conditions.len(), 1);
    assert_eq!(reading.conditions[0].id, 800);
    assert_eq!(reading.conditions[0].main, "Clear");
    assert_eq!(reading.conditions[0].description, "Sunny");
    assert_eq!(reading.conditions[0].icon, "01d");

    assert_eq!(reading.temperature.current, 13.7);
    assert_eq!(reading.temperature.feels_like, 13.1);
    assert_eq!(reading.temperature.min, 3.7);
    assert_eq!(reading.temperature.max, 14.3);
    assert_eq!(reading.atmosphere.pressure, 1019.16);
    assert_eq!(reading.atmosphere.humidity, 42.0);
    assert_eq!(reading.atmosphere.visibility, 16_000.0);
    assert!((reading.wind.speed - 5.0).abs() < 1e-9);
    assert_eq!(reading.wind.direction_degrees, 335.0);
    assert_eq!(reading.clouds.coverage_percent, 0.0);
}

#[tokio::test]
async fn google_standard_units_are_kelvin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/currentConditions:lookup"))
        .and(query_param("unitsSystem", "METRIC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_payload()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = GoogleWeatherProvider::new(Client::new(), "G_KEY".to_string())
        .with_endpoint(mock_server.uri());

    let reading = provider
        .fetch_current(&delhi(), UnitSystem::Standard)
        .await
        .unwrap();

    assert_eq!(reading.units, UnitSystem::Standard);
    assert!((reading.temperature.current - 286.85).abs() < 1e-9);
    assert!((reading.temperature.min - 276.85).abs() < 1e-9);
}
