use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    classify::{classify_wmo, fallback_condition},
    error::WeatherError,
    model::{
        Atmosphere, CanonicalWeatherReading, Clouds, Coordinate, Temperature, UnitSystem, Wind,
        finite_or,
    },
};

use super::{ProviderId, WeatherProvider, endpoint_url, get_json, unix_now};

pub const DEFAULT_ENDPOINT: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
cloud_cover,pressure_msl,wind_speed_10m,wind_direction_10m,weather_code,visibility";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";

/// Open-Meteo forecast API: the current block plus today's min/max. Needs
/// no credential.
///
/// Open-Meteo can answer in Celsius or Fahrenheit and in m/s or mph, but
/// has no Kelvin option: `standard` is fetched in Celsius and shifted
/// locally. It reports no place name. Visibility always comes in metres.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    endpoint: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(http: Client) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn unit_params(units: UnitSystem) -> (&'static str, &'static str) {
    match units {
        UnitSystem::Imperial => ("fahrenheit", "mph"),
        UnitSystem::Metric | UnitSystem::Standard => ("celsius", "ms"),
    }
}

#[derive(Debug, Default, Deserialize)]
struct OmCurrent {
    time: Option<i64>,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    cloud_cover: Option<f64>,
    pressure_msl: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    weather_code: Option<f64>,
    visibility: Option<f64>,
}

/// One-day `daily` block; each series holds a single entry, possibly null.
#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

fn first_finite(series: &[Option<f64>]) -> Option<f64> {
    series.first().copied().flatten().filter(|v| v.is_finite())
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: Option<OmCurrent>,
    daily: Option<OmDaily>,
    utc_offset_seconds: Option<i64>,
}

fn normalize(
    parsed: OmResponse,
    requested: &Coordinate,
    units: UnitSystem,
) -> Result<CanonicalWeatherReading, WeatherError> {
    let current = parsed.current.unwrap_or_default();
    let daily = parsed.daily.unwrap_or_default();

    let temp = current
        .temperature_2m
        .filter(|t| t.is_finite())
        .ok_or_else(|| {
            WeatherError::upstream(
                ProviderId::OpenMeteo,
                None,
                "Open-Meteo response contained no current temperature",
            )
        })?;
    let to_units = |c: f64| units.convert_celsius(c);

    // WMO codes are integral; anything else is not classifiable.
    let condition = current
        .weather_code
        .filter(|c| c.is_finite() && c.fract() == 0.0)
        .map(|c| classify_wmo(c as i64))
        .unwrap_or_else(fallback_condition);

    Ok(CanonicalWeatherReading {
        location: *requested,
        place_name: None,
        conditions: vec![condition],
        temperature: Temperature::from_parts(
            to_units(temp),
            current.apparent_temperature.map(to_units),
            first_finite(&daily.temperature_2m_min).map(to_units),
            first_finite(&daily.temperature_2m_max).map(to_units),
        ),
        atmosphere: Atmosphere::from_parts(
            current.pressure_msl,
            current.relative_humidity_2m,
            current.visibility,
        ),
        wind: Wind {
            speed: finite_or(current.wind_speed_10m, 0.0),
            direction_degrees: finite_or(current.wind_direction_10m, 0.0),
        },
        clouds: Clouds {
            coverage_percent: finite_or(current.cloud_cover, 0.0),
        },
        observed_at: current.time.unwrap_or_else(unix_now),
        timezone_offset_secs: parsed.utc_offset_seconds.unwrap_or(0),
        units,
        source: ProviderId::OpenMeteo,
    })
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn fetch_current(
        &self,
        coord: &Coordinate,
        units: UnitSystem,
    ) -> Result<CanonicalWeatherReading, WeatherError> {
        let url = endpoint_url(&self.endpoint, FORECAST_PATH);
        let (temperature_unit, wind_speed_unit) = unit_params(units);

        let parsed: OmResponse = get_json(
            &self.http,
            ProviderId::OpenMeteo,
            &url,
            &[
                ("latitude", coord.lat.to_string()),
                ("longitude", coord.lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", "auto".to_string()),
                ("timeformat", "unixtime".to_string()),
                ("temperature_unit", temperature_unit.to_string()),
                ("wind_speed_unit", wind_speed_unit.to_string()),
            ],
        )
        .await?;

        normalize(parsed, coord, units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delhi() -> Coordinate {
        Coordinate::new(28.6139, 77.209).expect("valid coordinate")
    }

    #[test]
    fn unit_params_never_ask_for_kmh() {
        assert_eq!(unit_params(UnitSystem::Metric), ("celsius", "ms"));
        assert_eq!(unit_params(UnitSystem::Standard), ("celsius", "ms"));
        assert_eq!(unit_params(UnitSystem::Imperial), ("fahrenheit", "mph"));
    }

    #[test]
    fn missing_weather_code_uses_fallback_condition() {
        let parsed: OmResponse =
            serde_json::from_str(r#"{"current":{"temperature_2m":30.0}}"#).expect("valid json");

        let reading = normalize(parsed, &delhi(), UnitSystem::Metric).expect("normalizes");
        assert_eq!(reading.conditions, vec![fallback_condition()]);
        assert_eq!(reading.temperature.feels_like, 30.0);
        assert_eq!(reading.place_name, None);
        assert_eq!(reading.location, delhi());
    }

    #[test]
    fn standard_units_are_kelvin() {
        let parsed: OmResponse = serde_json::from_str(
            r#"{"current":{"temperature_2m":0.0,"apparent_temperature":-2.0,"weather_code":3}}"#,
        )
        .expect("valid json");

        let reading = normalize(parsed, &delhi(), UnitSystem::Standard).expect("normalizes");
        assert_eq!(reading.temperature.current, 273.15);
        assert_eq!(reading.temperature.feels_like, 271.15);
        assert_eq!(reading.temperature.min, 273.15);
        assert_eq!(reading.conditions[0].id, 804);
        assert_eq!(reading.units, UnitSystem::Standard);
    }

    #[test]
    fn daily_range_and_visibility_are_used_when_present() {
        let parsed: OmResponse = serde_json::from_str(
            r#"{
                "current": {"temperature_2m": 10.0, "weather_code": 0, "visibility": 24140.0},
                "daily": {
                    "time": [1726531200],
                    "temperature_2m_max": [14.5],
                    "temperature_2m_min": [4.0]
                }
            }"#,
        )
        .expect("valid json");

        let reading = normalize(parsed, &delhi(), UnitSystem::Standard).expect("normalizes");
        assert_eq!(reading.temperature.min, 277.15);
        assert_eq!(reading.temperature.max, 287.65);
        assert_eq!(reading.atmosphere.visibility, 24_140.0);
    }

    #[test]
    fn null_daily_entries_fall_back_to_current() {
        let parsed: OmResponse = serde_json::from_str(
            r#"{
                "current": {"temperature_2m": 10.0},
                "daily": {"temperature_2m_max": [null], "temperature_2m_min": []}
            }"#,
        )
        .expect("valid json");

        let reading = normalize(parsed, &delhi(), UnitSystem::Metric).expect("normalizes");
        assert_eq!(reading.temperature.min, 10.0);
        assert_eq!(reading.temperature.max, 10.0);
        assert_eq!(reading.atmosphere.visibility, 10_000.0);
    }

    #[test]
    fn empty_current_block_is_an_upstream_failure() {
        let parsed: OmResponse = serde_json::from_str(r#"{"current":{}}"#).expect("valid json");
        let err = normalize(parsed, &delhi(), UnitSystem::Metric).unwrap_err();
        assert!(matches!(
            err,
            WeatherError::UpstreamUnavailable { provider: ProviderId::OpenMeteo, .. }
        ));
    }
}
