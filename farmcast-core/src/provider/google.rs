use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    classify::{classify_google, fallback_condition},
    error::WeatherError,
    model::{
        Atmosphere, CanonicalWeatherReading, Clouds, Coordinate, Temperature, UnitSystem, Wind,
        finite_or,
    },
};

use super::{ProviderId, WeatherProvider, endpoint_url, get_json, rfc3339_to_unix, unix_now};

pub const DEFAULT_ENDPOINT: &str = "https://weather.googleapis.com";
const LOOKUP_PATH: &str = "/v1/currentConditions:lookup";

const METRES_PER_KM: f64 = 1000.0;
const METRES_PER_MILE: f64 = 1609.344;

/// Google Weather `currentConditions:lookup`.
///
/// Speaks its own vocabulary (`location.latitude`, `unitsSystem=METRIC`,
/// enumerated condition types, km/h winds) which is normalized here into
/// the same shape the other adapters produce.
#[derive(Debug, Clone)]
pub struct GoogleWeatherProvider {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl GoogleWeatherProvider {
    pub fn new(http: Client, api_key: String) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Google only knows METRIC and IMPERIAL.
fn units_system(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Imperial => "IMPERIAL",
        UnitSystem::Metric | UnitSystem::Standard => "METRIC",
    }
}

#[derive(Debug, Deserialize)]
struct GTemperature {
    degrees: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GDescription {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GCondition {
    description: Option<GDescription>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GAirPressure {
    mean_sea_level_millibars: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GWindDirection {
    degrees: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GWindSpeed {
    value: Option<f64>,
    unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GWind {
    direction: Option<GWindDirection>,
    speed: Option<GWindSpeed>,
}

#[derive(Debug, Deserialize)]
struct GVisibility {
    distance: Option<f64>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GHistory {
    max_temperature: Option<GTemperature>,
    min_temperature: Option<GTemperature>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GCurrentConditions {
    current_time: Option<String>,
    weather_condition: Option<GCondition>,
    temperature: Option<GTemperature>,
    feels_like_temperature: Option<GTemperature>,
    relative_humidity: Option<f64>,
    air_pressure: Option<GAirPressure>,
    #[serde(default)]
    wind: GWind,
    visibility: Option<GVisibility>,
    cloud_cover: Option<f64>,
    current_conditions_history: Option<GHistory>,
}

fn degrees(t: Option<GTemperature>) -> Option<f64> {
    t.and_then(|t| t.degrees).filter(|d| d.is_finite())
}

/// Wind speed in the canonical unit: m/s for metric, mph for imperial.
fn wind_speed(speed: Option<GWindSpeed>) -> Option<f64> {
    let speed = speed?;
    let value = speed.value?;
    match speed.unit.as_deref() {
        Some("MILES_PER_HOUR") => Some(value),
        // KILOMETERS_PER_HOUR is the METRIC default.
        _ => Some(value / 3.6),
    }
}

fn visibility_metres(v: Option<GVisibility>) -> Option<f64> {
    let v = v?;
    let distance = v.distance?;
    match v.unit.as_deref() {
        Some("MILES") => Some(distance * METRES_PER_MILE),
        _ => Some(distance * METRES_PER_KM),
    }
}

fn normalize(
    parsed: GCurrentConditions,
    requested: &Coordinate,
    units: UnitSystem,
) -> Result<CanonicalWeatherReading, WeatherError> {
    let current = degrees(parsed.temperature).ok_or_else(|| {
        WeatherError::upstream(
            ProviderId::Google,
            None,
            "Google Weather response contained no current temperature",
        )
    })?;
    let to_units = |c: f64| units.convert_celsius(c);

    let (min, max) = match parsed.current_conditions_history {
        Some(h) => (degrees(h.min_temperature), degrees(h.max_temperature)),
        None => (None, None),
    };

    let condition = match parsed.weather_condition {
        Some(GCondition { kind, description }) => {
            let mut c = classify_google(kind.as_deref().unwrap_or_default());
            // Provider wording only refines a recognized condition.
            let text = description
                .and_then(|d| d.text)
                .filter(|t| !t.trim().is_empty() && c != fallback_condition());
            if let Some(text) = text {
                c.description = text;
            }
            c
        }
        None => fallback_condition(),
    };

    Ok(CanonicalWeatherReading {
        location: *requested,
        place_name: None,
        conditions: vec![condition],
        temperature: Temperature::from_parts(
            to_units(current),
            degrees(parsed.feels_like_temperature).map(to_units),
            min.map(to_units),
            max.map(to_units),
        ),
        atmosphere: Atmosphere::from_parts(
            parsed.air_pressure.and_then(|p| p.mean_sea_level_millibars),
            parsed.relative_humidity,
            visibility_metres(parsed.visibility),
        ),
        wind: Wind {
            speed: finite_or(wind_speed(parsed.wind.speed), 0.0),
            direction_degrees: finite_or(parsed.wind.direction.and_then(|d| d.degrees), 0.0),
        },
        clouds: Clouds {
            coverage_percent: finite_or(parsed.cloud_cover, 0.0),
        },
        observed_at: parsed
            .current_time
            .as_deref()
            .and_then(rfc3339_to_unix)
            .unwrap_or_else(unix_now),
        timezone_offset_secs: 0,
        units,
        source: ProviderId::Google,
    })
}

#[async_trait]
impl WeatherProvider for GoogleWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn fetch_current(
        &self,
        coord: &Coordinate,
        units: UnitSystem,
    ) -> Result<CanonicalWeatherReading, WeatherError> {
        let url = endpoint_url(&self.endpoint, LOOKUP_PATH);

        let parsed: GCurrentConditions = get_json(
            &self.http,
            ProviderId::Google,
            &url,
            &[
                ("location.latitude", coord.lat.to_string()),
                ("location.longitude", coord.lon.to_string()),
                ("unitsSystem", units_system(units).to_string()),
                ("key", self.api_key.clone()),
            ],
        )
        .await?;

        normalize(parsed, coord, units)
    }
}
