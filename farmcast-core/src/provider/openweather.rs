use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    classify::fallback_condition,
    error::WeatherError,
    model::{
        Atmosphere, CanonicalWeatherReading, Clouds, Condition, Coordinate, Temperature,
        UnitSystem, Wind, finite_or,
    },
};

use super::{ProviderId, WeatherProvider, endpoint_url, get_json, unix_now};

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org";
const CURRENT_PATH: &str = "/data/2.5/weather";

/// Keyed OpenWeather "current weather" API.
///
/// Supports all three unit systems natively and already speaks the
/// canonical condition vocabulary, so conditions are passed through.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl OpenWeatherProvider {
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

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: Option<i32>,
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: Option<OwCoord>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    main: Option<OwMain>,
    visibility: Option<f64>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    dt: Option<i64>,
    timezone: Option<i64>,
    name: Option<String>,
}

impl OwWeather {
    /// Entries without an id carry nothing to classify on and are dropped.
    fn into_condition(self) -> Option<Condition> {
        let id = self.id?;
        let main = self.main.filter(|s| !s.is_empty())?;
        let description = self
            .description
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| main.clone());
        let icon = self
            .icon
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_condition().icon);

        Some(Condition {
            id,
            main,
            description,
            icon,
        })
    }
}

fn normalize(
    parsed: OwCurrentResponse,
    requested: &Coordinate,
    units: UnitSystem,
) -> Result<CanonicalWeatherReading, WeatherError> {
    let main = parsed.main.unwrap_or_default();
    let current = main
        .temp
        .filter(|t| t.is_finite())
        .ok_or_else(|| {
            WeatherError::upstream(
                ProviderId::OpenWeather,
                None,
                "OpenWeather response contained no current temperature",
            )
        })?;

    let location = parsed
        .coord
        .and_then(|c| Coordinate::new(c.lat?, c.lon?).ok())
        .unwrap_or(*requested);

    let mut conditions: Vec<Condition> = parsed
        .weather
        .into_iter()
        .filter_map(OwWeather::into_condition)
        .collect();
    if conditions.is_empty() {
        conditions.push(fallback_condition());
    }

    Ok(CanonicalWeatherReading {
        location,
        place_name: parsed.name.filter(|n| !n.trim().is_empty()),
        conditions,
        temperature: Temperature::from_parts(
            current,
            main.feels_like,
            main.temp_min,
            main.temp_max,
        ),
        atmosphere: Atmosphere::from_parts(main.pressure, main.humidity, parsed.visibility),
        wind: Wind {
            speed: finite_or(parsed.wind.speed, 0.0),
            direction_degrees: finite_or(parsed.wind.deg, 0.0),
        },
        clouds: Clouds {
            coverage_percent: finite_or(parsed.clouds.all, 0.0),
        },
        observed_at: parsed.dt.unwrap_or_else(unix_now),
        timezone_offset_secs: parsed.timezone.unwrap_or(0),
        units,
        source: ProviderId::OpenWeather,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch_current(
        &self,
        coord: &Coordinate,
        units: UnitSystem,
    ) -> Result<CanonicalWeatherReading, WeatherError> {
        let url = endpoint_url(&self.endpoint, CURRENT_PATH);

        let parsed: OwCurrentResponse = get_json(
            &self.http,
            ProviderId::OpenWeather,
            &url,
            &[
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", units.as_str().to_string()),
            ],
        )
        .await?;

        normalize(parsed, coord, units)
    }
}
