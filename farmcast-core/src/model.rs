use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::WeatherError, provider::ProviderId};

/// Sea-level pressure used when a provider does not report one (hPa).
pub const DEFAULT_PRESSURE_HPA: f64 = 1013.0;
/// Visibility used when a provider does not report one (metres).
pub const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

const KELVIN_OFFSET: f64 = 273.15;

/// A validated geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        check_range("lat", lat, 90.0)?;
        check_range("lon", lon, 180.0)?;
        Ok(Self { lat, lon })
    }

    /// Parse a pair of free-form strings as received at the request boundary.
    pub fn parse(
        lat_name: &'static str,
        lat: Option<&str>,
        lon_name: &'static str,
        lon: Option<&str>,
    ) -> Result<Self, WeatherError> {
        let lat_raw = required(lat_name, lat)?;
        let lon_raw = required(lon_name, lon)?;

        let lat = parse_degrees(lat_name, lat_raw)?;
        let lon = parse_degrees(lon_name, lon_raw)?;

        check_range(lat_name, lat, 90.0)?;
        check_range(lon_name, lon, 180.0)?;

        Ok(Self { lat, lon })
    }
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, WeatherError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(WeatherError::MissingParameter(name)),
    }
}

fn parse_degrees(name: &'static str, raw: &str) -> Result<f64, WeatherError> {
    let value: f64 = raw.parse().map_err(|_| WeatherError::InvalidParameter {
        name,
        value: raw.to_string(),
        reason: "not a decimal number".to_string(),
    })?;

    if !value.is_finite() {
        return Err(WeatherError::InvalidParameter {
            name,
            value: raw.to_string(),
            reason: "not a finite number".to_string(),
        });
    }

    Ok(value)
}

fn check_range(name: &'static str, value: f64, limit: f64) -> Result<(), WeatherError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(WeatherError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "out of range".to_string(),
        })
    }
}

/// Unit convention for every number in a reading.
///
/// | system   | temperature | wind speed |
/// |----------|-------------|------------|
/// | standard | K           | m/s        |
/// | metric   | °C          | m/s        |
/// | imperial | °F          | mph        |
///
/// Pressure is always hPa and visibility always metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Standard,
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Standard => "standard",
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// Parse an optional boundary value; absent or blank means the default.
    pub fn parse_param(name: &'static str, raw: Option<&str>) -> Result<Self, WeatherError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) => value.parse().map_err(|_| WeatherError::InvalidParameter {
                name,
                value: value.to_string(),
                reason: "expected one of standard, metric, imperial".to_string(),
            }),
        }
    }

    /// Convert a Celsius reading into this system's temperature unit.
    ///
    /// Only meaningful for `Standard` and `Metric`; imperial values are
    /// requested in Fahrenheit from the upstream directly.
    pub(crate) fn convert_celsius(&self, celsius: f64) -> f64 {
        match self {
            UnitSystem::Standard => celsius + KELVIN_OFFSET,
            UnitSystem::Metric | UnitSystem::Imperial => celsius,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(UnitSystem::Standard),
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(format!("Unknown unit system '{s}'")),
        }
    }
}

/// One sky condition in the canonical vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

impl Temperature {
    /// Fill the optional fields from `current` when the provider omits them.
    pub(crate) fn from_parts(
        current: f64,
        feels_like: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self {
            current,
            feels_like: finite_or(feels_like, current),
            min: finite_or(min, current),
            max: finite_or(max, current),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    /// hPa
    pub pressure: f64,
    /// percent
    pub humidity: f64,
    /// metres
    pub visibility: f64,
}

impl Atmosphere {
    pub(crate) fn from_parts(
        pressure: Option<f64>,
        humidity: Option<f64>,
        visibility: Option<f64>,
    ) -> Self {
        Self {
            pressure: finite_or(pressure, DEFAULT_PRESSURE_HPA),
            humidity: finite_or(humidity, 0.0),
            visibility: finite_or(visibility, DEFAULT_VISIBILITY_M),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub direction_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub coverage_percent: f64,
}

/// Provider-independent current conditions for one point.
///
/// Built fresh for every request and handed back to the caller as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalWeatherReading {
    pub location: Coordinate,
    pub place_name: Option<String>,
    /// Most significant first; never empty.
    pub conditions: Vec<Condition>,
    pub temperature: Temperature,
    pub atmosphere: Atmosphere,
    pub wind: Wind,
    pub clouds: Clouds,
    /// Unix seconds.
    pub observed_at: i64,
    pub timezone_offset_secs: i64,
    pub units: UnitSystem,
    pub source: ProviderId,
}

/// Replace a missing or non-finite upstream number with `default`.
pub(crate) fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}
