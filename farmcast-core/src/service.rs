//! Request boundary: raw query strings in, `{ok, data|error}` envelope out.
//!
//! Nothing escapes this layer as an `Err`. Validation failures stop before
//! any provider is constructed, and upstream diagnostics are logged here
//! rather than returned.

use std::sync::Arc;

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::WeatherError,
    model::{CanonicalWeatherReading, Coordinate, UnitSystem},
    select::{EntryPoint, select_adapter},
};

/// Query of `GET /weather/current`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub units: Option<String>,
}

/// Query of `GET /weather`, which names its fields differently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    #[serde(rename = "unitsSystem")]
    pub units_system: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CanonicalWeatherReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(data: CanonicalWeatherReading) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Envelope plus the status class it should be delivered with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl Reply {
    fn from_result(result: Result<CanonicalWeatherReading, WeatherError>) -> Self {
        match result {
            Ok(reading) => Reply {
                status: StatusCode::OK,
                envelope: Envelope::success(reading),
            },
            Err(err) => Self::from_error(err),
        }
    }

    /// Failure reply; the full diagnostic is logged, only the public message is returned.
    pub fn from_error(err: WeatherError) -> Self {
        if err.is_client_error() {
            tracing::warn!(error = %err, "rejected weather request");
        } else {
            tracing::error!(error = %err, "weather request failed");
        }
        Reply {
            status: err.status_code(),
            envelope: Envelope::failure(err.public_message()),
        }
    }
}

/// Shared by all concurrent requests; holds only read-only state.
#[derive(Debug, Clone)]
pub struct WeatherService {
    config: Arc<Config>,
    http: Client,
}

impl WeatherService {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: Config, http: Client) -> Self {
        Self {
            config: Arc::new(config),
            http,
        }
    }

    pub async fn current(&self, query: &CurrentQuery) -> Reply {
        Reply::from_result(self.try_current(query).await)
    }

    pub async fn current_google(&self, query: &GoogleQuery) -> Reply {
        Reply::from_result(self.try_current_google(query).await)
    }

    async fn try_current(
        &self,
        query: &CurrentQuery,
    ) -> Result<CanonicalWeatherReading, WeatherError> {
        let coord = Coordinate::parse("lat", query.lat.as_deref(), "lon", query.lon.as_deref())?;
        let units = UnitSystem::parse_param("units", query.units.as_deref())?;

        self.fetch(EntryPoint::Current, &coord, units).await
    }

    async fn try_current_google(
        &self,
        query: &GoogleQuery,
    ) -> Result<CanonicalWeatherReading, WeatherError> {
        let coord = Coordinate::parse("lat", query.lat.as_deref(), "lng", query.lng.as_deref())?;
        let units = UnitSystem::parse_param("unitsSystem", query.units_system.as_deref())?;

        self.fetch(EntryPoint::Google, &coord, units).await
    }

    async fn fetch(
        &self,
        entry: EntryPoint,
        coord: &Coordinate,
        units: UnitSystem,
    ) -> Result<CanonicalWeatherReading, WeatherError> {
        let adapter = select_adapter(entry, &self.config, &self.http)?;
        tracing::info!(
            provider = %adapter.id(),
            lat = coord.lat,
            lon = coord.lon,
            %units,
            "fetching current weather"
        );
        adapter.fetch_current(coord, units).await
    }
}
