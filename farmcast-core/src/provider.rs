use crate::{
    error::WeatherError,
    model::{CanonicalWeatherReading, Coordinate, UnitSystem},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{convert::TryFrom, fmt::Debug};

pub mod google;
pub mod openmeteo;
pub mod openweather;

pub use google::GoogleWeatherProvider;
pub use openmeteo::OpenMeteoProvider;
pub use openweather::OpenWeatherProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "openweather")]
    OpenWeather,
    #[serde(rename = "open-meteo")]
    OpenMeteo,
    #[serde(rename = "google")]
    Google,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::Google => "google",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo, ProviderId::Google]
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderId::OpenMeteo)
    }

    /// Environment variable that may supply this provider's API key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderId::OpenWeather => Some("OPENWEATHERMAP_API_KEY"),
            ProviderId::Google => Some("GOOGLE_WEATHER_API_KEY"),
            ProviderId::OpenMeteo => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "google" => Ok(ProviderId::Google),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, open-meteo, google."
            )),
        }
    }
}

/// One upstream weather source that can answer "what is it like right now".
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Issue exactly one upstream call and normalize the answer.
    async fn fetch_current(
        &self,
        coord: &Coordinate,
        units: UnitSystem,
    ) -> Result<CanonicalWeatherReading, WeatherError>;
}

/// Single GET against `url`, decoded as `T`.
///
/// Transport errors, non-success statuses and undecodable bodies all come
/// back as [`WeatherError::UpstreamUnavailable`]. There is no retry.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    provider: ProviderId,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, WeatherError> {
    tracing::debug!(%provider, url, "requesting current conditions");

    // The query string carries the API key, so reqwest errors are stripped of their URL.
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| WeatherError::upstream(provider, e.status(), e.without_url().to_string()))?;

    let status = res.status();
    let body = res.text().await.map_err(|e| {
        WeatherError::upstream(
            provider,
            Some(status),
            format!("Failed to read response body: {}", e.without_url()),
        )
    })?;

    if !status.is_success() {
        return Err(WeatherError::upstream(
            provider,
            Some(status),
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        WeatherError::upstream(
            provider,
            Some(status),
            format!("Failed to parse {provider} JSON: {e}; body: {}", truncate_body(&body)),
        )
    })
}

/// Join a configured base URL and a fixed path.
pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

pub(crate) fn unix_now() -> i64 {
    Utc::now().timestamp()
}

pub(crate) fn rfc3339_to_unix(ts: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(ts).ok().map(|dt| dt.timestamp())
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
