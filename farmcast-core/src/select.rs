//! Per-request choice of upstream.
//!
//! Selection looks only at configuration. A provider that is configured
//! but failing is reported as a failure; the fallback is never tried in
//! its place, and nothing is remembered between requests.

use reqwest::Client;

use crate::{
    config::Config,
    error::WeatherError,
    provider::{
        GoogleWeatherProvider, OpenMeteoProvider, OpenWeatherProvider, ProviderId, WeatherProvider,
    },
};

/// Inbound surfaces that need a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// `/weather/current`: OpenWeather when keyed, Open-Meteo otherwise.
    Current,
    /// `/weather`: Google Weather only, no fallback.
    Google,
}

impl EntryPoint {
    fn preferred(&self) -> ProviderId {
        match self {
            EntryPoint::Current => ProviderId::OpenWeather,
            EntryPoint::Google => ProviderId::Google,
        }
    }

    fn fallback(&self) -> Option<ProviderId> {
        match self {
            EntryPoint::Current => Some(ProviderId::OpenMeteo),
            EntryPoint::Google => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Preferred(ProviderId),
    Fallback(ProviderId),
}

impl Selection {
    pub fn provider(&self) -> ProviderId {
        match self {
            Selection::Preferred(id) | Selection::Fallback(id) => *id,
        }
    }
}

/// Decide which provider serves `entry` under `config`.
pub fn select(entry: EntryPoint, config: &Config) -> Result<Selection, WeatherError> {
    let preferred = entry.preferred();
    if config.is_provider_configured(preferred) {
        return Ok(Selection::Preferred(preferred));
    }

    match entry.fallback() {
        Some(fallback) => Ok(Selection::Fallback(fallback)),
        None => Err(WeatherError::MisconfiguredProvider {
            provider: preferred,
        }),
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    http: &Client,
) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let api_key = || {
        config
            .provider_api_key(id)
            .map(str::to_owned)
            .ok_or(WeatherError::MisconfiguredProvider { provider: id })
    };
    let endpoint = config.provider_endpoint(id);

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let p = OpenWeatherProvider::new(http.clone(), api_key()?);
            Box::new(match endpoint {
                Some(url) => p.with_endpoint(url),
                None => p,
            })
        }
        ProviderId::OpenMeteo => {
            let p = OpenMeteoProvider::new(http.clone());
            Box::new(match endpoint {
                Some(url) => p.with_endpoint(url),
                None => p,
            })
        }
        ProviderId::Google => {
            let p = GoogleWeatherProvider::new(http.clone(), api_key()?);
            Box::new(match endpoint {
                Some(url) => p.with_endpoint(url),
                None => p,
            })
        }
    };

    Ok(boxed)
}

/// Select and construct the adapter for one request.
pub fn select_adapter(
    entry: EntryPoint,
    config: &Config,
    http: &Client,
) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let selection = select(entry, config)?;
    tracing::info!(?entry, ?selection, "provider selected");
    provider_from_config(selection.provider(), config, http)
}
