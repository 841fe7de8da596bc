//! Core library for `farmcast`.
//!
//! This crate defines:
//! - The canonical current-weather model every provider is normalized into
//! - Weather code classification into one condition vocabulary
//! - Provider adapters (OpenWeather, Open-Meteo, Google Weather)
//! - Configuration-driven provider selection
//! - The request boundary that turns raw query strings into an envelope
//!
//! It is used by `farmcast-cli`, but can also be reused by other binaries or services.

pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod select;
pub mod service;

pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::{CanonicalWeatherReading, Condition, Coordinate, UnitSystem};
pub use provider::{ProviderId, WeatherProvider};
pub use select::{EntryPoint, Selection, select, select_adapter};
pub use service::{CurrentQuery, Envelope, GoogleQuery, Reply, WeatherService};
