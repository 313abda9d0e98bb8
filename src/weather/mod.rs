//! Weather lookup: the normalized record and the OpenWeatherMap-backed client.

mod openweather;

pub use openweather::OpenWeatherClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provider does not know the requested city (HTTP 404).
    #[error("City \"{0}\" not found.")]
    CityNotFound(String),

    /// Any other non-success status, or a transport failure.
    #[error("Weather request failed: {0}")]
    Provider(String),

    /// The success payload lacked an expected field.
    #[error("Unexpected weather response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Provider(err.to_string())
    }
}

/// Current conditions for one city, normalized from the provider payload.
///
/// Serialized with camelCase names: this is both the shape the page renders
/// and the shape fed back to the model as a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    /// Temperature in °C
    pub temperature: f64,

    /// Free-text conditions description (e.g. "clear sky")
    pub description: String,

    /// Relative humidity percentage
    pub humidity: u32,

    /// Wind speed in m/s
    pub wind_speed: f64,

    /// Provider-resolved city name
    pub city_name: String,
}

/// Weather provider seam, so the agent loop can run against scripted
/// lookups in tests.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Fetch current conditions for a city.
    async fn fetch_weather(&self, city: &str) -> Result<WeatherRecord, WeatherError>;
}
