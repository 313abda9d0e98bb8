//! OpenWeatherMap client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{WeatherError, WeatherLookup, WeatherRecord};

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Client for the OpenWeatherMap current-weather endpoint.
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Provider payload (subset we consume).
#[derive(Deserialize)]
struct WeatherPayload {
    main: MainSection,
    weather: Vec<ConditionSection>,
    wind: WindSection,
    name: String,
}

#[derive(Deserialize)]
struct MainSection {
    temp: f64,
    humidity: u32,
}

#[derive(Deserialize)]
struct ConditionSection {
    description: String,
}

#[derive(Deserialize)]
struct WindSection {
    speed: f64,
}

impl OpenWeatherClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENWEATHER_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, city: &str) -> String {
        format!(
            "{}/data/2.5/weather?q={}&appid={}&units=metric",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(city),
            self.api_key
        )
    }
}

fn record_from_payload(payload: WeatherPayload) -> Result<WeatherRecord, WeatherError> {
    let condition = payload.weather.into_iter().next().ok_or_else(|| {
        WeatherError::MalformedResponse("weather conditions array is empty".to_string())
    })?;

    Ok(WeatherRecord {
        temperature: payload.main.temp,
        description: condition.description,
        humidity: payload.main.humidity,
        wind_speed: payload.wind.speed,
        city_name: payload.name,
    })
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
        let response = self.client.get(self.request_url(city)).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::CityNotFound(city.to_string()));
        }
        if !status.is_success() {
            return Err(WeatherError::Provider(status.to_string()));
        }

        let payload: WeatherPayload = response
            .json()
            .await
            .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;

        record_from_payload(payload)
    }
}
