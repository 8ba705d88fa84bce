use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{GeoCandidate, SearchRequest, WeatherReport};

use super::{ApiError, WeatherApi};

const GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const CONDITIONS_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// OpenWeatherMap client.
///
/// The API key is injected at construction time; nothing in this module
/// reads ambient environment state.
#[derive(Debug, Clone)]
pub struct OpenWeatherApi {
    api_key: String,
    http: Client,
}

impl OpenWeatherApi {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        debug!(endpoint, "sending request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Schema { endpoint, source })
    }
}

/// Geocoding entries carry more fields (name, state, local names); only the
/// coordinates are required here.
#[derive(Debug, Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionsMain {
    temp: f64,
    temp_max: f64,
    temp_min: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionsResponse {
    name: String,
    main: ConditionsMain,
}

#[async_trait]
impl WeatherApi for OpenWeatherApi {
    async fn geocode(&self, request: &SearchRequest) -> Result<Vec<GeoCandidate>, ApiError> {
        let q = request.geocoding_query();
        let entries: Vec<GeoEntry> = self
            .get_json(
                "geocoding",
                GEOCODING_URL,
                &[("q", q.as_str()), ("appid", self.api_key.as_str())],
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| GeoCandidate { latitude: e.lat, longitude: e.lon })
            .collect())
    }

    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherReport, ApiError> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let parsed: ConditionsResponse = self
            .get_json(
                "current conditions",
                CONDITIONS_URL,
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("appid", self.api_key.as_str()),
                ],
            )
            .await?;

        Ok(WeatherReport {
            location_name: parsed.name,
            temperature_current: parsed.main.temp,
            temperature_max: parsed.main.temp_max,
            temperature_min: parsed.main.temp_min,
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
