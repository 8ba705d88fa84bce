use crate::model::{GeoCandidate, SearchRequest, WeatherReport};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// Errors crossing the weather-service boundary, split the way the
/// presentation layer needs to tell them apart.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    #[error("request to the {endpoint} endpoint failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A success body that does not match the expected schema.
    #[error("{endpoint} response did not match the expected schema: {source}")]
    Schema {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Seam between the lookup pipeline and the weather service.
///
/// The pipeline only ever talks to this trait; the real OpenWeather client
/// and test doubles both implement it.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// Resolve a city/country query to zero or more coordinate candidates.
    async fn geocode(&self, request: &SearchRequest) -> Result<Vec<GeoCandidate>, ApiError>;

    /// Fetch current conditions for a coordinate pair.
    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherReport, ApiError>;
}
