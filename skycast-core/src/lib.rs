//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherApi`] seam
//! - Shared domain models and the lookup pipeline
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod country;
pub mod model;
pub mod pipeline;

pub use api::{ApiError, WeatherApi, openweather::OpenWeatherApi};
pub use config::Config;
pub use country::{COUNTRIES, Country};
pub use model::{GeoCandidate, SearchRequest, WeatherReport};
pub use pipeline::{LookupOutcome, LookupPipeline, PipelineState};
