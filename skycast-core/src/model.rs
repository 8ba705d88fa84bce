use serde::{Deserialize, Serialize};

/// A validated search submission. Both fields are non-empty by construction;
/// the form never hands an empty field to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub city: String,
    /// ISO 3166-1 alpha-2 code, e.g. "US".
    pub country_code: String,
}

impl SearchRequest {
    /// Query string for the geocoding endpoint, e.g. "London,GB".
    pub fn geocoding_query(&self) -> String {
        format!("{},{}", self.city, self.country_code)
    }
}

/// Current conditions for a resolved location. Temperatures are Kelvin, as
/// delivered by the API; presentation converts.
///
/// The `Default` value doubles as "no data yet". The pipeline replaces a
/// report wholesale on every lookup, never merging fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location_name: String,
    pub temperature_current: f64,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

impl WeatherReport {
    pub fn is_empty(&self) -> bool {
        self.location_name.is_empty()
    }
}

/// One geocoding match. Only the coordinates matter; the pipeline takes the
/// first candidate and discards the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCandidate {
    pub latitude: f64,
    pub longitude: f64,
}
