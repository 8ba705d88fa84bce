//! The search input form: a two-field draft with local validation, filled
//! either from CLI flags or from interactive prompts.

use anyhow::{Context, Result};
use inquire::{Select, Text};
use skycast_core::{COUNTRIES, Country, SearchRequest};

/// Shown when a submit is attempted with an empty field.
pub const REQUIRED_FIELDS: &str = "All fields are required";

/// Draft of the two search fields. Values persist between submissions so a
/// repeated query starts from the previous entry.
#[derive(Debug, Clone, Default)]
pub struct SearchDraft {
    pub city: String,
    pub country_code: String,
}

impl SearchDraft {
    /// Local validation only: both fields must be non-empty. No network
    /// access happens here or anywhere before a request exists.
    pub fn submit(&self) -> Result<SearchRequest, &'static str> {
        if self.city.trim().is_empty() || self.country_code.trim().is_empty() {
            return Err(REQUIRED_FIELDS);
        }

        Ok(SearchRequest {
            city: self.city.trim().to_string(),
            country_code: self.country_code.trim().to_string(),
        })
    }
}

/// Fill the draft interactively, seeding each field with its previous value.
/// The country field is constrained to the reference list; the city field is
/// free text and may still come back empty, which `submit` rejects.
pub fn prompt(draft: &SearchDraft) -> Result<SearchDraft> {
    let city = Text::new("City:")
        .with_initial_value(&draft.city)
        .prompt()
        .context("City entry aborted")?;

    let options: Vec<&'static Country> = COUNTRIES.iter().collect();
    let cursor = options
        .iter()
        .position(|c| c.code == draft.country_code)
        .unwrap_or(0);

    let country = Select::new("Country:", options)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Country selection aborted")?;

    Ok(SearchDraft { city, country_code: country.code.to_string() })
}
