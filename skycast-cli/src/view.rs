//! Presentation shell: pure functions from pipeline state to terminal text.

use std::fmt::Write;

use skycast_core::{LookupOutcome, PipelineState};

pub const TITLE: &str = "Skycast weather finder";

pub fn loading_line() -> &'static str {
    "Fetching weather..."
}

pub fn alert(message: &str) -> String {
    format!("! {message}")
}

/// Render the observable pipeline state: loading indicator, result panel and
/// not-found alert, each shown only when its flag or content says so.
pub fn render(state: &PipelineState) -> String {
    let mut out = String::new();

    if state.is_loading {
        out.push_str(loading_line());
        out.push('\n');
    }

    if state.has_report() {
        let report = &state.report;
        let _ = writeln!(out, "Weather in {}", report.location_name);
        let _ = writeln!(out, "  Current: {}", format_temperature(report.temperature_current));
        let _ = writeln!(out, "  Max:     {}", format_temperature(report.temperature_max));
        let _ = writeln!(out, "  Min:     {}", format_temperature(report.temperature_min));
    }

    if state.is_not_found {
        out.push_str(&alert("City not found"));
        out.push('\n');
    }

    out
}

/// One visible line for the outcomes the state flags do not cover; `None`
/// when `render` already said everything there is to say.
pub fn render_outcome(outcome: &LookupOutcome) -> Option<String> {
    match outcome {
        LookupOutcome::Success(_) | LookupOutcome::NotFound => None,
        LookupOutcome::InvalidResponse(detail) => {
            Some(alert(&format!("Unexpected weather service response: {detail}")))
        }
        LookupOutcome::TransportFailure(detail) => {
            Some(alert(&format!("Weather service unreachable: {detail}")))
        }
    }
}

/// The API delivers Kelvin; people read Celsius.
fn format_temperature(kelvin: f64) -> String {
    format!("{:.1} °C", kelvin - 273.15)
}
