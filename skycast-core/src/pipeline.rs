use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use tracing::warn;

use crate::{
    api::{ApiError, WeatherApi},
    model::{SearchRequest, WeatherReport},
};

/// Observable lookup state. The pipeline owns the single mutable copy;
/// callers read cloned snapshots via [`LookupPipeline::state`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    pub report: WeatherReport,
    pub is_loading: bool,
    pub is_not_found: bool,
}

impl PipelineState {
    /// Derived flag the shell uses to decide whether to show the result panel.
    pub fn has_report(&self) -> bool {
        !self.report.is_empty()
    }
}

/// Terminal result of one lookup, tagged so the presentation layer renders
/// every case explicitly instead of inferring it from flag combinations.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Success(WeatherReport),
    /// Geocoding matched nothing. Expected outcome, not a fault.
    NotFound,
    /// A success response failed schema validation.
    InvalidResponse(String),
    /// Network failure or non-success status from either endpoint.
    TransportFailure(String),
}

/// Two sequential calls per lookup: resolve coordinates, then fetch current
/// conditions for the first candidate.
///
/// State transitions per invocation:
/// - on entry: `is_loading` set, `is_not_found` cleared, `report` reset
/// - on exit: `is_loading` cleared on every branch, and the terminal effect
///   (report replaced, or `is_not_found` set, or nothing for errors) applied
///   only if no newer lookup has started since
pub struct LookupPipeline {
    api: Box<dyn WeatherApi>,
    state: Mutex<PipelineState>,
    seq: AtomicU64,
}

impl LookupPipeline {
    pub fn new(api: Box<dyn WeatherApi>) -> Self {
        Self { api, state: Mutex::new(PipelineState::default()), seq: AtomicU64::new(0) }
    }

    /// Snapshot of the current observable state.
    pub fn state(&self) -> PipelineState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Run one lookup to its terminal outcome. Never returns an error or
    /// panics on service failures; every failure kind maps to a tagged
    /// [`LookupOutcome`] variant.
    pub async fn fetch_weather(&self, request: &SearchRequest) -> LookupOutcome {
        let token = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        self.with_state(|st| {
            st.is_loading = true;
            st.is_not_found = false;
            st.report = WeatherReport::default();
        });

        let outcome = self.run(request).await;
        self.finish(token, &outcome);
        outcome
    }

    async fn run(&self, request: &SearchRequest) -> LookupOutcome {
        let candidates = match self.api.geocode(request).await {
            Ok(candidates) => candidates,
            Err(err) => return outcome_from(err),
        };

        // No disambiguation among multiple matches: the first candidate wins.
        let Some(first) = candidates.first().copied() else {
            return LookupOutcome::NotFound;
        };

        match self.api.current_conditions(first.latitude, first.longitude).await {
            Ok(report) => LookupOutcome::Success(report),
            Err(err) => outcome_from(err),
        }
    }

    /// Apply a terminal outcome. Outcomes of superseded lookups are dropped
    /// wholesale; the newest submission owns the final state, loading flag
    /// included.
    fn finish(&self, token: u64, outcome: &LookupOutcome) {
        if self.seq.load(Ordering::SeqCst) != token {
            return;
        }

        self.with_state(|st| {
            match outcome {
                LookupOutcome::Success(report) => st.report = report.clone(),
                LookupOutcome::NotFound => st.is_not_found = true,
                LookupOutcome::InvalidResponse(_) | LookupOutcome::TransportFailure(_) => {}
            }
            st.is_loading = false;
        });
    }

    fn with_state(&self, f: impl FnOnce(&mut PipelineState)) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut st);
    }
}

fn outcome_from(err: ApiError) -> LookupOutcome {
    match err {
        ApiError::Schema { .. } => LookupOutcome::InvalidResponse(err.to_string()),
        ApiError::Transport { .. } | ApiError::Status { .. } => {
            warn!(error = %err, "weather lookup failed in transit");
            LookupOutcome::TransportFailure(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoCandidate;
    use async_trait::async_trait;
    use std::{collections::VecDeque, sync::Arc};
    use tokio::sync::oneshot;

    /// Scripted [`WeatherApi`] double. Results are consumed front to back;
    /// a queued gate makes the next geocode call block until released.
    #[derive(Debug, Clone, Default)]
    struct ScriptedApi {
        geocode_results: Arc<Mutex<VecDeque<Result<Vec<GeoCandidate>, ApiError>>>>,
        conditions_results: Arc<Mutex<VecDeque<Result<WeatherReport, ApiError>>>>,
        calls: Arc<Mutex<Vec<String>>>,
        gates: Arc<Mutex<VecDeque<oneshot::Receiver<()>>>>,
    }

    impl ScriptedApi {
        fn push_geocode(&self, result: Result<Vec<GeoCandidate>, ApiError>) {
            self.geocode_results.lock().unwrap().push_back(result);
        }

        fn push_conditions(&self, result: Result<WeatherReport, ApiError>) {
            self.conditions_results.lock().unwrap().push_back(result);
        }

        fn push_gate(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherApi for ScriptedApi {
        async fn geocode(&self, request: &SearchRequest) -> Result<Vec<GeoCandidate>, ApiError> {
            self.calls.lock().unwrap().push(format!("geocode:{}", request.geocoding_query()));

            let gate = self.gates.lock().unwrap().pop_front();
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            self.geocode_results.lock().unwrap().pop_front().expect("scripted geocode result")
        }

        async fn current_conditions(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<WeatherReport, ApiError> {
            self.calls.lock().unwrap().push(format!("conditions:{latitude},{longitude}"));
            self.conditions_results.lock().unwrap().pop_front().expect("scripted conditions result")
        }
    }

    fn request(city: &str, country: &str) -> SearchRequest {
        SearchRequest { city: city.into(), country_code: country.into() }
    }

    fn report(name: &str, temp: f64, max: f64, min: f64) -> WeatherReport {
        WeatherReport {
            location_name: name.into(),
            temperature_current: temp,
            temperature_max: max,
            temperature_min: min,
        }
    }

    fn schema_error() -> ApiError {
        let source = serde_json::from_str::<u32>("[]").unwrap_err();
        ApiError::Schema { endpoint: "current conditions", source }
    }

    fn status_error() -> ApiError {
        ApiError::Status {
            endpoint: "geocoding",
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "upstream broke".to_string(),
        }
    }

    async fn until(cond: impl Fn() -> bool) {
        for _ in 0..1000 {
            if cond() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition never became true");
    }

    #[tokio::test]
    async fn geocodes_first_then_fetches_conditions_for_first_candidate() {
        let api = ScriptedApi::default();
        api.push_geocode(Ok(vec![
            GeoCandidate { latitude: 40.7, longitude: -74.0 },
            GeoCandidate { latitude: 51.5, longitude: -0.1 },
        ]));
        api.push_conditions(Ok(report("New York", 280.0, 282.0, 278.0)));

        let pipeline = LookupPipeline::new(Box::new(api.clone()));
        let outcome = pipeline.fetch_weather(&request("New York", "US")).await;

        assert_eq!(outcome, LookupOutcome::Success(report("New York", 280.0, 282.0, 278.0)));
        assert_eq!(api.calls(), vec!["geocode:New York,US", "conditions:40.7,-74"]);

        let state = pipeline.state();
        assert_eq!(state.report, report("New York", 280.0, 282.0, 278.0));
        assert!(state.has_report());
        assert!(!state.is_loading);
        assert!(!state.is_not_found);
    }

    #[tokio::test]
    async fn empty_geocoding_sets_not_found_without_a_second_call() {
        let api = ScriptedApi::default();
        api.push_geocode(Ok(vec![]));

        let pipeline = LookupPipeline::new(Box::new(api.clone()));
        let outcome = pipeline.fetch_weather(&request("Nowhereville", "US")).await;

        assert_eq!(outcome, LookupOutcome::NotFound);
        assert_eq!(api.calls(), vec!["geocode:Nowhereville,US"]);

        let state = pipeline.state();
        assert!(state.is_not_found);
        assert!(state.report.is_empty());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn schema_mismatch_is_reported_not_swallowed() {
        let api = ScriptedApi::default();
        api.push_geocode(Ok(vec![GeoCandidate { latitude: 40.7, longitude: -74.0 }]));
        api.push_conditions(Err(schema_error()));

        let pipeline = LookupPipeline::new(Box::new(api.clone()));
        let outcome = pipeline.fetch_weather(&request("New York", "US")).await;

        match outcome {
            LookupOutcome::InvalidResponse(detail) => {
                assert!(detail.contains("did not match the expected schema"));
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }

        let state = pipeline.state();
        assert!(state.report.is_empty());
        assert!(!state.is_not_found);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_and_clears_loading() {
        let api = ScriptedApi::default();
        api.push_geocode(Err(status_error()));

        let pipeline = LookupPipeline::new(Box::new(api.clone()));
        let outcome = pipeline.fetch_weather(&request("New York", "US")).await;

        match outcome {
            LookupOutcome::TransportFailure(detail) => assert!(detail.contains("500")),
            other => panic!("expected TransportFailure, got {other:?}"),
        }

        let state = pipeline.state();
        assert!(state.report.is_empty());
        assert!(!state.is_not_found);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn loading_spans_the_whole_lookup() {
        let api = ScriptedApi::default();
        let release = api.push_gate();

        let pipeline = Arc::new(LookupPipeline::new(Box::new(api.clone())));
        assert!(!pipeline.state().is_loading);

        let task = {
            let pipeline = Arc::clone(&pipeline);
            let request = request("Lima", "PE");
            tokio::spawn(async move { pipeline.fetch_weather(&request).await })
        };

        until(|| !api.calls().is_empty()).await;
        let mid = pipeline.state();
        assert!(mid.is_loading);
        assert!(mid.report.is_empty());

        api.push_geocode(Ok(vec![]));
        release.send(()).expect("lookup still waiting on the gate");

        let outcome = task.await.expect("lookup task must not panic");
        assert_eq!(outcome, LookupOutcome::NotFound);
        assert!(!pipeline.state().is_loading);
    }

    #[tokio::test]
    async fn stale_lookup_does_not_overwrite_newer_result() {
        let api = ScriptedApi::default();
        let release = api.push_gate();

        let pipeline = Arc::new(LookupPipeline::new(Box::new(api.clone())));

        // First lookup parks inside geocode until the gate opens.
        let stale = {
            let pipeline = Arc::clone(&pipeline);
            let request = request("Springfield", "US");
            tokio::spawn(async move { pipeline.fetch_weather(&request).await })
        };
        until(|| api.calls().len() == 1).await;

        // Second lookup runs to completion while the first is parked.
        api.push_geocode(Ok(vec![GeoCandidate { latitude: 2.0, longitude: 2.0 }]));
        api.push_conditions(Ok(report("Newer", 290.0, 291.0, 289.0)));
        let newer = pipeline.fetch_weather(&request("Springfield", "CA")).await;
        assert_eq!(newer, LookupOutcome::Success(report("Newer", 290.0, 291.0, 289.0)));

        // Release the first lookup; its result must be dropped on the floor.
        api.push_geocode(Ok(vec![GeoCandidate { latitude: 1.0, longitude: 1.0 }]));
        api.push_conditions(Ok(report("Older", 270.0, 271.0, 269.0)));
        release.send(()).expect("stale lookup still waiting on the gate");

        let stale_outcome = stale.await.expect("lookup task must not panic");
        assert_eq!(stale_outcome, LookupOutcome::Success(report("Older", 270.0, 271.0, 269.0)));

        let state = pipeline.state();
        assert_eq!(state.report, report("Newer", 290.0, 291.0, 289.0));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn sequential_identical_lookups_yield_the_same_result() {
        let api = ScriptedApi::default();
        for _ in 0..2 {
            api.push_geocode(Ok(vec![GeoCandidate { latitude: 40.7, longitude: -74.0 }]));
            api.push_conditions(Ok(report("New York", 280.0, 282.0, 278.0)));
        }

        let pipeline = LookupPipeline::new(Box::new(api.clone()));

        let first = pipeline.fetch_weather(&request("New York", "US")).await;
        let state_after_first = pipeline.state();

        let second = pipeline.fetch_weather(&request("New York", "US")).await;
        let state_after_second = pipeline.state();

        assert_eq!(first, second);
        assert_eq!(state_after_first, state_after_second);
    }

    #[tokio::test]
    async fn each_lookup_resets_the_previous_terminal_state() {
        let api = ScriptedApi::default();
        api.push_geocode(Ok(vec![GeoCandidate { latitude: 40.7, longitude: -74.0 }]));
        api.push_conditions(Ok(report("New York", 280.0, 282.0, 278.0)));
        api.push_geocode(Ok(vec![]));

        let pipeline = LookupPipeline::new(Box::new(api.clone()));

        pipeline.fetch_weather(&request("New York", "US")).await;
        assert!(pipeline.state().has_report());

        pipeline.fetch_weather(&request("Nowhereville", "US")).await;
        let state = pipeline.state();
        assert!(state.is_not_found);
        assert!(state.report.is_empty(), "old report must not survive a new lookup");
    }
}
