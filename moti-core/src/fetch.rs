use std::sync::Arc;

use crate::{
    error::FetchError,
    model::{LocationQuery, MAX_FORECAST_DAYS, WeatherBundle},
    provider::WeatherProvider,
    store::Store,
};

/// Fetches current conditions and forecast together and records
/// successful lookups in the history.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<Store>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn WeatherProvider>, store: Arc<Store>) -> Self {
        Self { provider, store }
    }

    /// Both requests run concurrently; the first failure fails the whole call
    /// and any result already received is dropped.
    pub async fn fetch_weather_bundle(
        &self,
        query: &LocationQuery,
        forecast_days: u8,
    ) -> Result<WeatherBundle, FetchError> {
        let days = forecast_days.min(MAX_FORECAST_DAYS);

        let (weather, forecast) = tokio::try_join!(
            self.provider.current(query),
            self.provider.forecast(query, days),
        )
        .inspect_err(|e| {
            tracing::info!(%query, kind = e.kind(), error = ?e, "Weather fetch failed")
        })?;

        // the provider's resolved name, not the raw query
        self.store.add_to_history(&weather.location.name);

        Ok(WeatherBundle { weather, forecast })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::DEFAULT_FORECAST_DAYS, testing::MockProvider};
    use std::time::Duration;

    fn orchestrator(provider: MockProvider) -> (Orchestrator, Arc<MockProvider>, Arc<Store>) {
        let provider = Arc::new(provider);
        let store = Arc::new(Store::in_memory());
        (Orchestrator::new(provider.clone(), store.clone()), provider, store)
    }

    #[tokio::test]
    async fn success_returns_both_and_records_history() {
        let (orch, provider, store) =
            orchestrator(MockProvider::new().with_place("Prishtina", "Pristina"));

        let bundle = orch
            .fetch_weather_bundle(&"Prishtina".into(), DEFAULT_FORECAST_DAYS)
            .await
            .unwrap();

        assert_eq!(bundle.weather.location.name, "Pristina");
        assert_eq!(bundle.forecast.days.len(), 7);
        assert_eq!(provider.calls(), vec!["current:Prishtina", "forecast:Prishtina:7"]);
        assert_eq!(store.load_history()[0].city, "Pristina");
    }

    #[tokio::test]
    async fn coordinate_query_records_resolved_name() {
        let (orch, _, store) =
            orchestrator(MockProvider::new().with_place("42.21,20.74", "Prizren"));

        orch.fetch_weather_bundle(&LocationQuery::from_coordinates(42.21, 20.74), 3)
            .await
            .unwrap();

        assert_eq!(store.load_history()[0].city, "Prizren");
    }

    #[tokio::test]
    async fn forecast_days_clamped_to_provider_maximum() {
        let (orch, provider, _) = orchestrator(MockProvider::new().with_place("Peja", "Peja"));

        let bundle = orch.fetch_weather_bundle(&"Peja".into(), 14).await.unwrap();

        assert_eq!(bundle.forecast.days.len(), 10);
        assert!(provider.calls().contains(&"forecast:Peja:10".to_string()));
    }

    #[tokio::test]
    async fn forecast_failure_fails_whole_call() {
        let (orch, _, store) = orchestrator(
            MockProvider::new()
                .with_place("Peja", "Peja")
                .failing_forecast(FetchError::network("timed out")),
        );

        let err = orch.fetch_weather_bundle(&"Peja".into(), 7).await.unwrap_err();

        assert!(matches!(err, FetchError::Network { .. }));
        assert!(store.load_history().is_empty());
    }

    #[tokio::test]
    async fn current_failure_fails_whole_call() {
        let (orch, _, store) = orchestrator(
            MockProvider::new()
                .with_place("Peja", "Peja")
                .failing_current(FetchError::Provider("API key is invalid.".into())),
        );

        let err = orch.fetch_weather_bundle(&"Peja".into(), 7).await.unwrap_err();

        assert_eq!(err, FetchError::Provider("API key is invalid.".into()));
        assert!(store.load_history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn requests_run_concurrently() {
        let (orch, _, _) = orchestrator(
            MockProvider::new()
                .with_place("Gjilan", "Gjilan")
                .with_delay("Gjilan", Duration::from_secs(1)),
        );

        let started = tokio::time::Instant::now();
        orch.fetch_weather_bundle(&"Gjilan".into(), 7).await.unwrap();

        // two one-second calls, overlapped
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let (orch, _, store) = orchestrator(MockProvider::new());

        let err = orch.fetch_weather_bundle(&"Xyzzy123".into(), 7).await.unwrap_err();

        assert_eq!(err, FetchError::NotFound);
        assert!(store.load_history().is_empty());
    }
}
