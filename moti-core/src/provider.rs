use crate::{
    Config,
    error::FetchError,
    model::{CitySuggestion, Forecast, LocationQuery, WeatherSnapshot},
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

/// The three read-only endpoints of a weather data provider.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError>;

    async fn forecast(&self, query: &LocationQuery, days: u8) -> Result<Forecast, FetchError>;

    /// Autocomplete search. Callers treat failures as "no results".
    async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>, FetchError>;
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<WeatherApiProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `moti configure` or set WEATHERAPI_KEY."
        )
    })?;

    WeatherApiProvider::new(api_key, config.base_url())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        if cfg.api_key().is_some() {
            // WEATHERAPI_KEY is set in this environment
            return;
        }
        let err = provider_from_config(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `moti configure`"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let cfg = Config { api_key: Some("KEY".to_string()), ..Config::default() };

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
