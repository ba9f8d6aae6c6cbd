//! In-crate test doubles.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::{collections::HashMap, sync::Mutex, time::Duration};

use crate::{
    error::FetchError,
    geolocation::{Coordinates, GeolocationError, GeolocationOptions, Geolocator},
    model::{
        CitySuggestion, Condition, CurrentConditions, Forecast, ForecastDay, LocationQuery, Place,
        WeatherSnapshot,
    },
    provider::WeatherProvider,
};

pub(crate) fn place(name: &str) -> Place {
    Place {
        name: name.to_string(),
        region: name.to_string(),
        country: "Kosovo".to_string(),
        lat: 42.66,
        lon: 21.16,
        localtime: "2024-05-01 10:00".to_string(),
    }
}

pub(crate) fn snapshot(name: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location: place(name),
        current: CurrentConditions {
            temp_c: 18.0,
            feelslike_c: 17.0,
            condition: Condition { text: "Sunny".into(), icon: "//sunny.png".into(), code: 1000 },
            humidity: 40,
            wind_kph: 11.2,
            wind_dir: "NW".into(),
            pressure_mb: 1016.0,
            vis_km: 10.0,
            uv: 5.0,
            is_day: 1,
        },
    }
}

pub(crate) fn forecast(name: &str, days: u8) -> Forecast {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    Forecast {
        location: place(name),
        days: start
            .iter_days()
            .take(days as usize)
            .map(|date| ForecastDay {
                date,
                maxtemp_c: 22.0,
                mintemp_c: 9.0,
                avgtemp_c: 15.0,
                condition: Condition { text: "Sunny".into(), icon: String::new(), code: 1000 },
            })
            .collect(),
    }
}

/// Provider with canned answers. Unknown queries are `NotFound`.
#[derive(Debug, Default)]
pub(crate) struct MockProvider {
    // query -> canonical location name
    places: HashMap<String, String>,
    suggestions: HashMap<String, Vec<CitySuggestion>>,
    delays: HashMap<String, Duration>,
    current_error: Option<FetchError>,
    forecast_error: Option<FetchError>,
    search_error: Option<FetchError>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_place(mut self, query: &str, canonical: &str) -> Self {
        self.places.insert(query.to_string(), canonical.to_string());
        self
    }

    pub(crate) fn with_suggestions(mut self, query: &str, items: Vec<CitySuggestion>) -> Self {
        self.suggestions.insert(query.to_string(), items);
        self
    }

    /// Every call for `query` takes `delay` before answering.
    pub(crate) fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub(crate) fn failing_current(mut self, err: FetchError) -> Self {
        self.current_error = Some(err);
        self
    }

    pub(crate) fn failing_forecast(mut self, err: FetchError) -> Self {
        self.forecast_error = Some(err);
        self
    }

    pub(crate) fn failing_search(mut self, err: FetchError) -> Self {
        self.search_error = Some(err);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    async fn pause_for(&self, query: &str) {
        if let Some(delay) = self.delays.get(query).copied() {
            tokio::time::sleep(delay).await;
        }
    }

    fn resolve(&self, query: &LocationQuery) -> Result<&str, FetchError> {
        self.places.get(query.as_str()).map(String::as_str).ok_or(FetchError::NotFound)
    }
}

#[async_trait]
impl WeatherProvider for MockProvider {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        self.record(format!("current:{query}"));
        self.pause_for(query.as_str()).await;
        if let Some(err) = &self.current_error {
            return Err(err.clone());
        }
        Ok(snapshot(self.resolve(query)?))
    }

    async fn forecast(&self, query: &LocationQuery, days: u8) -> Result<Forecast, FetchError> {
        self.record(format!("forecast:{query}:{days}"));
        self.pause_for(query.as_str()).await;
        if let Some(err) = &self.forecast_error {
            return Err(err.clone());
        }
        Ok(forecast(self.resolve(query)?, days))
    }

    async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>, FetchError> {
        self.record(format!("search:{query}"));
        self.pause_for(query).await;
        if let Some(err) = &self.search_error {
            return Err(err.clone());
        }
        Ok(self.suggestions.get(query).cloned().unwrap_or_default())
    }
}

/// Geolocator with a fixed answer.
#[derive(Debug)]
pub(crate) struct FixedGeolocator(pub(crate) Result<Coordinates, GeolocationError>);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        self.0
    }
}

/// Geolocator that never answers.
#[derive(Debug)]
pub(crate) struct SilentGeolocator;

#[async_trait]
impl Geolocator for SilentGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        std::future::pending().await
    }
}
