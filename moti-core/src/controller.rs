//! Application state and the user actions that change it.
//!
//! The controller is the only writer of [`AppState`]. Every action publishes a
//! fresh snapshot on a `watch` channel, so a view can re-render whenever
//! [`Controller::subscribe`] reports a change.

use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::DEFAULT_CITY,
    error::FetchError,
    fetch::Orchestrator,
    geolocation::{GeolocationError, GeolocationOptions, Geolocator, locate},
    model::{
        CitySuggestion, DEFAULT_FORECAST_DAYS, Forecast, HistoryEntry, LocationQuery,
        WeatherSnapshot,
    },
    provider::WeatherProvider,
    sequence::Sequencer,
    store::Store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing fetched yet, nothing failed.
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub weather: Option<WeatherSnapshot>,
    pub forecast: Option<Forecast>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub favorites: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

impl AppState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.weather.is_some() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }

    /// Name of the location currently displayed.
    pub fn current_city(&self) -> Option<&str> {
        self.weather.as_ref().map(|w| w.location.name.as_str())
    }

    pub fn is_favorite(&self) -> bool {
        self.current_city()
            .is_some_and(|city| self.favorites.iter().any(|f| f == city))
    }
}

/// `favorites` with `city` added at the end if absent, removed if present.
pub fn toggled(favorites: &[String], city: &str) -> Vec<String> {
    if favorites.iter().any(|f| f == city) {
        favorites.iter().filter(|f| *f != city).cloned().collect()
    } else {
        let mut next = favorites.to_vec();
        next.push(city.to_string());
        next
    }
}

#[derive(Debug)]
pub struct Controller {
    orchestrator: Orchestrator,
    store: Arc<Store>,
    geolocator: Arc<dyn Geolocator>,
    geolocation: GeolocationOptions,
    default_city: String,
    forecast_days: u8,
    searches: Sequencer,
    state: watch::Sender<AppState>,
}

impl Controller {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Arc<Store>,
        geolocator: Arc<dyn Geolocator>,
    ) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            orchestrator: Orchestrator::new(provider, Arc::clone(&store)),
            store,
            geolocator,
            geolocation: GeolocationOptions::default(),
            default_city: DEFAULT_CITY.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
            searches: Sequencer::new(),
            state,
        }
    }

    pub fn with_default_city(mut self, city: impl Into<String>) -> Self {
        self.default_city = city.into();
        self
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = days;
        self
    }

    pub fn with_geolocation_options(mut self, options: GeolocationOptions) -> Self {
        self.geolocation = options;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn is_favorite(&self) -> bool {
        self.state.borrow().is_favorite()
    }

    /// Hydrate from the store and kick off the initial lookup in the background.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        self.hydrate();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.initial_search().await })
    }

    /// Load favorites and history from the store.
    pub fn hydrate(&self) {
        let favorites = self.store.load_favorites();
        let history = self.store.load_history();
        self.state.send_modify(|s| {
            s.favorites = favorites;
            s.history = history;
        });
    }

    /// Look up the device position silently; fall back to the default city
    /// without showing an error if that doesn't work out.
    pub async fn initial_search(&self) {
        let fallback = LocationQuery::new(self.default_city.as_str());

        match locate(self.geolocator.as_ref(), &self.geolocation).await {
            Ok(position) => self.run_search(position.into(), Some(fallback)).await,
            Err(e) => {
                tracing::info!(
                    error = %e,
                    city = %fallback,
                    "Position unavailable, using default city"
                );
                self.run_search(fallback, None).await;
            }
        }
    }

    pub async fn search(&self, query: impl Into<LocationQuery>) {
        self.run_search(query.into(), None).await;
    }

    pub async fn select_suggestion(&self, suggestion: &CitySuggestion) {
        self.search(suggestion.name.as_str()).await;
    }

    pub async fn select_history(&self, city: &str) {
        self.search(city).await;
    }

    pub async fn select_favorite(&self, city: &str) {
        self.search(city).await;
    }

    pub async fn map_click(&self, lat: f64, lon: f64) {
        self.search(LocationQuery::from_coordinates(lat, lon)).await;
    }

    /// Search at the device position. Unlike the startup lookup, a failure to
    /// get a position is returned so the caller can tell the user.
    pub async fn use_current_location(&self) -> Result<(), GeolocationError> {
        let position = locate(self.geolocator.as_ref(), &self.geolocation).await?;
        self.search(position).await;
        Ok(())
    }

    /// Re-issue the most recent history city, or the default city.
    pub async fn retry(&self) {
        let last = self.state.borrow().history.first().map(|h| h.city.clone());
        let query = last.unwrap_or_else(|| self.default_city.clone());
        self.search(query).await;
    }

    /// Add the displayed city to favorites, or remove it if already there.
    /// Returns the new membership, or `None` when nothing is displayed.
    pub fn toggle_favorite(&self) -> Option<bool> {
        let (city, favorites) = {
            let state = self.state.borrow();
            let city = state.current_city()?.to_string();
            let favorites = toggled(&state.favorites, &city);
            (city, favorites)
        };

        let now_favorite = favorites.contains(&city);
        self.store.save_favorites(&favorites);
        self.state.send_modify(|s| s.favorites = favorites);
        Some(now_favorite)
    }

    pub fn remove_favorite(&self, city: &str) {
        let favorites: Vec<String> = {
            let state = self.state.borrow();
            state.favorites.iter().filter(|f| *f != city).cloned().collect()
        };

        self.store.save_favorites(&favorites);
        self.state.send_modify(|s| s.favorites = favorites);
    }

    /// Forget the search history. The displayed weather stays.
    pub fn clear_history(&self) {
        self.store.clear_history();
        self.state.send_modify(|s| s.history.clear());
    }

    async fn run_search(&self, mut query: LocationQuery, mut fallback: Option<LocationQuery>) {
        loop {
            let ticket = self.searches.issue();
            self.state.send_modify(|s| {
                s.loading = true;
                s.error = None;
            });

            let result = self.orchestrator.fetch_weather_bundle(&query, self.forecast_days).await;
            let history = self.store.load_history();

            if !self.searches.is_latest(ticket) {
                tracing::debug!(%query, "Discarding superseded search result");
                self.state.send_modify(|s| s.history = history);
                return;
            }

            match result {
                Ok(bundle) => {
                    tracing::info!(%query, city = %bundle.weather.location.name, "Weather loaded");
                    self.state.send_modify(|s| {
                        s.weather = Some(bundle.weather);
                        s.forecast = Some(bundle.forecast);
                        s.error = None;
                        s.loading = false;
                        s.history = history;
                    });
                }
                Err(e) => {
                    if let Some(next) = fallback.take() {
                        tracing::info!(
                            %query,
                            fallback = %next,
                            error = %e,
                            "Silent lookup failed, falling back"
                        );
                        query = next;
                        continue;
                    }
                    self.state.send_modify(|s| {
                        s.weather = None;
                        s.forecast = None;
                        s.error = Some(e);
                        s.loading = false;
                        s.history = history;
                    });
                }
            }
            return;
        }
    }
}
