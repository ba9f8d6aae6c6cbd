//! Core library for the `moti` weather client.
//!
//! This crate defines:
//! - Persistence of favorites and search history
//! - City suggestions (local gazetteer + provider search, debounced)
//! - Concurrent weather + forecast fetching with classified errors
//! - The application state controller that ties user actions together
//! - Configuration, provider and geolocation abstractions
//!
//! It is used by `moti-cli`, but the controller is UI-agnostic and can back other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod sequence;
pub mod store;
pub mod suggest;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use controller::{AppState, Controller, Phase};
pub use error::{FetchError, StoreError};
pub use fetch::Orchestrator;
pub use geolocation::{Coordinates, GeolocationError, GeolocationOptions, Geolocator};
pub use model::{
    CitySuggestion, Forecast, HistoryEntry, LocationQuery, WeatherBundle, WeatherEffect,
    WeatherSnapshot,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{FileStore, MemoryStore, Store};
pub use suggest::{SuggestionDebouncer, SuggestionEngine, SuggestionList};
