//! Device position as an injectable capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Mutex, time::Duration};
use tokio::time::Instant;

use crate::model::LocationQuery;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for LocationQuery {
    fn from(c: Coordinates) -> Self {
        LocationQuery::from_coordinates(c.latitude, c.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    Denied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location service unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position still acceptable.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(8),
            maximum_age: Duration::from_secs(60),
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// Ask `geolocator` for a position, treating anything slower than
/// `options.timeout` as [`GeolocationError::Timeout`].
pub async fn locate(
    geolocator: &dyn Geolocator,
    options: &GeolocationOptions,
) -> Result<Coordinates, GeolocationError> {
    tokio::time::timeout(options.timeout, geolocator.current_position(options))
        .await
        .unwrap_or(Err(GeolocationError::Timeout))
}

/// Reports a fixed position, or `Unavailable` when none is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocator {
    position: Option<Coordinates>,
}

impl StaticGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        self.position.ok_or(GeolocationError::Unavailable)
    }
}

/// Reuses the last fix while it is younger than `options.maximum_age`.
#[derive(Debug)]
pub struct CachedGeolocator<G> {
    inner: G,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl<G: Geolocator> CachedGeolocator<G> {
    pub fn new(inner: G) -> Self {
        Self { inner, last_fix: Mutex::new(None) }
    }

    fn cached(&self, maximum_age: Duration) -> Option<Coordinates> {
        let last = *self.last_fix.lock().unwrap_or_else(|p| p.into_inner());
        last.filter(|(at, _)| at.elapsed() <= maximum_age).map(|(_, c)| c)
    }
}

#[async_trait]
impl<G: Geolocator> Geolocator for CachedGeolocator<G> {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        if let Some(c) = self.cached(options.maximum_age) {
            tracing::debug!("Using cached position");
            return Ok(c);
        }

        let fix = self.inner.current_position(options).await?;
        *self.last_fix.lock().unwrap_or_else(|p| p.into_inner()) = Some((Instant::now(), fix));
        Ok(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PRISHTINA: Coordinates = Coordinates { latitude: 42.66, longitude: 21.16 };

    #[derive(Debug, Default)]
    struct CountingGeolocator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geolocator for CountingGeolocator {
        async fn current_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<Coordinates, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PRISHTINA)
        }
    }

    #[derive(Debug)]
    struct NeverAnswers;

    #[async_trait]
    impl Geolocator for NeverAnswers {
        async fn current_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<Coordinates, GeolocationError> {
            std::future::pending().await
        }
    }

    #[test]
    fn default_options() {
        let opts = GeolocationOptions::default();
        assert!(opts.high_accuracy);
        assert_eq!(opts.timeout, Duration::from_secs(8));
        assert_eq!(opts.maximum_age, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn static_geolocator_without_position_is_unavailable() {
        let geo = StaticGeolocator::default();
        let res = locate(&geo, &GeolocationOptions::default()).await;
        assert_eq!(res, Err(GeolocationError::Unavailable));

        let geo = StaticGeolocator::new(Some(PRISHTINA));
        assert_eq!(locate(&geo, &GeolocationOptions::default()).await, Ok(PRISHTINA));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geolocator_times_out() {
        let res = locate(&NeverAnswers, &GeolocationOptions::default()).await;
        assert_eq!(res, Err(GeolocationError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn cached_position_reused_within_maximum_age() {
        let geo = CachedGeolocator::new(CountingGeolocator::default());
        let opts = GeolocationOptions::default();

        geo.current_position(&opts).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        geo.current_position(&opts).await.unwrap();
        assert_eq!(geo.inner.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        geo.current_position(&opts).await.unwrap();
        assert_eq!(geo.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn coordinates_become_query() {
        assert_eq!(LocationQuery::from(PRISHTINA).as_str(), "42.66,21.16");
    }
}
