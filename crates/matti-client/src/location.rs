//! Best-effort geolocation for saved tests.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, warn};

use matti_shared::GeoFix;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location is not available on this device")]
    Unavailable,

    #[error("Timed out waiting for a location fix")]
    Timeout,
}

pub trait LocationProvider: Send + Sync {
    fn current_fix(&self) -> BoxFuture<'_, Result<GeoFix, LocationError>>;
}

/// Always reports the same position, e.g. one taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoFix);

impl LocationProvider for FixedLocation {
    fn current_fix(&self) -> BoxFuture<'_, Result<GeoFix, LocationError>> {
        futures::future::ready(Ok(self.0)).boxed()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn current_fix(&self) -> BoxFuture<'_, Result<GeoFix, LocationError>> {
        futures::future::ready(Err(LocationError::Unavailable)).boxed()
    }
}

/// Ask `provider` for a fix, giving up after `timeout`.  Failures are logged
/// and reported as `None`.
pub async fn best_effort_fix(provider: &dyn LocationProvider, timeout: Duration) -> Option<GeoFix> {
    let result = match tokio::time::timeout(timeout, provider.current_fix()).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout),
    };
    match result {
        Ok(fix) => {
            debug!(%fix, "location fix acquired");
            Some(fix)
        }
        Err(e) => {
            warn!(error = %e, "could not get location, saving without it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    impl LocationProvider for Stalled {
        fn current_fix(&self) -> BoxFuture<'_, Result<GeoFix, LocationError>> {
            futures::future::pending().boxed()
        }
    }

    #[tokio::test]
    async fn fixed_location_is_returned() {
        let fix = GeoFix { lat: 17.385, lon: 78.4867 };
        assert_eq!(
            best_effort_fix(&FixedLocation(fix), Duration::from_secs(1)).await,
            Some(fix)
        );
    }

    #[tokio::test]
    async fn failures_become_none() {
        assert_eq!(best_effort_fix(&NoLocation, Duration::from_secs(1)).await, None);
        assert_eq!(best_effort_fix(&Stalled, Duration::from_millis(20)).await, None);
    }
}
