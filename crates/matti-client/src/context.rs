//! Everything a command needs: the shared state plus the services behind it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use matti_advisory::AdvisoryClient;
use matti_link::SensorLink;

use crate::bridge::spawn_link_bridge;
use crate::location::LocationProvider;
use crate::state::{AppState, SharedState};

pub struct AppContext {
    pub state: SharedState,
    pub link: SensorLink,
    pub advisory: AdvisoryClient,
    pub location: Arc<dyn LocationProvider>,
    pub location_timeout: Duration,
    bridge: JoinHandle<()>,
}

impl AppContext {
    /// Wire the services together and start the link bridge.  Must be called
    /// from within a tokio runtime.
    pub fn new(
        state: AppState,
        link: SensorLink,
        advisory: AdvisoryClient,
        location: Arc<dyn LocationProvider>,
        location_timeout: Duration,
    ) -> Self {
        let state = state.into_shared();
        let bridge = spawn_link_bridge(state.clone(), link.subscribe());
        Self {
            state,
            link,
            advisory,
            location,
            location_timeout,
            bridge,
        }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.bridge.abort();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes for command tests.

    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use futures::FutureExt;

    use matti_advisory::{AdvisoryError, AdvisoryModel, SpeechError};
    use matti_link::memory::MemoryTransport;
    use matti_link::DeviceTarget;
    use matti_shared::GeoFix;
    use matti_store::Database;

    use super::*;
    use crate::location::{FixedLocation, LocationError};

    pub const REPORT: &str = "**Crop Suggestions:** Paddy, maize.\n\
        **Fertilizer Advice:** 50 kg urea per acre.\n\
        **Irrigation Suggestion:** Water twice a week.";

    /// Model with a canned reply that records every prompt.
    #[derive(Default)]
    pub struct Canned {
        pub fail: bool,
        pub prompts: Mutex<Vec<String>>,
        pub spoken: Mutex<Vec<(String, String)>>,
    }

    impl AdvisoryModel for Canned {
        fn generate_text<'a>(
            &'a self,
            prompt: &'a str,
        ) -> BoxFuture<'a, Result<String, AdvisoryError>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = if self.fail {
                Err(AdvisoryError::EmptyResponse)
            } else {
                Ok(REPORT.to_string())
            };
            async move {
                tokio::task::yield_now().await;
                reply
            }
            .boxed()
        }

        fn synthesize_speech<'a>(
            &'a self,
            text: &'a str,
            voice: &'a str,
        ) -> BoxFuture<'a, Result<Vec<u8>, SpeechError>> {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), voice.to_string()));
            futures::future::ready(Ok(vec![0u8; 480])).boxed()
        }
    }

    /// Location provider that takes a while to answer.
    pub struct SlowLocation(pub Duration);

    impl LocationProvider for SlowLocation {
        fn current_fix(&self) -> BoxFuture<'_, Result<GeoFix, LocationError>> {
            let delay = self.0;
            async move {
                tokio::time::sleep(delay).await;
                Ok(GeoFix { lat: 16.5, lon: 80.6 })
            }
            .boxed()
        }
    }

    pub struct Harness {
        pub ctx: AppContext,
        pub transport: MemoryTransport,
        pub model: Arc<Canned>,
    }

    pub fn harness() -> Harness {
        harness_with(Canned::default(), Arc::new(FixedLocation(GeoFix { lat: 17.4, lon: 78.5 })))
    }

    pub fn harness_with(model: Canned, location: Arc<dyn LocationProvider>) -> Harness {
        let transport = MemoryTransport::new();
        let link = SensorLink::new(Arc::new(transport.clone()), DeviceTarget::default());
        let model = Arc::new(model);
        let state = AppState::load(Database::open_in_memory().unwrap());
        let ctx = AppContext::new(
            state,
            link,
            AdvisoryClient::new(model.clone()),
            location,
            Duration::from_secs(1),
        );
        Harness {
            ctx,
            transport,
            model,
        }
    }

    /// Poll `check` until it holds or two seconds pass.
    pub async fn eventually(mut check: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !check() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached in time"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
