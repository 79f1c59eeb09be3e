//! Forwards sensor link events into the application state.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use matti_link::LinkEvent;

use crate::state::{lock, SharedState};

/// Spawn the bridge task.  It runs until the link's event channel closes or
/// the handle is aborted.
pub fn spawn_link_bridge(
    state: SharedState,
    events: broadcast::Receiver<LinkEvent>,
) -> JoinHandle<()> {
    tokio::spawn(bridge_loop(state, events))
}

async fn bridge_loop(state: SharedState, mut events: broadcast::Receiver<LinkEvent>) {
    info!("Sensor link bridge started");

    loop {
        match events.recv().await {
            Ok(LinkEvent::Status(status)) => {
                debug!(?status, "link status (bridge)");
                lock(&state).set_ble_status(status);
            }
            Ok(LinkEvent::Reading(reading)) => {
                lock(&state).record_reading(reading);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "bridge fell behind, dropped link events");
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("Sensor link bridge stopped");
}
