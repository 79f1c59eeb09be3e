//! Sensor connection state machine.
//!
//! ```text
//! disconnected -> connecting -> connected | error
//! connected    -> disconnected   (local disconnect or peer event)
//! error        -> connecting     (new user-initiated connect)
//! ```
//!
//! There is no automatic reconnect.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use matti_shared::SensorReading;

use crate::error::LinkError;
use crate::payload::{decode_payload, now_secs};
use crate::transport::{DeviceTarget, GattConnection, GattSession, GattTransport, TransportEvent};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Published to every subscriber of a [`SensorLink`].
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Status(LinkStatus),
    Reading(SensorReading),
}

struct LinkInner {
    status: LinkStatus,
    connection: Option<Box<dyn GattConnection>>,
    pump: Option<JoinHandle<()>>,
    /// Bumped on every attach/detach so a stale pump cannot clobber a newer
    /// session.
    generation: u64,
}

/// A single connection slot to the soil sensor.
///
/// Cloning is cheap and every clone drives the same connection.
#[derive(Clone)]
pub struct SensorLink {
    transport: Arc<dyn GattTransport>,
    target: DeviceTarget,
    inner: Arc<Mutex<LinkInner>>,
    events: broadcast::Sender<LinkEvent>,
}

impl SensorLink {
    pub fn new(transport: Arc<dyn GattTransport>, target: DeviceTarget) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            target,
            inner: Arc::new(Mutex::new(LinkInner {
                status: LinkStatus::Disconnected,
                connection: None,
                pump: None,
                generation: 0,
            })),
            events,
        }
    }

    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    pub fn status(&self) -> LinkStatus {
        lock(&self.inner).status
    }

    /// Receive link events from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }

    pub async fn is_available(&self) -> bool {
        self.transport.is_available().await
    }

    /// Discover the sensor and start streaming readings.
    ///
    /// Rejected with [`LinkError::AlreadyActive`] while a connect is in
    /// flight or a session is open.  Any other failure leaves the link in
    /// [`LinkStatus::Error`].
    pub async fn connect(&self) -> Result<(), LinkError> {
        self.begin_connect()?;

        match self.open_session().await {
            Ok(session) => {
                self.attach(session);
                Ok(())
            }
            Err(e) => {
                warn!(device = %self.target.name, error = %e, "sensor connection failed");
                let mut inner = lock(&self.inner);
                inner.status = LinkStatus::Error;
                let _ = self.events.send(LinkEvent::Status(LinkStatus::Error));
                Err(e)
            }
        }
    }

    /// Close the session if one is open. Calling this when not connected is
    /// a no-op.
    pub async fn disconnect(&self) {
        let mut connection = {
            let mut inner = lock(&self.inner);
            let Some(connection) = inner.connection.take() else {
                debug!("disconnect requested with no open session");
                return;
            };
            inner.generation += 1;
            if let Some(pump) = inner.pump.take() {
                pump.abort();
            }
            inner.status = LinkStatus::Disconnected;
            let _ = self.events.send(LinkEvent::Status(LinkStatus::Disconnected));
            connection
        };

        if let Err(e) = connection.close().await {
            warn!(error = %e, "error while closing sensor connection");
        }
        info!(device = %self.target.name, "sensor disconnected");
    }

    fn begin_connect(&self) -> Result<(), LinkError> {
        let mut inner = lock(&self.inner);
        match inner.status {
            LinkStatus::Connecting | LinkStatus::Connected => Err(LinkError::AlreadyActive),
            LinkStatus::Disconnected | LinkStatus::Error => {
                inner.status = LinkStatus::Connecting;
                let _ = self.events.send(LinkEvent::Status(LinkStatus::Connecting));
                info!(device = %self.target.name, "connecting to sensor");
                Ok(())
            }
        }
    }

    async fn open_session(&self) -> Result<GattSession, LinkError> {
        if !self.transport.is_available().await {
            return Err(LinkError::Unavailable);
        }
        self.transport.open(&self.target).await
    }

    fn attach(&self, session: GattSession) {
        let GattSession { events, connection } = session;

        let mut inner = lock(&self.inner);
        inner.generation += 1;
        let generation = inner.generation;
        inner.connection = Some(connection);
        inner.status = LinkStatus::Connected;
        inner.pump = Some(tokio::spawn(pump(
            events,
            self.inner.clone(),
            self.events.clone(),
            generation,
        )));
        // Sent under the lock so a fast peer disconnect cannot overtake it.
        let _ = self.events.send(LinkEvent::Status(LinkStatus::Connected));
        info!(device = %self.target.name, "sensor connected");
    }
}

fn lock(inner: &Mutex<LinkInner>) -> MutexGuard<'_, LinkInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forward transport events as decoded readings until the session ends.
async fn pump(
    mut rx: mpsc::Receiver<TransportEvent>,
    inner: Arc<Mutex<LinkInner>>,
    tx: broadcast::Sender<LinkEvent>,
    generation: u64,
) {
    while let Some(event) = rx.recv().await {
        match event {
            TransportEvent::Notification(bytes) => match decode_payload(&bytes, now_secs()) {
                Ok(reading) => {
                    debug!(
                        ph = reading.ph,
                        moisture = reading.moisture,
                        temperature = reading.temperature,
                        battery = reading.battery,
                        "sensor reading"
                    );
                    let _ = tx.send(LinkEvent::Reading(reading));
                }
                Err(e) => warn!(error = %e, len = bytes.len(), "dropping malformed sensor payload"),
            },
            TransportEvent::PeerDisconnected => break,
        }
    }

    let mut guard = lock(&inner);
    if guard.generation == generation && guard.status == LinkStatus::Connected {
        guard.status = LinkStatus::Disconnected;
        guard.connection = None;
        guard.pump = None;
        let _ = tx.send(LinkEvent::Status(LinkStatus::Disconnected));
        info!("sensor disconnected by peer");
    }
}
