//! In-process transport that stands in for a real sensor.
//!
//! Used by tests across the workspace and by the CLI's `--simulate` mode.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;

use crate::error::LinkError;
use crate::transport::{DeviceTarget, GattConnection, GattSession, GattTransport, TransportEvent};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
struct MemoryState {
    available: bool,
    present: bool,
    sender: Option<mpsc::Sender<TransportEvent>>,
    opened: usize,
    closed: usize,
}

#[derive(Debug, Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// A transport with a radio and the sensor in range.
    pub fn new() -> Self {
        Self::with(true)
    }

    /// A transport whose radio is missing.
    pub fn unavailable() -> Self {
        Self::with(false)
    }

    fn with(available: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                available,
                present: true,
                sender: None,
                opened: 0,
                closed: 0,
            })),
        }
    }

    /// Toggle whether discovery finds the sensor.
    pub fn set_present(&self, present: bool) {
        self.lock().present = present;
    }

    /// Handle for pushing data as if it came from the sensor.
    pub fn device(&self) -> MemoryDevice {
        MemoryDevice {
            state: self.state.clone(),
        }
    }

    pub fn opened_count(&self) -> usize {
        self.lock().opened
    }

    pub fn closed_count(&self) -> usize {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl GattTransport for MemoryTransport {
    fn is_available(&self) -> BoxFuture<'_, bool> {
        let available = self.lock().available;
        futures::future::ready(available).boxed()
    }

    fn open<'a>(&'a self, target: &'a DeviceTarget) -> BoxFuture<'a, Result<GattSession, LinkError>> {
        let result = {
            let mut state = self.lock();
            if !state.present {
                Err(LinkError::DeviceNotFound(target.name.clone()))
            } else {
                let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
                state.sender = Some(tx);
                state.opened += 1;
                Ok(GattSession {
                    events: rx,
                    connection: Box::new(MemoryConnection {
                        state: self.state.clone(),
                    }),
                })
            }
        };
        futures::future::ready(result).boxed()
    }
}

struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
}

impl GattConnection for MemoryConnection {
    fn close(&mut self) -> BoxFuture<'_, Result<(), LinkError>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.sender = None;
        state.closed += 1;
        futures::future::ready(Ok(())).boxed()
    }
}

/// The sensor side of a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDevice {
    fn sender(&self) -> Option<mpsc::Sender<TransportEvent>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sender
            .clone()
    }

    /// Send a raw notification payload. Ignored when no session is open.
    pub async fn notify(&self, payload: &[u8]) {
        if let Some(tx) = self.sender() {
            let _ = tx.send(TransportEvent::Notification(payload.to_vec())).await;
        }
    }

    /// Simulate the peripheral dropping the connection.
    pub async fn drop_connection(&self) {
        let tx = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sender
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(TransportEvent::PeerDisconnected).await;
        }
    }

    pub fn is_open(&self) -> bool {
        self.sender().is_some()
    }
}
