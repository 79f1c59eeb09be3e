//! The seam between [`crate::SensorLink`] and a Bluetooth stack.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use matti_shared::constants::{DEFAULT_SCAN_TIMEOUT_SECS, DEVICE_NAME};

use crate::error::LinkError;

/// GATT service of the soil sensor.
pub const SOIL_SERVICE: Uuid = Uuid::from_u128(0x4fafc201_1fb5_459e_8fcc_c5c9c331914b);

/// Notifying characteristic of the soil sensor.
pub const SOIL_CHARACTERISTIC: Uuid = Uuid::from_u128(0xbeb5483e_36e1_4688_b7f5_ea07361b26a8);

/// Which peripheral to connect to and what to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    /// Advertised local name.
    pub name: String,
    pub service: Uuid,
    pub characteristic: Uuid,
    /// How long to scan before giving up on discovery.
    pub scan_timeout: Duration,
}

impl Default for DeviceTarget {
    fn default() -> Self {
        Self {
            name: DEVICE_NAME.to_string(),
            service: SOIL_SERVICE,
            characteristic: SOIL_CHARACTERISTIC,
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
        }
    }
}

/// Raw events delivered by an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Value of the subscribed characteristic changed.
    Notification(Vec<u8>),
    /// The peripheral dropped the connection.
    PeerDisconnected,
}

/// An open connection that can be torn down by the local side.
pub trait GattConnection: Send {
    fn close(&mut self) -> BoxFuture<'_, Result<(), LinkError>>;
}

/// Result of a successful discovery + subscription.
pub struct GattSession {
    /// Closing of this channel is treated like a peer disconnect.
    pub events: mpsc::Receiver<TransportEvent>,
    pub connection: Box<dyn GattConnection>,
}

pub trait GattTransport: Send + Sync {
    /// Whether a usable Bluetooth adapter exists.
    fn is_available(&self) -> BoxFuture<'_, bool>;

    /// Discover `target`, open its service and subscribe to the characteristic.
    fn open<'a>(&'a self, target: &'a DeviceTarget) -> BoxFuture<'a, Result<GattSession, LinkError>>;
}

/// Transport for builds without Bluetooth support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRadio;

impl GattTransport for NoRadio {
    fn is_available(&self) -> BoxFuture<'_, bool> {
        futures::future::ready(false).boxed()
    }

    fn open<'a>(&'a self, _target: &'a DeviceTarget) -> BoxFuture<'a, Result<GattSession, LinkError>> {
        futures::future::ready(Err(LinkError::Unavailable)).boxed()
    }
}
