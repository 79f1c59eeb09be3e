//! # matti-link
//!
//! Bluetooth LE link to the soil sensor.
//!
//! [`SensorLink`] owns at most one GATT session at a time, decodes and
//! clamps the JSON notifications the sensor sends, and publishes
//! [`LinkEvent`]s on a broadcast channel.  The radio itself sits behind the
//! [`GattTransport`] trait; enable the `bluetooth` feature for the
//! `btleplug`-backed implementation.

#[cfg(feature = "bluetooth")]
pub mod btle;
pub mod link;
pub mod memory;
pub mod payload;
pub mod transport;

mod error;

pub use error::{LinkError, PayloadError};
pub use link::{LinkEvent, LinkStatus, SensorLink};
pub use transport::{DeviceTarget, GattConnection, GattSession, GattTransport, TransportEvent};

/// The transport used by default builds: the radio when the `bluetooth`
/// feature is on, otherwise a stub that always reports "unavailable".
#[cfg(feature = "bluetooth")]
pub fn platform_transport() -> std::sync::Arc<dyn GattTransport> {
    std::sync::Arc::new(btle::BtleTransport::new())
}

#[cfg(not(feature = "bluetooth"))]
pub fn platform_transport() -> std::sync::Arc<dyn GattTransport> {
    std::sync::Arc::new(transport::NoRadio)
}
