//! `btleplug`-backed transport.

use std::future::Future;
use std::time::Duration;

use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::LinkError;
use crate::transport::{DeviceTarget, GattConnection, GattSession, GattTransport, TransportEvent};

const SCAN_POLL: Duration = Duration::from_millis(250);
const CHANNEL_CAPACITY: usize = 32;

impl From<btleplug::Error> for LinkError {
    fn from(e: btleplug::Error) -> Self {
        LinkError::Transport(e.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BtleTransport;

impl BtleTransport {
    pub fn new() -> Self {
        Self
    }
}

impl GattTransport for BtleTransport {
    fn is_available(&self) -> BoxFuture<'_, bool> {
        async {
            match first_adapter().await {
                Ok(_) => true,
                Err(e) => {
                    debug!(error = %e, "no usable bluetooth adapter");
                    false
                }
            }
        }
        .boxed()
    }

    fn open<'a>(&'a self, target: &'a DeviceTarget) -> BoxFuture<'a, Result<GattSession, LinkError>> {
        open_session(target).boxed()
    }
}

async fn first_adapter() -> Result<Adapter, LinkError> {
    let manager = Manager::new().await?;
    manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(LinkError::Unavailable)
}

async fn find_peripheral(adapter: &Adapter, target: &DeviceTarget) -> Result<Peripheral, LinkError> {
    adapter.start_scan(ScanFilter::default()).await?;
    stop_after(poll_peripherals(adapter, target), adapter.stop_scan()).await
}

/// Await `scan`, then `stop` whatever `scan` returned.
async fn stop_after<T, E: std::fmt::Display>(
    scan: impl Future<Output = Result<T, LinkError>>,
    stop: impl Future<Output = Result<(), E>>,
) -> Result<T, LinkError> {
    let found = scan.await;
    if let Err(e) = stop.await {
        debug!(error = %e, "failed to stop scan");
    }
    found
}

async fn poll_peripherals(adapter: &Adapter, target: &DeviceTarget) -> Result<Peripheral, LinkError> {
    let deadline = Instant::now() + target.scan_timeout;
    loop {
        for peripheral in adapter.peripherals().await? {
            let name = peripheral
                .properties()
                .await?
                .and_then(|props| props.local_name);
            if name.as_deref() == Some(target.name.as_str()) {
                return Ok(peripheral);
            }
        }
        if Instant::now() >= deadline {
            return Err(LinkError::DeviceNotFound(target.name.clone()));
        }
        tokio::time::sleep(SCAN_POLL).await;
    }
}

async fn open_session(target: &DeviceTarget) -> Result<GattSession, LinkError> {
    let adapter = first_adapter().await?;
    let peripheral = find_peripheral(&adapter, target).await?;

    info!(device = %target.name, "connecting to GATT server");
    peripheral.connect().await?;

    match subscribe(&adapter, &peripheral, target).await {
        Ok(session) => Ok(session),
        Err(e) => {
            let _ = peripheral.disconnect().await;
            Err(e)
        }
    }
}

async fn subscribe(
    adapter: &Adapter,
    peripheral: &Peripheral,
    target: &DeviceTarget,
) -> Result<GattSession, LinkError> {
    peripheral.discover_services().await?;

    if !peripheral.services().iter().any(|s| s.uuid == target.service) {
        return Err(LinkError::ServiceNotFound(target.service));
    }

    let characteristic = peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == target.characteristic && c.service_uuid == target.service)
        .ok_or(LinkError::CharacteristicNotFound(target.characteristic))?;

    let mut notifications = peripheral.notifications().await?;
    let mut central_events = adapter.events().await?;
    peripheral.subscribe(&characteristic).await?;
    debug!(characteristic = %characteristic.uuid, "notifications started");

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let peripheral_id = peripheral.id();
    let wanted = target.characteristic;

    let forward = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(n) = notifications.next() => {
                    if n.uuid == wanted
                        && tx.send(TransportEvent::Notification(n.value)).await.is_err()
                    {
                        break;
                    }
                }
                Some(event) = central_events.next() => {
                    if let CentralEvent::DeviceDisconnected(id) = event {
                        if id == peripheral_id {
                            let _ = tx.send(TransportEvent::PeerDisconnected).await;
                            break;
                        }
                    }
                }
                else => {
                    let _ = tx.send(TransportEvent::PeerDisconnected).await;
                    break;
                }
            }
        }
    });

    Ok(GattSession {
        events: rx,
        connection: Box::new(BtleConnection {
            peripheral: peripheral.clone(),
            characteristic,
            forward,
        }),
    })
}

struct BtleConnection {
    peripheral: Peripheral,
    characteristic: Characteristic,
    forward: JoinHandle<()>,
}

impl GattConnection for BtleConnection {
    fn close(&mut self) -> BoxFuture<'_, Result<(), LinkError>> {
        async move {
            self.forward.abort();
            if let Err(e) = self.peripheral.unsubscribe(&self.characteristic).await {
                debug!(error = %e, "unsubscribe failed");
            }
            self.peripheral.disconnect().await?;
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn scan_is_stopped_when_polling_fails() {
        let stopped = AtomicBool::new(false);
        let result: Result<(), LinkError> = stop_after(
            async { Err(LinkError::Transport("adapter went away".into())) },
            async {
                stopped.store(true, Ordering::SeqCst);
                Ok::<_, btleplug::Error>(())
            },
        )
        .await;

        assert!(matches!(result, Err(LinkError::Transport(_))));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stop_failure_keeps_the_scan_result() {
        let result = stop_after(async { Ok(7) }, async {
            Err::<(), _>(btleplug::Error::NotConnected)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }
}
