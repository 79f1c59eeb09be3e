use serde::Serialize;
use tracing::info;

use matti_link::LinkStatus;
use matti_shared::SensorReading;

use crate::context::AppContext;
use crate::error::Result;
use crate::state::lock;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    pub device_name: String,
    pub status: LinkStatus,
    pub live_reading: Option<SensorReading>,
}

pub fn sensor_status(ctx: &AppContext) -> SensorStatus {
    SensorStatus {
        device_name: ctx.link.target().name.clone(),
        status: ctx.link.status(),
        live_reading: lock(&ctx.state).live_reading(),
    }
}

pub async fn bluetooth_available(ctx: &AppContext) -> bool {
    ctx.link.is_available().await
}

/// Discover the sensor and start streaming. Readings reach the state through
/// the link bridge.
pub async fn connect_sensor(ctx: &AppContext) -> Result<()> {
    ctx.link.connect().await?;
    info!(device = %ctx.link.target().name, "sensor streaming");
    Ok(())
}

pub async fn disconnect_sensor(ctx: &AppContext) {
    ctx.link.disconnect().await;
}
