//! Decoding of sensor notifications.
//!
//! The sensor sends `{"ts":..,"ph":..,"moisture":..,"temperature":..,"battery":..}`
//! as UTF-8 JSON.  Every field is optional; values are clamped into their
//! physical range rather than rejected.  Numbers too large for an f64 are
//! read as infinity and clamp to the range edge.

use std::collections::HashMap;

use serde_json::value::RawValue;

use matti_shared::{now_millis, SensorReading};

use crate::error::PayloadError;

pub const PH_RANGE: (f64, f64) = (0.0, 14.0);
pub const MOISTURE_RANGE: (f64, f64) = (0.0, 100.0);
pub const TEMPERATURE_RANGE: (f64, f64) = (-10.0, 60.0);
pub const BATTERY_RANGE: (f64, f64) = (0.0, 100.0);

/// Seconds since the Unix epoch, with millisecond precision.
pub fn now_secs() -> f64 {
    now_millis() as f64 / 1000.0
}

/// Decode one notification.
///
/// Missing or non-numeric fields become 0; a missing, zero or non-finite
/// `ts` becomes `now_secs`.
pub fn decode_payload(bytes: &[u8], now_secs: f64) -> Result<SensorReading, PayloadError> {
    let text = std::str::from_utf8(bytes)?;
    let raw: &RawValue = serde_json::from_str(text)?;
    if !raw.get().trim_start().starts_with('{') {
        return Err(PayloadError::NotAnObject);
    }
    // Fields stay unparsed so an out-of-range number is not a syntax error.
    let object: HashMap<String, &RawValue> = serde_json::from_str(raw.get())?;

    let field = |key: &str| {
        object
            .get(key)
            .and_then(|raw| raw.get().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let clamp = |v: f64, (lo, hi): (f64, f64)| v.clamp(lo, hi);

    let ts = field("ts");

    Ok(SensorReading {
        device_timestamp: if ts.is_finite() && ts != 0.0 { ts } else { now_secs },
        ph: clamp(field("ph"), PH_RANGE),
        moisture: clamp(field("moisture"), MOISTURE_RANGE),
        temperature: clamp(field("temperature"), TEMPERATURE_RANGE),
        battery: clamp(field("battery"), BATTERY_RANGE),
    })
}
