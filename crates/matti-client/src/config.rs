//! Client configuration loaded from environment variables.
//!
//! Everything has a default so the client runs with zero configuration;
//! only the advisory service needs an API key.

use std::path::PathBuf;
use std::time::Duration;

use matti_advisory::GeminiConfig;
use matti_link::DeviceTarget;
use matti_shared::constants::{DEVICE_NAME, DEFAULT_SCAN_TIMEOUT_SECS};
use matti_shared::GeoFix;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Env: `GEMINI_API_KEY`, falling back to `API_KEY`.
    /// `MATTI_API_BASE`, `MATTI_TEXT_MODEL` and `MATTI_SPEECH_MODEL`
    /// override the endpoint and models.
    pub gemini: GeminiConfig,

    /// Advertised name of the sensor.
    /// Env: `MATTI_DEVICE_NAME`
    /// Default: `SOIL-ESP32`
    pub device_name: String,

    /// How long discovery looks for the sensor.
    /// Env: `MATTI_SCAN_TIMEOUT_SECS`
    /// Default: 10 s
    pub scan_timeout: Duration,

    /// Directory holding the database.
    /// Env: `MATTI_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,

    /// Fixed position reported for saved tests, as `lat,lon`.
    /// Env: `MATTI_LOCATION`
    /// Default: none (tests are saved without a location).
    pub location: Option<GeoFix>,

    pub location_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            device_name: DEVICE_NAME.to_string(),
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
            data_dir: None,
            location: None,
            location_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        config.gemini.api_key = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .filter(|k| !k.trim().is_empty());

        if let Some(base) = var("MATTI_API_BASE") {
            config.gemini.api_base = base;
        }
        if let Some(model) = var("MATTI_TEXT_MODEL") {
            config.gemini.text_model = model;
        }
        if let Some(model) = var("MATTI_SPEECH_MODEL") {
            config.gemini.speech_model = model;
        }

        if let Some(name) = var("MATTI_DEVICE_NAME") {
            if !name.trim().is_empty() {
                config.device_name = name;
            }
        }

        if let Some(val) = var("MATTI_SCAN_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.scan_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid MATTI_SCAN_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(dir) = var("MATTI_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(val) = var("MATTI_LOCATION") {
            match parse_fix(&val) {
                Ok(fix) => config.location = Some(fix),
                Err(e) => tracing::warn!(value = %val, error = %e, "Invalid MATTI_LOCATION, ignoring"),
            }
        }

        config
    }

    pub fn device_target(&self) -> DeviceTarget {
        DeviceTarget {
            name: self.device_name.clone(),
            scan_timeout: self.scan_timeout,
            ..DeviceTarget::default()
        }
    }
}

/// Parse `"lat,lon"` in decimal degrees.
pub fn parse_fix(s: &str) -> Result<GeoFix, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got {s:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude: {lat}"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude: {lon}"))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude out of range: {lat}"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude out of range: {lon}"));
    }
    Ok(GeoFix { lat, lon })
}
