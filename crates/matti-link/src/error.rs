use thiserror::Error;
use uuid::Uuid;

/// Failure to establish or keep a sensor connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Bluetooth is not available on this system")]
    Unavailable,

    #[error("A sensor connection is already active")]
    AlreadyActive,

    #[error("No device named {0} found")]
    DeviceNotFound(String),

    #[error("Service {0} not found on device")]
    ServiceNotFound(Uuid),

    #[error("Characteristic {0} not found on device")]
    CharacteristicNotFound(Uuid),

    #[error("Bluetooth error: {0}")]
    Transport(String),
}

/// A notification payload that could not be turned into a reading.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}
