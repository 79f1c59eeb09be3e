/// Advertised name of the soil-sensor peripheral
pub const DEVICE_NAME: &str = "SOIL-ESP32";

/// GATT service exposed by the soil sensor
pub const SOIL_SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

/// Notifying characteristic carrying JSON readings
pub const SOIL_CHARACTERISTIC_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

/// Default BLE scan timeout in seconds
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;

/// Gemini REST endpoint root
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for the advisory report
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Model used for speech synthesis
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Synthesized speech format: 16-bit PCM, mono, 24 kHz
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
pub const SPEECH_CHANNELS: u16 = 1;
pub const SPEECH_BITS_PER_SAMPLE: u16 = 16;

/// Placeholder for an advisory section the model did not produce
pub const UNDETERMINED_SECTION: &str = "Could not determine.";

/// Hectares per acre, used by the fertilizer calculator
pub const HECTARES_PER_ACRE: f64 = 0.404686;

/// Guntas per acre
pub const GUNTAS_PER_ACRE: f64 = 40.0;
