use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{GUNTAS_PER_ACRE, HECTARES_PER_ACRE};
use crate::error::ValidationError;

/// Generate a fresh record identifier (UUID v4, hyphenated).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Te,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Te => "te",
        }
    }

    /// English name of the language, as used in the advisory prompt.
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Te => "Telugu",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "te" => Ok(Self::Te),
            other => Err(ValidationError::UnknownLanguage(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor reading
// ---------------------------------------------------------------------------

/// One validated reading from the soil sensor.
///
/// All fields are already clamped into their physical ranges by the link
/// layer; the struct itself does not re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Device-side timestamp in seconds.
    #[serde(rename = "ts")]
    pub device_timestamp: f64,
    pub ph: f64,
    /// Volumetric moisture, percent.
    pub moisture: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Battery level, percent.
    pub battery: f64,
}

impl SensorReading {
    /// Values shown on the analysis screen when no sensor is connected.
    pub fn manual_default() -> Self {
        Self {
            device_timestamp: 0.0,
            ph: 7.0,
            moisture: 50.0,
            temperature: 25.0,
            battery: 100.0,
        }
    }
}

/// Fields of a reading that can be entered by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingField {
    Ph,
    Moisture,
    Temperature,
}

impl FromStr for ReadingField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ph" => Ok(Self::Ph),
            "moisture" => Ok(Self::Moisture),
            "temperature" | "temp" => Ok(Self::Temperature),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// A latitude/longitude fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for GeoFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Advisory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilHealth {
    Healthy,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Poor,
}

impl fmt::Display for SoilHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "Healthy",
            Self::NeedsImprovement => "Needs Improvement",
            Self::Poor => "Poor",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResult {
    pub soil_health: SoilHealth,
    pub crop_suggestions: String,
    pub fertilizer_advice: String,
    pub irrigation_suggestion: String,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// A saved test result. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    /// May dangle after the farm is deleted.
    pub farm_id: String,
    /// App-side save time, milliseconds since the epoch.
    #[serde(rename = "timestamp")]
    pub saved_at: i64,
    pub location: Option<GeoFix>,
    #[serde(rename = "values")]
    pub reading: SensorReading,
    #[serde(rename = "aiResult")]
    pub advisory: AdvisoryResult,
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub language: Language,
    /// Base64-encoded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl FarmerProfile {
    pub fn new(name: impl Into<String>, language: Language) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            phone: None,
            village: None,
            district: None,
            state: None,
            language,
            photo: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandUnit {
    #[default]
    Acres,
    Guntas,
    Hectares,
}

impl FromStr for LandUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acres" | "acre" => Ok(Self::Acres),
            "guntas" | "gunta" => Ok(Self::Guntas),
            "hectares" | "hectare" | "ha" => Ok(Self::Hectares),
            _ => Err(ValidationError::InvalidFarmSize),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandSize {
    pub value: f64,
    pub unit: LandUnit,
}

impl LandSize {
    pub fn acres(value: f64) -> Self {
        Self {
            value,
            unit: LandUnit::Acres,
        }
    }

    pub fn to_acres(&self) -> f64 {
        match self.unit {
            LandUnit::Acres => self.value,
            LandUnit::Guntas => self.value / GUNTAS_PER_ACRE,
            LandUnit::Hectares => self.value / HECTARES_PER_ACRE,
        }
    }
}

impl Default for LandSize {
    fn default() -> Self {
        Self::acres(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilType {
    Sandy,
    Loamy,
    Black,
    Red,
    Clay,
    Other,
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for SoilType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "sandy" => Self::Sandy,
            "loamy" => Self::Loamy,
            "black" => Self::Black,
            "red" => Self::Red,
            "clay" => Self::Clay,
            _ => Self::Other,
        })
    }
}

/// Where a farm is: a GPS fix or a typed address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FarmLocation {
    Gps(GeoFix),
    Address(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmProfile {
    pub id: String,
    pub name: String,
    pub location: Option<FarmLocation>,
    pub size: LandSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<SoilType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_crop: Option<String>,
}

impl FarmProfile {
    pub fn new(name: impl Into<String>, size: LandSize) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            location: None,
            size,
            soil_type: None,
            current_crop: None,
        }
    }
}
