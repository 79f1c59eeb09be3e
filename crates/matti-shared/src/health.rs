//! Local soil-health classification.
//!
//! This never touches the network, so a category is always available even
//! when the advisory service is unreachable.

use std::ops::RangeInclusive;

use crate::types::{SensorReading, SoilHealth};

pub const GOOD_PH: RangeInclusive<f64> = 5.8..=7.2;
pub const GOOD_MOISTURE: RangeInclusive<f64> = 30.0..=60.0;
pub const GOOD_TEMPERATURE: RangeInclusive<f64> = 15.0..=32.0;

/// Classify a reading by how many of pH, moisture and temperature fall in
/// their good range (bounds inclusive). Battery is ignored.
pub fn classify(reading: &SensorReading) -> SoilHealth {
    let checks = [
        GOOD_PH.contains(&reading.ph),
        GOOD_MOISTURE.contains(&reading.moisture),
        GOOD_TEMPERATURE.contains(&reading.temperature),
    ];

    match checks.iter().filter(|good| **good).count() {
        3 => SoilHealth::Healthy,
        2 => SoilHealth::NeedsImprovement,
        _ => SoilHealth::Poor,
    }
}
