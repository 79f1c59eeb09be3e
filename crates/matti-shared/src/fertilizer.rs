//! Fertilizer quantity calculator.
//!
//! Target nutrient levels are given in kg per hectare; the farm size is in
//! acres unless a [`LandSize`] with another unit is supplied.

use serde::{Deserialize, Serialize};

use crate::constants::HECTARES_PER_ACRE;
use crate::error::ValidationError;
use crate::types::LandSize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Npk {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl Default for Npk {
    fn default() -> Self {
        Self {
            nitrogen: 50.0,
            phosphorus: 25.0,
            potassium: 25.0,
        }
    }
}

/// Kilograms of each nutrient needed to reach `target` (kg/ha) over `size`.
pub fn required_fertilizer(size: LandSize, target: Npk) -> Result<Npk, ValidationError> {
    let acres = size.to_acres();
    if !acres.is_finite() || acres <= 0.0 {
        return Err(ValidationError::InvalidFarmSize);
    }

    let hectares = acres * HECTARES_PER_ACRE;
    Ok(Npk {
        nitrogen: target.nitrogen * hectares,
        phosphorus: target.phosphorus * hectares,
        potassium: target.potassium * hectares,
    })
}
