//! The farmer profile and the farms they manage.

use matti_shared::{FarmProfile, FarmerProfile, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileRegistry {
    farmer: Option<FarmerProfile>,
    farms: Vec<FarmProfile>,
}

impl ProfileRegistry {
    pub fn new(farmer: Option<FarmerProfile>, farms: Vec<FarmProfile>) -> Self {
        Self { farmer, farms }
    }

    pub fn farmer(&self) -> Option<&FarmerProfile> {
        self.farmer.as_ref()
    }

    pub(crate) fn farmer_mut(&mut self) -> Option<&mut FarmerProfile> {
        self.farmer.as_mut()
    }

    pub fn farms(&self) -> &[FarmProfile] {
        &self.farms
    }

    pub fn get_farm(&self, id: &str) -> Option<&FarmProfile> {
        self.farms.iter().find(|f| f.id == id)
    }

    /// Replace the farmer profile. The name is required.
    pub fn set_farmer(&mut self, mut profile: FarmerProfile) -> Result<(), ValidationError> {
        profile.name = profile.name.trim().to_string();
        if profile.name.is_empty() {
            return Err(ValidationError::MissingFarmerName);
        }
        self.farmer = Some(profile);
        Ok(())
    }

    /// Replace the farm with the same id, or append a new one.
    pub fn upsert_farm(&mut self, mut farm: FarmProfile) -> Result<Upsert, ValidationError> {
        farm.name = farm.name.trim().to_string();
        if farm.name.is_empty() {
            return Err(ValidationError::MissingFarmName);
        }
        if !farm.size.value.is_finite() || farm.size.value <= 0.0 {
            return Err(ValidationError::InvalidFarmSize);
        }

        match self.farms.iter_mut().find(|f| f.id == farm.id) {
            Some(existing) => {
                *existing = farm;
                Ok(Upsert::Replaced)
            }
            None => {
                self.farms.push(farm);
                Ok(Upsert::Inserted)
            }
        }
    }

    /// Remove a farm. Irreversible, so the caller must pass the user's
    /// confirmation. Returns whether anything was removed.
    pub fn delete_farm(&mut self, id: &str, confirmed: bool) -> Result<bool, ValidationError> {
        if !confirmed {
            return Err(ValidationError::DeleteNotConfirmed);
        }
        let before = self.farms.len();
        self.farms.retain(|f| f.id != id);
        Ok(self.farms.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matti_shared::{LandSize, Language};

    #[test]
    fn farmer_name_is_required_and_trimmed() {
        let mut reg = ProfileRegistry::default();
        assert_eq!(
            reg.set_farmer(FarmerProfile::new("   ", Language::En)),
            Err(ValidationError::MissingFarmerName)
        );
        reg.set_farmer(FarmerProfile::new("  Ramesh ", Language::Te)).unwrap();
        assert_eq!(reg.farmer().unwrap().name, "Ramesh");
    }

    #[test]
    fn upsert_appends_then_replaces() {
        let mut reg = ProfileRegistry::default();
        let mut farm = FarmProfile::new("North", LandSize::acres(2.0));
        assert_eq!(reg.upsert_farm(farm.clone()), Ok(Upsert::Inserted));

        farm.current_crop = Some("Chilli".into());
        assert_eq!(reg.upsert_farm(farm.clone()), Ok(Upsert::Replaced));
        assert_eq!(reg.farms().len(), 1);
        assert_eq!(reg.get_farm(&farm.id).unwrap().current_crop.as_deref(), Some("Chilli"));

        reg.upsert_farm(FarmProfile::new("South", LandSize::acres(1.0))).unwrap();
        assert_eq!(reg.farms()[1].name, "South");
    }

    #[test]
    fn upsert_validates() {
        let mut reg = ProfileRegistry::default();
        assert_eq!(
            reg.upsert_farm(FarmProfile::new("", LandSize::acres(1.0))),
            Err(ValidationError::MissingFarmName)
        );
        assert_eq!(
            reg.upsert_farm(FarmProfile::new("Plot", LandSize::acres(0.0))),
            Err(ValidationError::InvalidFarmSize)
        );
        assert!(reg.farms().is_empty());
    }

    #[test]
    fn delete_requires_confirmation() {
        let farm = FarmProfile::new("North", LandSize::acres(2.0));
        let mut reg = ProfileRegistry::new(None, vec![farm.clone()]);

        assert_eq!(
            reg.delete_farm(&farm.id, false),
            Err(ValidationError::DeleteNotConfirmed)
        );
        assert_eq!(reg.farms().len(), 1);

        assert_eq!(reg.delete_farm(&farm.id, true), Ok(true));
        assert_eq!(reg.delete_farm(&farm.id, true), Ok(false));
        assert!(reg.farms().is_empty());
    }
}
