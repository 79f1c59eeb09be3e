use tracing::info;

use matti_shared::{FarmProfile, FarmerProfile};

use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::profiles::Upsert;
use crate::session::Screen;
use crate::state::lock;

pub fn current_farmer(ctx: &AppContext) -> Option<FarmerProfile> {
    lock(&ctx.state).profiles().farmer().cloned()
}

/// Create or replace the farmer profile.  Finishing onboarding lands on the
/// home screen.
pub fn save_farmer(ctx: &AppContext, profile: FarmerProfile) -> Result<()> {
    let mut state = lock(&ctx.state);
    state.save_farmer(profile)?;
    if state.session().screen() == Screen::ProfileSetup {
        state.navigate(Screen::Home, None);
    }
    info!("farmer profile saved");
    Ok(())
}

pub fn list_farms(ctx: &AppContext) -> Vec<FarmProfile> {
    lock(&ctx.state).profiles().farms().to_vec()
}

pub fn get_farm(ctx: &AppContext, id: &str) -> Result<FarmProfile> {
    lock(&ctx.state)
        .profiles()
        .get_farm(id)
        .cloned()
        .ok_or_else(|| ClientError::NotFound {
            kind: "Farm",
            id: id.to_string(),
        })
}

pub fn add_farm(ctx: &AppContext, farm: FarmProfile) -> Result<Upsert> {
    let name = farm.name.clone();
    let outcome = lock(&ctx.state).upsert_farm(farm)?;
    info!(farm = %name.trim(), ?outcome, "farm saved");
    Ok(outcome)
}

/// Replace an existing farm; unlike [`add_farm`] the id must already exist.
pub fn update_farm(ctx: &AppContext, farm: FarmProfile) -> Result<()> {
    let mut state = lock(&ctx.state);
    if state.profiles().get_farm(&farm.id).is_none() {
        return Err(ClientError::NotFound {
            kind: "Farm",
            id: farm.id,
        });
    }
    state.upsert_farm(farm)?;
    Ok(())
}

/// Remove a farm.  History entries that point at it are kept.
pub fn delete_farm(ctx: &AppContext, id: &str, confirmed: bool) -> Result<()> {
    if !lock(&ctx.state).delete_farm(id, confirmed)? {
        return Err(ClientError::NotFound {
            kind: "Farm",
            id: id.to_string(),
        });
    }
    info!(farm = %id, "farm deleted");
    Ok(())
}
