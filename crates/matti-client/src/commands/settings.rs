use serde::{Deserialize, Serialize};
use tracing::info;

use matti_shared::Language;

use crate::context::AppContext;
use crate::error::Result;
use crate::state::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub language: Language,
    pub tts_enabled: bool,
}

pub fn get_settings(ctx: &AppContext) -> AppSettings {
    let state = lock(&ctx.state);
    AppSettings {
        language: state.language(),
        tts_enabled: state.tts_enabled(),
    }
}

/// Change the active language.  Persisted immediately and copied into the
/// farmer profile.
pub fn set_language(ctx: &AppContext, language: Language) -> Result<()> {
    lock(&ctx.state).set_language(language)
}

pub fn set_tts_enabled(ctx: &AppContext, enabled: bool) -> Result<()> {
    lock(&ctx.state).set_tts_enabled(enabled)?;
    info!(enabled, "speech output toggled");
    Ok(())
}
