use serde::Serialize;

use matti_shared::{GeoFix, HistoryEntry, SensorReading, SoilHealth};

use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::history::{farm_label, TrendPoint};
use crate::session::{AnalysisSession, AnalysisSource, Screen};
use crate::state::lock;

/// One line of the history screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: String,
    pub saved_at: i64,
    pub farm_name: String,
    pub soil_health: SoilHealth,
    pub reading: SensorReading,
    pub location: Option<GeoFix>,
}

/// Saved tests, newest first.
pub fn list_history(ctx: &AppContext) -> Vec<HistoryRow> {
    let state = lock(&ctx.state);
    let farms = state.profiles().farms();
    let language = state.language();
    state
        .history()
        .list()
        .iter()
        .map(|entry| HistoryRow {
            id: entry.id.clone(),
            saved_at: entry.saved_at,
            farm_name: farm_label(entry, farms, language).to_string(),
            soil_health: entry.advisory.soil_health,
            reading: entry.reading,
            location: entry.location,
        })
        .collect()
}

pub fn get_entry(ctx: &AppContext, id: &str) -> Result<HistoryEntry> {
    lock(&ctx.state)
        .history()
        .get(id)
        .cloned()
        .ok_or_else(|| ClientError::NotFound {
            kind: "History entry",
            id: id.to_string(),
        })
}

/// Readings over time, oldest first.  With `farm_id`, only that farm's tests.
pub fn trend(ctx: &AppContext, farm_id: Option<&str>) -> Vec<TrendPoint> {
    lock(&ctx.state).history().trend(farm_id)
}

/// Reopen a saved test on the analysis screen, read-only.
pub fn replay(ctx: &AppContext, id: &str) -> Result<AnalysisSession> {
    let entry = get_entry(ctx, id)?;
    let mut state = lock(&ctx.state);
    state.navigate(Screen::Analysis, Some(AnalysisSource::Replay(entry)));
    state
        .session()
        .analysis()
        .cloned()
        .ok_or(ClientError::NoAnalysis)
}
