//! The ledger of saved soil tests.
//!
//! Entries are only ever prepended, so iteration order is newest first.
//! Farm references are not checked against the registry; a deleted farm just
//! renders as "Unknown Farm".

use serde::Serialize;

use matti_shared::i18n::strings;
use matti_shared::{
    new_id, now_millis, AdvisoryResult, FarmProfile, GeoFix, HistoryEntry, Language,
    SensorReading,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

/// One point of the pH / moisture / temperature trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub saved_at: i64,
    pub ph: f64,
    pub moisture: f64,
    pub temperature: f64,
}

impl HistoryLedger {
    /// Wrap entries loaded from storage (already newest first).
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn append(
        &mut self,
        reading: SensorReading,
        advisory: AdvisoryResult,
        farm_id: String,
        location: Option<GeoFix>,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            id: new_id(),
            farm_id,
            saved_at: now_millis(),
            location,
            reading,
            advisory,
        };
        self.entries.insert(0, entry.clone());
        entry
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_farm<'a>(&'a self, farm_id: &'a str) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.entries.iter().filter(move |e| e.farm_id == farm_id)
    }

    /// Oldest-first series for charting, optionally limited to one farm.
    pub fn trend(&self, farm_id: Option<&str>) -> Vec<TrendPoint> {
        let entries: Vec<&HistoryEntry> = match farm_id {
            Some(id) => self.for_farm(id).collect(),
            None => self.entries.iter().collect(),
        };
        entries.into_iter().rev().map(TrendPoint::from).collect()
    }
}

impl From<&HistoryEntry> for TrendPoint {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            saved_at: entry.saved_at,
            ph: entry.reading.ph,
            moisture: entry.reading.moisture,
            temperature: entry.reading.temperature,
        }
    }
}

/// Name of the farm an entry belongs to, or the "unknown" label if it has
/// been deleted.
pub fn farm_label<'a>(entry: &HistoryEntry, farms: &'a [FarmProfile], language: Language) -> &'a str {
    farms
        .iter()
        .find(|f| f.id == entry.farm_id)
        .map(|f| f.name.as_str())
        .unwrap_or(strings(language).unknown_farm)
}
