use std::fmt;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

/// A named, independently persisted piece of application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Language,
    History,
    TtsEnabled,
    FarmerProfile,
    FarmProfiles,
}

impl Slot {
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Language => "language",
            Slot::History => "history",
            Slot::TtsEnabled => "ttsEnabled",
            Slot::FarmerProfile => "farmerProfile",
            Slot::FarmProfiles => "farmProfiles",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Database {
    /// Read a slot, falling back to `default` when it is missing or cannot be
    /// decoded.  Startup must never fail because of one bad slot.
    pub fn load<T: DeserializeOwned>(&self, slot: Slot, default: T) -> T {
        match self.try_load(slot) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "unreadable slot, using default");
                default
            }
        }
    }

    /// Read and decode a slot. `Ok(None)` if it was never written.
    pub fn try_load<T: DeserializeOwned>(&self, slot: Slot) -> Result<Option<T>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT json FROM slots WHERE name = ?1",
                params![slot.key()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Overwrite a slot with `value`.
    pub fn save<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn().execute(
            "INSERT INTO slots (name, json, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET json = excluded.json, updated_at = excluded.updated_at",
            params![slot.key(), json, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(slot = %slot, bytes = json.len(), "slot saved");
        Ok(())
    }
}
