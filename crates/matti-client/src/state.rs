//! Application state shared by every command.
//!
//! [`AppState`] is wrapped in `Arc<Mutex<>>` ([`SharedState`]).  Each field
//! has a single writer: the mutators below.  Every mutator that touches a
//! persisted slot tells the registered [`StateObserver`], which for real runs
//! is a [`SlotPersister`] writing that one slot to the database.
//!
//! The lock is never held across an `.await`.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use matti_link::LinkStatus;
use matti_shared::{
    AdvisoryResult, FarmProfile, FarmerProfile, GeoFix, HistoryEntry, Language, SensorReading,
};
use matti_store::{Database, Slot, StoreError};

use crate::error::{ClientError, Result};
use crate::history::HistoryLedger;
use crate::profiles::{ProfileRegistry, Upsert};
use crate::session::{AnalysisSource, Screen, Session};

pub type SharedState = Arc<Mutex<AppState>>;

/// Lock the shared state, recovering from a poisoned mutex.
pub fn lock(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Notified after a persisted slot changed in memory.
pub trait StateObserver: Send {
    fn slot_changed(&self, slot: Slot, state: &AppState) -> std::result::Result<(), StoreError>;
}

/// Writes changed slots straight to the database.
pub struct SlotPersister {
    db: Database,
}

impl SlotPersister {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl StateObserver for SlotPersister {
    fn slot_changed(&self, slot: Slot, state: &AppState) -> std::result::Result<(), StoreError> {
        match slot {
            Slot::Language => self.db.save(slot, &state.language),
            Slot::History => self.db.save(slot, state.history.list()),
            Slot::TtsEnabled => self.db.save(slot, &state.tts_enabled),
            Slot::FarmerProfile => self.db.save(slot, &state.profiles.farmer()),
            Slot::FarmProfiles => self.db.save(slot, state.profiles.farms()),
        }?;
        debug!(%slot, "slot persisted");
        Ok(())
    }
}

/// Long-running actions that must not overlap with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Analysis,
    Save,
    Speech,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Analysis => "Analysis",
            Action::Save => "Save",
            Action::Speech => "Speech",
        })
    }
}

/// Set of actions currently outstanding.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<Action>>>,
}

impl InFlight {
    /// Claim `action`, or fail with [`ClientError::Busy`] if it is already
    /// running.  The claim is released when the guard drops.
    pub fn begin(&self, action: Action) -> Result<InFlightGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(action) {
            return Err(ClientError::Busy(action));
        }
        Ok(InFlightGuard {
            active: self.active.clone(),
            action,
        })
    }

    pub fn is_active(&self, action: Action) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&action)
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<Action>>>,
    action: Action,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action);
    }
}

/// Central application state.
pub struct AppState {
    pub(crate) language: Language,
    pub(crate) tts_enabled: bool,
    pub(crate) history: HistoryLedger,
    pub(crate) profiles: ProfileRegistry,
    pub(crate) session: Session,
    pub(crate) ble_status: LinkStatus,
    /// Latest reading from the sensor. Cleared when the link goes down.
    pub(crate) live_reading: Option<SensorReading>,
    pub(crate) in_flight: InFlight,
    observer: Option<Box<dyn StateObserver>>,
}

impl AppState {
    /// Fresh state with defaults and no persistence.
    pub fn new() -> Self {
        Self::from_parts(
            Language::default(),
            true,
            HistoryLedger::default(),
            ProfileRegistry::default(),
        )
    }

    /// Read every slot once, falling back to defaults, and persist later
    /// changes back to `db`.
    pub fn load(db: Database) -> Self {
        let language: Language = db.load(Slot::Language, Language::default());
        let tts_enabled: bool = db.load(Slot::TtsEnabled, true);
        let history: Vec<HistoryEntry> = db.load(Slot::History, Vec::new());
        let mut farmer: Option<FarmerProfile> = db.load(Slot::FarmerProfile, None);
        let farms: Vec<FarmProfile> = db.load(Slot::FarmProfiles, Vec::new());

        // The language slot is authoritative.
        let farmer_synced = match farmer.as_mut() {
            Some(farmer) if farmer.language != language => {
                farmer.language = language;
                true
            }
            _ => false,
        };

        info!(
            %language,
            entries = history.len(),
            farms = farms.len(),
            has_farmer = farmer.is_some(),
            "state loaded"
        );

        let state = Self::from_parts(
            language,
            tts_enabled,
            HistoryLedger::from_entries(history),
            ProfileRegistry::new(farmer, farms),
        )
        .with_observer(Box::new(SlotPersister::new(db)));
        if farmer_synced {
            if let Err(err) = state.notify(Slot::FarmerProfile) {
                warn!(error = %err, "failed to persist farmer language");
            }
        }
        state
    }

    fn from_parts(
        language: Language,
        tts_enabled: bool,
        history: HistoryLedger,
        profiles: ProfileRegistry,
    ) -> Self {
        Self {
            language,
            tts_enabled,
            history,
            session: Session::start(profiles.farmer().is_some()),
            profiles,
            ble_status: LinkStatus::Disconnected,
            live_reading: None,
            in_flight: InFlight::default(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn StateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    fn notify(&self, slot: Slot) -> Result<()> {
        if let Some(observer) = &self.observer {
            observer.slot_changed(slot, self)?;
        }
        Ok(())
    }

    // -- read access ---------------------------------------------------------

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn tts_enabled(&self) -> bool {
        self.tts_enabled
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ble_status(&self) -> LinkStatus {
        self.ble_status
    }

    pub fn live_reading(&self) -> Option<SensorReading> {
        self.live_reading
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    // -- mutators ------------------------------------------------------------

    /// Switch the active language; the farmer profile follows.
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        self.language = language;
        self.notify(Slot::Language)?;

        let farmer_changed = match self.profiles.farmer_mut() {
            Some(farmer) if farmer.language != language => {
                farmer.language = language;
                true
            }
            _ => false,
        };
        if farmer_changed {
            self.notify(Slot::FarmerProfile)?;
        }
        info!(%language, "language changed");
        Ok(())
    }

    pub fn set_tts_enabled(&mut self, enabled: bool) -> Result<()> {
        self.tts_enabled = enabled;
        self.notify(Slot::TtsEnabled)
    }

    /// Store the farmer profile and adopt its language.
    pub fn save_farmer(&mut self, profile: FarmerProfile) -> Result<()> {
        let language = profile.language;
        self.profiles.set_farmer(profile)?;
        self.notify(Slot::FarmerProfile)?;
        if self.language != language {
            self.language = language;
            self.notify(Slot::Language)?;
        }
        Ok(())
    }

    pub fn upsert_farm(&mut self, farm: FarmProfile) -> Result<Upsert> {
        let outcome = self.profiles.upsert_farm(farm)?;
        self.notify(Slot::FarmProfiles)?;
        Ok(outcome)
    }

    pub fn delete_farm(&mut self, id: &str, confirmed: bool) -> Result<bool> {
        let removed = self.profiles.delete_farm(id, confirmed)?;
        if removed {
            self.notify(Slot::FarmProfiles)?;
        }
        Ok(removed)
    }

    pub fn append_history(
        &mut self,
        reading: SensorReading,
        advisory: AdvisoryResult,
        farm_id: String,
        location: Option<GeoFix>,
    ) -> Result<HistoryEntry> {
        let entry = self.history.append(reading, advisory, farm_id, location);
        self.notify(Slot::History)?;
        Ok(entry)
    }

    pub fn navigate(&mut self, screen: Screen, source: Option<AnalysisSource>) {
        self.session
            .navigate(screen, source, self.live_reading, self.profiles.farms());
    }

    pub fn back(&mut self) {
        self.session.back();
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn set_ble_status(&mut self, status: LinkStatus) {
        if status == LinkStatus::Disconnected {
            self.live_reading = None;
        }
        self.ble_status = status;
    }

    pub fn record_reading(&mut self, reading: SensorReading) {
        self.live_reading = Some(reading);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matti_shared::{LandSize, SoilHealth};

    fn advisory() -> AdvisoryResult {
        AdvisoryResult {
            soil_health: SoilHealth::Healthy,
            crop_suggestions: "Paddy".into(),
            fertilizer_advice: "Urea".into(),
            irrigation_suggestion: "Weekly".into(),
        }
    }

    fn persisted() -> (tempfile::TempDir, SharedState) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_dir(dir.path()).unwrap();
        (dir, AppState::load(db).into_shared())
    }

    fn reopen(dir: &tempfile::TempDir) -> AppState {
        AppState::load(Database::open_in_dir(dir.path()).unwrap())
    }

    #[test]
    fn defaults_without_stored_data() {
        let (_dir, state) = persisted();
        let s = lock(&state);
        assert_eq!(s.language(), Language::En);
        assert!(s.tts_enabled());
        assert!(s.history().is_empty());
        assert!(s.profiles().farmer().is_none());
        assert_eq!(s.session().screen(), Screen::ProfileSetup);
    }

    #[test]
    fn language_change_propagates_to_farmer_and_persists() {
        let (dir, state) = persisted();
        {
            let mut s = lock(&state);
            s.save_farmer(FarmerProfile::new("Lakshmi", Language::En)).unwrap();
            s.set_language(Language::Te).unwrap();
        }

        let reloaded = reopen(&dir);
        assert_eq!(reloaded.language(), Language::Te);
        assert_eq!(reloaded.profiles().farmer().unwrap().language, Language::Te);
        assert_eq!(reloaded.session().screen(), Screen::Home);
    }

    #[test]
    fn load_writes_back_farmer_language() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::open_in_dir(dir.path()).unwrap();
            db.save(Slot::Language, &Language::En).unwrap();
            db.save(
                Slot::FarmerProfile,
                &Some(FarmerProfile::new("Venkat", Language::Te)),
            )
            .unwrap();
        }

        let loaded = reopen(&dir);
        assert_eq!(loaded.profiles().farmer().unwrap().language, Language::En);
        drop(loaded);

        let db = Database::open_in_dir(dir.path()).unwrap();
        let stored: Option<FarmerProfile> = db.load(Slot::FarmerProfile, None);
        assert_eq!(stored.unwrap().language, Language::En);
    }

    #[test]
    fn saving_farmer_adopts_their_language() {
        let (dir, state) = persisted();
        lock(&state)
            .save_farmer(FarmerProfile::new("Ravi", Language::Te))
            .unwrap();
        assert_eq!(reopen(&dir).language(), Language::Te);
    }

    #[test]
    fn deleted_farm_leaves_history_intact() {
        let (dir, state) = persisted();
        let farm = FarmProfile::new("North field", LandSize::acres(2.0));
        let farm_id = farm.id.clone();
        {
            let mut s = lock(&state);
            s.upsert_farm(farm).unwrap();
            s.append_history(
                SensorReading::manual_default(),
                advisory(),
                farm_id.clone(),
                None,
            )
            .unwrap();
            assert!(s.delete_farm(&farm_id, true).unwrap());
        }

        let reloaded = reopen(&dir);
        assert!(reloaded.profiles().farms().is_empty());
        assert_eq!(reloaded.history().len(), 1);
        let entry = &reloaded.history().list()[0];
        assert_eq!(entry.farm_id, farm_id);
        assert_eq!(
            crate::history::farm_label(entry, reloaded.profiles().farms(), Language::En),
            "Unknown Farm"
        );
    }

    #[test]
    fn history_reloads_newest_first() {
        let (dir, state) = persisted();
        {
            let mut s = lock(&state);
            for i in 0..3 {
                let mut reading = SensorReading::manual_default();
                reading.ph = i as f64;
                s.append_history(reading, advisory(), "f".into(), None).unwrap();
            }
        }
        let reloaded = reopen(&dir);
        let phs: Vec<f64> = reloaded.history().list().iter().map(|e| e.reading.ph).collect();
        assert_eq!(phs, vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn tts_toggle_persists() {
        let (dir, state) = persisted();
        lock(&state).set_tts_enabled(false).unwrap();
        assert!(!reopen(&dir).tts_enabled());
    }

    #[test]
    fn disconnect_clears_live_reading() {
        let mut s = AppState::new();
        s.set_ble_status(LinkStatus::Connected);
        s.record_reading(SensorReading::manual_default());
        assert!(s.live_reading().is_some());

        s.set_ble_status(LinkStatus::Disconnected);
        assert!(s.live_reading().is_none());
    }

    #[test]
    fn in_flight_rejects_overlap_until_released() {
        let flights = InFlight::default();
        let guard = flights.begin(Action::Save).unwrap();
        assert!(matches!(
            flights.begin(Action::Save),
            Err(ClientError::Busy(Action::Save))
        ));
        assert!(flights.begin(Action::Analysis).is_ok());

        drop(guard);
        assert!(!flights.is_active(Action::Save));
        assert!(flights.begin(Action::Save).is_ok());
    }
}
