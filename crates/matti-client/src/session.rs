//! Screen routing and the analysis session.
//!
//! There is no back stack: going back always lands on [`Screen::Home`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use matti_shared::{
    AdvisoryResult, FarmProfile, HistoryEntry, ReadingField, SensorReading, ValidationError,
};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Home,
    ProfileSetup,
    Analysis,
    History,
    Settings,
    Profile,
    Fertilizer,
    Schemes,
    Weather,
    Disease,
    Drone,
    Community,
}

impl Screen {
    /// Screens that only show a "coming soon" notice.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Screen::Weather | Screen::Disease | Screen::Drone | Screen::Community
        )
    }

    pub fn shows_header(&self) -> bool {
        *self != Screen::ProfileSetup
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default();
        f.write_str(&s)
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown screen: {s}"))
    }
}

/// What the analysis screen was opened with.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisSource {
    /// A reading that has not been saved yet.
    Live(SensorReading),
    /// A saved test, shown read-only.
    Replay(HistoryEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSession {
    reading: SensorReading,
    /// Id of the history entry being replayed, if any.
    replay_of: Option<String>,
    advisory: Option<AdvisoryResult>,
    selected_farm: Option<String>,
    saved: bool,
}

impl AnalysisSession {
    fn live(reading: SensorReading, farms: &[FarmProfile]) -> Self {
        Self {
            reading,
            replay_of: None,
            advisory: None,
            selected_farm: farms.first().map(|f| f.id.clone()),
            saved: false,
        }
    }

    fn replay(entry: HistoryEntry) -> Self {
        Self {
            reading: entry.reading,
            replay_of: Some(entry.id),
            advisory: Some(entry.advisory),
            selected_farm: Some(entry.farm_id),
            saved: true,
        }
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn advisory(&self) -> Option<&AdvisoryResult> {
        self.advisory.as_ref()
    }

    pub fn selected_farm(&self) -> Option<&str> {
        self.selected_farm.as_deref()
    }

    pub fn replay_of(&self) -> Option<&str> {
        self.replay_of.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.replay_of.is_some()
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Whether the save action should be offered.
    pub fn can_save(&self) -> bool {
        !self.is_read_only() && !self.saved && self.advisory.is_some()
    }

    /// Manual input. Invalidates any advisory computed for the old values.
    pub fn edit_reading(&mut self, field: ReadingField, value: f64) -> Result<()> {
        if self.is_read_only() {
            return Err(ClientError::ReadOnly);
        }
        let value = if value.is_finite() { value } else { 0.0 };
        match field {
            ReadingField::Ph => self.reading.ph = value,
            ReadingField::Moisture => self.reading.moisture = value,
            ReadingField::Temperature => self.reading.temperature = value,
        }
        self.advisory = None;
        self.saved = false;
        Ok(())
    }

    pub fn select_farm(&mut self, farm_id: &str) -> Result<()> {
        if self.is_read_only() {
            return Err(ClientError::ReadOnly);
        }
        self.selected_farm = Some(farm_id.to_string());
        Ok(())
    }

    pub(crate) fn set_advisory(&mut self, advisory: AdvisoryResult) {
        self.advisory = Some(advisory);
        self.saved = false;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Everything a save needs, or the reason it cannot happen yet.
    pub(crate) fn save_request(&self) -> Result<(SensorReading, AdvisoryResult, String)> {
        if self.is_read_only() || self.saved {
            return Err(ClientError::ReadOnly);
        }
        let advisory = self.advisory.clone().ok_or(ValidationError::NoAdvisory)?;
        let farm_id = self
            .selected_farm
            .clone()
            .ok_or(ValidationError::NoFarmSelected)?;
        Ok((self.reading, advisory, farm_id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    screen: Screen,
    analysis: Option<AnalysisSession>,
}

impl Session {
    /// Onboarding comes first until a farmer profile exists.
    pub fn start(has_farmer: bool) -> Self {
        Self {
            screen: if has_farmer {
                Screen::Home
            } else {
                Screen::ProfileSetup
            },
            analysis: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn analysis(&self) -> Option<&AnalysisSession> {
        self.analysis.as_ref()
    }

    pub fn analysis_mut(&mut self) -> Result<&mut AnalysisSession> {
        self.analysis.as_mut().ok_or(ClientError::NoAnalysis)
    }

    /// Switch screens. `source` only matters for [`Screen::Analysis`]; with
    /// none, the last live reading is used, then the manual defaults.
    pub fn navigate(
        &mut self,
        screen: Screen,
        source: Option<AnalysisSource>,
        live: Option<SensorReading>,
        farms: &[FarmProfile],
    ) {
        self.analysis = match (screen, source) {
            (Screen::Analysis, Some(AnalysisSource::Replay(entry))) => {
                Some(AnalysisSession::replay(entry))
            }
            (Screen::Analysis, Some(AnalysisSource::Live(reading))) => {
                Some(AnalysisSession::live(reading, farms))
            }
            (Screen::Analysis, None) => Some(AnalysisSession::live(
                live.unwrap_or_else(SensorReading::manual_default),
                farms,
            )),
            (_, source) => {
                if source.is_some() {
                    debug!(%screen, "ignoring analysis payload for non-analysis screen");
                }
                None
            }
        };
        debug!(from = %self.screen, to = %screen, "navigate");
        self.screen = screen;
    }

    pub fn back(&mut self) {
        self.analysis = None;
        self.screen = Screen::Home;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matti_shared::{LandSize, SoilHealth};

    fn reading(ph: f64) -> SensorReading {
        SensorReading {
            device_timestamp: 10.0,
            ph,
            moisture: 40.0,
            temperature: 25.0,
            battery: 88.0,
        }
    }

    fn entry() -> HistoryEntry {
        HistoryEntry {
            id: "entry-1".into(),
            farm_id: "farm-9".into(),
            saved_at: 0,
            location: None,
            reading: reading(5.0),
            advisory: AdvisoryResult {
                soil_health: SoilHealth::Poor,
                crop_suggestions: "Millet".into(),
                fertilizer_advice: "Lime".into(),
                irrigation_suggestion: "Light".into(),
            },
        }
    }

    #[test]
    fn initial_screen_depends_on_farmer() {
        assert_eq!(Session::start(false).screen(), Screen::ProfileSetup);
        assert_eq!(Session::start(true).screen(), Screen::Home);
    }

    #[test]
    fn live_payload_passes_through_and_selects_first_farm() {
        let farms = vec![
            FarmProfile::new("A", LandSize::acres(1.0)),
            FarmProfile::new("B", LandSize::acres(1.0)),
        ];
        let mut s = Session::start(true);
        s.navigate(
            Screen::Analysis,
            Some(AnalysisSource::Live(reading(6.1))),
            Some(reading(9.9)),
            &farms,
        );

        let a = s.analysis().unwrap();
        assert_eq!(a.reading().ph, 6.1);
        assert_eq!(a.selected_farm(), Some(farms[0].id.as_str()));
        assert!(!a.is_read_only());
        assert!(!a.can_save());
    }

    #[test]
    fn replay_is_read_only_and_prefilled() {
        let mut s = Session::start(true);
        s.navigate(Screen::Analysis, Some(AnalysisSource::Replay(entry())), None, &[]);

        let a = s.analysis_mut().unwrap();
        assert!(a.is_read_only());
        assert!(a.is_saved());
        assert!(!a.can_save());
        assert_eq!(a.reading().ph, 5.0);
        assert_eq!(a.selected_farm(), Some("farm-9"));
        assert_eq!(a.advisory().unwrap().crop_suggestions, "Millet");
        assert!(matches!(a.edit_reading(ReadingField::Ph, 7.0), Err(ClientError::ReadOnly)));
        assert!(matches!(a.save_request(), Err(ClientError::ReadOnly)));
    }

    #[test]
    fn no_payload_falls_back_to_live_then_defaults() {
        let mut s = Session::start(true);
        s.navigate(Screen::Analysis, None, Some(reading(6.6)), &[]);
        assert_eq!(s.analysis().unwrap().reading().ph, 6.6);

        s.navigate(Screen::Analysis, None, None, &[]);
        assert_eq!(
            *s.analysis().unwrap().reading(),
            SensorReading::manual_default()
        );
    }

    #[test]
    fn edits_invalidate_advisory() {
        let mut s = Session::start(true);
        s.navigate(Screen::Analysis, None, None, &[]);
        let a = s.analysis_mut().unwrap();
        a.set_advisory(entry().advisory);
        assert!(a.advisory().is_some());

        a.edit_reading(ReadingField::Moisture, 12.0).unwrap();
        assert_eq!(a.reading().moisture, 12.0);
        assert!(a.advisory().is_none());
    }

    #[test]
    fn save_request_reports_missing_pieces() {
        let mut s = Session::start(true);
        s.navigate(Screen::Analysis, None, None, &[]);
        let a = s.analysis_mut().unwrap();

        assert!(matches!(
            a.save_request(),
            Err(ClientError::Validation(ValidationError::NoAdvisory))
        ));
        a.set_advisory(entry().advisory);
        assert!(matches!(
            a.save_request(),
            Err(ClientError::Validation(ValidationError::NoFarmSelected))
        ));
        a.select_farm("farm-1").unwrap();
        let (_, _, farm) = a.save_request().unwrap();
        assert_eq!(farm, "farm-1");

        a.mark_saved();
        assert!(!a.can_save());
    }

    #[test]
    fn leaving_analysis_and_back_go_home() {
        let mut s = Session::start(true);
        s.navigate(Screen::Analysis, None, None, &[]);
        s.navigate(Screen::History, None, None, &[]);
        assert!(s.analysis().is_none());

        s.navigate(Screen::Weather, None, None, &[]);
        assert!(s.screen().is_placeholder());
        s.back();
        assert_eq!(s.screen(), Screen::Home);
    }

    #[test]
    fn screen_names_round_trip() {
        assert_eq!("profileSetup".parse::<Screen>().unwrap(), Screen::ProfileSetup);
        assert_eq!(Screen::ProfileSetup.to_string(), "profileSetup");
        assert!("nowhere".parse::<Screen>().is_err());
    }
}
