//! Localized strings.
//!
//! Only the strings that carry meaning outside presentation live here: the
//! advisory section headings (the model is asked to echo them and the report
//! is split on them), health labels, and the labels used by history listings.

use crate::types::{Language, SoilHealth};

#[derive(Debug)]
pub struct Strings {
    pub app_name: &'static str,
    pub ble_disconnected: &'static str,
    pub ble_connecting: &'static str,
    pub ble_connected: &'static str,
    pub ble_error: &'static str,
    pub ble_no_support: &'static str,
    pub analysis_soil_health: &'static str,
    pub analysis_crop_suggestions: &'static str,
    pub analysis_fertilizer_advice: &'static str,
    pub analysis_irrigation_suggestion: &'static str,
    pub analysis_select_farm: &'static str,
    pub analysis_add_farm_prompt: &'static str,
    pub health_healthy: &'static str,
    pub health_needs_improvement: &'static str,
    pub health_poor: &'static str,
    pub history_no_tests: &'static str,
    pub history_farm_name: &'static str,
    pub unknown_farm: &'static str,
}

static EN: Strings = Strings {
    app_name: "Smart Soil Tester",
    ble_disconnected: "Disconnected",
    ble_connecting: "Connecting...",
    ble_connected: "Connected",
    ble_error: "Connection Error",
    ble_no_support: "Bluetooth is not supported on this device.",
    analysis_soil_health: "Soil Health",
    analysis_crop_suggestions: "Crop Suggestions",
    analysis_fertilizer_advice: "Fertilizer Advice",
    analysis_irrigation_suggestion: "Irrigation Suggestion",
    analysis_select_farm: "Select Farm for this Test",
    analysis_add_farm_prompt: "You need to add a farm profile before saving.",
    health_healthy: "Healthy",
    health_needs_improvement: "Needs Improvement",
    health_poor: "Poor",
    history_no_tests: "No saved tests yet.",
    history_farm_name: "Farm:",
    unknown_farm: "Unknown Farm",
};

static TE: Strings = Strings {
    app_name: "స్మార్ట్ సాయిల్ టెస్టర్",
    ble_disconnected: "డిస్‌కనెక్ట్ చేయబడింది",
    ble_connecting: "కనెక్ట్ చేస్తోంది...",
    ble_connected: "కనెక్ట్ చేయబడింది",
    ble_error: "కనెక్షన్ లోపం",
    ble_no_support: "ఈ పరికరంలో బ్లూటూత్ మద్దతు లేదు.",
    analysis_soil_health: "మట్టి పరిస్థితి",
    analysis_crop_suggestions: "పంట సూచనలు",
    analysis_fertilizer_advice: "ఎరువుల సలహా",
    analysis_irrigation_suggestion: "నీటిపారుదల సూచన",
    analysis_select_farm: "ఈ పరీక్ష కోసం పొలాన్ని ఎంచుకోండి",
    analysis_add_farm_prompt: "సేవ్ చేయడానికి ముందు మీరు ఫార్మ్ ప్రొఫైల్‌ను జోడించాలి.",
    health_healthy: "ఆరోగ్యకరమైనది",
    health_needs_improvement: "మెరుగుదల అవసరం",
    health_poor: "పేలవమైనది",
    history_no_tests: "ఇంకా పరీక్షలు సేవ్ చేయబడలేదు.",
    history_farm_name: "పొలం:",
    unknown_farm: "Unknown Farm",
};

pub fn strings(language: Language) -> &'static Strings {
    match language {
        Language::En => &EN,
        Language::Te => &TE,
    }
}

impl Strings {
    pub fn health_label(&self, health: SoilHealth) -> &'static str {
        match health {
            SoilHealth::Healthy => self.health_healthy,
            SoilHealth::NeedsImprovement => self.health_needs_improvement,
            SoilHealth::Poor => self.health_poor,
        }
    }

    /// Section headings in the order they appear in the report.
    pub fn section_headings(&self) -> [&'static str; 3] {
        [
            self.analysis_crop_suggestions,
            self.analysis_fertilizer_advice,
            self.analysis_irrigation_suggestion,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_are_distinct_per_language() {
        for lang in [Language::En, Language::Te] {
            let [a, b, c] = strings(lang).section_headings();
            assert!(a != b && b != c && a != c);
        }
    }

    #[test]
    fn health_labels_are_localized() {
        assert_eq!(strings(Language::En).health_label(SoilHealth::Poor), "Poor");
        assert_eq!(
            strings(Language::Te).health_label(SoilHealth::Healthy),
            "ఆరోగ్యకరమైనది"
        );
    }
}
