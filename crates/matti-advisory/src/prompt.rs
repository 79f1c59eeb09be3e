//! Prompt composition for the advisory report.

use std::fmt::Write as _;

use matti_shared::i18n::strings;
use matti_shared::{FarmProfile, Language, SensorReading, SoilHealth};

const NOT_SPECIFIED: &str = "Not specified";

/// Build the prompt sent to the text model.
///
/// The model is asked to use the localized section headings verbatim so
/// that [`crate::sections::split_sections`] can find them again.
pub fn compose_prompt(
    reading: &SensorReading,
    soil_health: SoilHealth,
    language: Language,
    farm: Option<&FarmProfile>,
) -> String {
    let target = language.english_name();
    let [crop, fertilizer, irrigation] = strings(language).section_headings();

    let mut prompt = String::new();
    let _ = writeln!(prompt, "You are an expert agricultural assistant for farmers.");
    let _ = writeln!(
        prompt,
        "Analyze the following soil data and write a short, actionable report in {target}."
    );
    let _ = writeln!(prompt, "The report must be easy for a farmer to understand.");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Soil Data:");
    let _ = writeln!(prompt, "- pH Level: {:.1}", reading.ph);
    let _ = writeln!(prompt, "- Moisture: {:.1}%", reading.moisture);
    let _ = writeln!(prompt, "- Temperature: {:.1}°C", reading.temperature);
    let _ = writeln!(prompt, "- Current Soil Health Category: {soil_health}");

    if let Some(farm) = farm {
        let soil_type = farm
            .soil_type
            .map(|s| s.to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());
        let crop_now = farm
            .current_crop
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(NOT_SPECIFIED);
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "Farm Context:");
        let _ = writeln!(prompt, "- Soil Type: {soil_type}");
        let _ = writeln!(prompt, "- Currently Grown Crop: {crop_now}");
    }

    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Write exactly three sections, using these headings exactly as written, in this order:"
    );
    let _ = writeln!(
        prompt,
        "1. **{crop}**: suggest 3-4 crops suited to these conditions and the farm context. \
         If the soil is 'Poor' or 'Needs Improvement', prefer resilient crops."
    );
    let _ = writeln!(
        prompt,
        "2. **{fertilizer}**: simple fertilizer advice, such as balanced NPK, compost or \
         amendments based on pH and soil type."
    );
    let _ = writeln!(
        prompt,
        "3. **{irrigation}**: when and how much to water given moisture, temperature and \
         the current crop."
    );
    let _ = writeln!(prompt);
    let _ = write!(
        prompt,
        "Keep the language simple and direct. Do not add any introduction or conclusion \
         outside these sections."
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use matti_shared::{LandSize, SoilType};

    fn reading() -> SensorReading {
        SensorReading {
            device_timestamp: 1.0,
            ph: 6.54,
            moisture: 45.0,
            temperature: 24.26,
            battery: 90.0,
        }
    }

    #[test]
    fn embeds_reading_category_and_headings() {
        let prompt = compose_prompt(&reading(), SoilHealth::Healthy, Language::En, None);
        assert!(prompt.contains("- pH Level: 6.5"));
        assert!(prompt.contains("- Moisture: 45.0%"));
        assert!(prompt.contains("- Temperature: 24.3°C"));
        assert!(prompt.contains("Category: Healthy"));
        assert!(prompt.contains("report in English"));
        assert!(prompt.contains("**Crop Suggestions**"));
        assert!(prompt.contains("**Irrigation Suggestion**"));
        assert!(!prompt.contains("Farm Context"));
    }

    #[test]
    fn telugu_prompt_uses_telugu_headings() {
        let prompt = compose_prompt(&reading(), SoilHealth::Poor, Language::Te, None);
        assert!(prompt.contains("report in Telugu"));
        assert!(prompt.contains("**పంట సూచనలు**"));
        assert!(prompt.contains("Category: Poor"));
    }

    #[test]
    fn farm_context_defaults_missing_fields() {
        let mut farm = FarmProfile::new("East plot", LandSize::acres(3.0));
        farm.soil_type = Some(SoilType::Black);

        let prompt =
            compose_prompt(&reading(), SoilHealth::NeedsImprovement, Language::En, Some(&farm));
        assert!(prompt.contains("- Soil Type: Black"));
        assert!(prompt.contains("- Currently Grown Crop: Not specified"));
        assert!(prompt.contains("Category: Needs Improvement"));
    }
}
