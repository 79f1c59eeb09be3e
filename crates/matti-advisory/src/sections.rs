//! Splitting the model's free text into report sections.

use matti_shared::constants::UNDETERMINED_SECTION;
use matti_shared::i18n::strings;
use matti_shared::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSections {
    pub crop_suggestions: String,
    pub fertilizer_advice: String,
    pub irrigation_suggestion: String,
}

/// Locate the three localized headings and take the text after each one.
///
/// A section ends where the next heading (of any kind) begins.  Sections
/// that are missing or empty become [`UNDETERMINED_SECTION`].
pub fn split_sections(text: &str, language: Language) -> ReportSections {
    let headings = strings(language).section_headings();
    let [crop, fertilizer, irrigation] = headings;

    ReportSections {
        crop_suggestions: section(text, crop, &headings),
        fertilizer_advice: section(text, fertilizer, &headings),
        irrigation_suggestion: section(text, irrigation, &headings),
    }
}

fn section(text: &str, heading: &str, headings: &[&str]) -> String {
    let Some(start) = text.find(heading) else {
        return UNDETERMINED_SECTION.to_string();
    };
    let rest = &text[start + heading.len()..];
    let end = headings
        .iter()
        .filter_map(|h| rest.find(h))
        .min()
        .unwrap_or(rest.len());

    let body = clean(&rest[..end]);
    if body.is_empty() {
        UNDETERMINED_SECTION.to_string()
    } else {
        body
    }
}

fn is_decoration(c: char) -> bool {
    c.is_whitespace() || matches!(c, '*' | '#' | ':')
}

/// Strip markdown around a section body, including the list number that
/// belongs to the following heading ("...\n\n2. **").
fn clean(raw: &str) -> String {
    let mut body = raw.trim_matches(is_decoration);
    if let Some((head, last)) = body.rsplit_once('\n') {
        if is_ordinal(last.trim()) {
            body = head.trim_matches(is_decoration);
        }
    } else if is_ordinal(body) {
        body = "";
    }
    body.to_string()
}

fn is_ordinal(s: &str) -> bool {
    let digits = s.trim_end_matches(|c| c == '.' || c == ')');
    !digits.is_empty() && digits.len() < s.len() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "1.  **Crop Suggestions**: Groundnut, millet and cotton.\n\n\
                          2.  **Fertilizer Advice**: Apply compost before sowing.\n\n\
                          3.  **Irrigation Suggestion**: Water twice a week in the morning.";

    #[test]
    fn splits_well_formed_report() {
        let s = split_sections(REPORT, Language::En);
        assert_eq!(s.crop_suggestions, "Groundnut, millet and cotton.");
        assert_eq!(s.fertilizer_advice, "Apply compost before sowing.");
        assert_eq!(s.irrigation_suggestion, "Water twice a week in the morning.");
    }

    #[test]
    fn missing_section_gets_placeholder() {
        let text = "**Crop Suggestions**\nRice.\n**Irrigation Suggestion**\nDaily.";
        let s = split_sections(text, Language::En);
        assert_eq!(s.crop_suggestions, "Rice.");
        assert_eq!(s.fertilizer_advice, UNDETERMINED_SECTION);
        assert_eq!(s.irrigation_suggestion, "Daily.");
    }

    #[test]
    fn empty_section_gets_placeholder() {
        let text = "Crop Suggestions:\n\nFertilizer Advice: Urea.\nIrrigation Suggestion: **";
        let s = split_sections(text, Language::En);
        assert_eq!(s.crop_suggestions, UNDETERMINED_SECTION);
        assert_eq!(s.fertilizer_advice, "Urea.");
        assert_eq!(s.irrigation_suggestion, UNDETERMINED_SECTION);
    }

    #[test]
    fn unrelated_text_yields_all_placeholders() {
        let s = split_sections("I cannot help with that.", Language::En);
        assert_eq!(s.crop_suggestions, UNDETERMINED_SECTION);
        assert_eq!(s.fertilizer_advice, UNDETERMINED_SECTION);
        assert_eq!(s.irrigation_suggestion, UNDETERMINED_SECTION);
    }

    #[test]
    fn telugu_headings() {
        let text = "**పంట సూచనలు**: వరి.\n**ఎరువుల సలహా**: కంపోస్ట్.\n**నీటిపారుదల సూచన**: వారానికి రెండుసార్లు.";
        let s = split_sections(text, Language::Te);
        assert_eq!(s.crop_suggestions, "వరి.");
        assert_eq!(s.fertilizer_advice, "కంపోస్ట్.");
        assert_eq!(s.irrigation_suggestion, "వారానికి రెండుసార్లు.");
    }

    #[test]
    fn english_headings_do_not_match_telugu_report() {
        let s = split_sections(REPORT, Language::Te);
        assert_eq!(s.crop_suggestions, UNDETERMINED_SECTION);
    }
}
