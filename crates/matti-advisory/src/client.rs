use std::sync::Arc;

use tracing::{error, info, warn};

use matti_shared::{classify, AdvisoryResult, FarmProfile, Language, SensorReading};

use crate::error::AdvisoryError;
use crate::model::AdvisoryModel;
use crate::prompt::compose_prompt;
use crate::sections::split_sections;
use crate::speech::{voice_for, SpeechClip};

/// Front door to the remote model.
#[derive(Clone)]
pub struct AdvisoryClient {
    model: Arc<dyn AdvisoryModel>,
}

impl AdvisoryClient {
    pub fn new(model: Arc<dyn AdvisoryModel>) -> Self {
        Self { model }
    }

    /// Classify locally, then ask the model for the three report sections.
    pub async fn request_advisory(
        &self,
        reading: &SensorReading,
        language: Language,
        farm: Option<&FarmProfile>,
    ) -> Result<AdvisoryResult, AdvisoryError> {
        let soil_health = classify(reading);
        let prompt = compose_prompt(reading, soil_health, language, farm);

        let text = self.model.generate_text(&prompt).await.map_err(|e| {
            error!(error = %e, "error getting advisory");
            e
        })?;

        let sections = split_sections(&text, language);
        info!(%soil_health, %language, "advisory received");

        Ok(AdvisoryResult {
            soil_health,
            crop_suggestions: sections.crop_suggestions,
            fertilizer_advice: sections.fertilizer_advice,
            irrigation_suggestion: sections.irrigation_suggestion,
        })
    }

    /// Synthesize `text`. Any failure yields `None` so playback is skipped.
    pub async fn request_speech(&self, text: &str, language: Language) -> Option<SpeechClip> {
        match self.model.synthesize_speech(text, voice_for(language)).await {
            Ok(pcm) if !pcm.is_empty() => Some(SpeechClip::from_model_pcm(pcm)),
            Ok(_) => {
                warn!("speech service returned an empty clip");
                None
            }
            Err(e) => {
                warn!(error = %e, "error generating speech");
                None
            }
        }
    }
}
