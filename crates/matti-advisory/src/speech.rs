//! Speech clips and the text they are made from.

use std::time::Duration;

use matti_shared::constants::{SPEECH_BITS_PER_SAMPLE, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use matti_shared::i18n::strings;
use matti_shared::{AdvisoryResult, Language};

/// Prebuilt voice used for each report language.
pub fn voice_for(language: Language) -> &'static str {
    match language {
        Language::En => "Kore",
        Language::Te => "Puck",
    }
}

/// The sentence sequence read aloud for a report.
pub fn speech_script(result: &AdvisoryResult, language: Language) -> String {
    let t = strings(language);
    format!(
        "{}: {}. {}: {}. {}: {}. {}: {}.",
        t.analysis_soil_health,
        t.health_label(result.soil_health),
        t.analysis_crop_suggestions,
        result.crop_suggestions,
        t.analysis_fertilizer_advice,
        result.fertilizer_advice,
        t.analysis_irrigation_suggestion,
        result.irrigation_suggestion,
    )
}

/// Synthesized audio: 16-bit little-endian PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechClip {
    pcm: Vec<u8>,
    sample_rate: u32,
    channels: u16,
}

impl SpeechClip {
    /// Wrap PCM in the format the speech model produces.
    pub fn from_model_pcm(pcm: Vec<u8>) -> Self {
        Self {
            pcm,
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: SPEECH_CHANNELS,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u16 {
        self.channels.max(1)
    }

    /// Bytes per frame, never zero.
    fn block_align(&self) -> u16 {
        self.channel_count() * (SPEECH_BITS_PER_SAMPLE / 8)
    }

    pub fn frame_count(&self) -> usize {
        self.pcm.len() / self.block_align() as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// The clip as a RIFF/WAVE file.
    pub fn to_wav(&self) -> Vec<u8> {
        let data_len = (self.frame_count() * self.block_align() as usize) as u32;
        let byte_rate = self.sample_rate * self.block_align() as u32;

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&self.channel_count().to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&self.block_align().to_le_bytes());
        out.extend_from_slice(&SPEECH_BITS_PER_SAMPLE.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&self.pcm[..data_len as usize]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matti_shared::SoilHealth;

    fn result() -> AdvisoryResult {
        AdvisoryResult {
            soil_health: SoilHealth::NeedsImprovement,
            crop_suggestions: "Millet".into(),
            fertilizer_advice: "Compost".into(),
            irrigation_suggestion: "Weekly".into(),
        }
    }

    #[test]
    fn script_reads_every_section() {
        assert_eq!(
            speech_script(&result(), Language::En),
            "Soil Health: Needs Improvement. Crop Suggestions: Millet. \
             Fertilizer Advice: Compost. Irrigation Suggestion: Weekly."
        );
        assert!(speech_script(&result(), Language::Te).starts_with("మట్టి పరిస్థితి: మెరుగుదల అవసరం."));
    }

    #[test]
    fn voices_per_language() {
        assert_eq!(voice_for(Language::En), "Kore");
        assert_eq!(voice_for(Language::Te), "Puck");
    }

    #[test]
    fn one_second_of_audio() {
        let clip = SpeechClip::from_model_pcm(vec![0u8; 48_000]);
        assert_eq!(clip.frame_count(), 24_000);
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn zero_channels_counts_as_mono() {
        let clip = SpeechClip {
            pcm: vec![0u8; 8],
            sample_rate: 24_000,
            channels: 0,
        };
        assert_eq!(clip.frame_count(), 4);
        let wav = clip.to_wav();
        assert_eq!(wav.len(), 52);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
    }

    #[test]
    fn wav_header_describes_pcm() {
        let clip = SpeechClip::from_model_pcm(vec![1, 0, 2, 0, 9]);
        let wav = clip.to_wav();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24_000);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(wav.len(), 48);
    }
}
