//! Gemini REST backend.
//!
//! Text: `POST {base}/models/{model}:generateContent` with a single user
//! part.  Speech: the same call against the TTS model with
//! `responseModalities: ["AUDIO"]` and a prebuilt voice; the audio comes back
//! base64-encoded in `inlineData`.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use matti_shared::constants::{DEFAULT_API_BASE, DEFAULT_SPEECH_MODEL, DEFAULT_TEXT_MODEL};

use crate::error::{AdvisoryError, SpeechError};
use crate::model::AdvisoryModel;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub text_model: String,
    pub speech_model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        )
    }

    async fn text(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AdvisoryError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let resp = self
            .http
            .post(self.endpoint(&self.config.text_model))
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "advisory request rejected");
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed.text().ok_or(AdvisoryError::EmptyResponse)?;
        debug!(chars = text.len(), "advisory text received");
        Ok(text)
    }

    async fn speech(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(SpeechError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice }
                    }
                }
            }
        });

        let resp = self
            .http
            .post(self.endpoint(&self.config.speech_model))
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SpeechError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let encoded = parsed.audio().ok_or(SpeechError::NoAudio)?;
        Ok(STANDARD.decode(encoded)?)
    }
}

impl AdvisoryModel for GeminiClient {
    fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AdvisoryError>> {
        self.text(prompt).boxed()
    }

    fn synthesize_speech<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, SpeechError>> {
        self.speech(text, voice).boxed()
    }
}

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    /// All text parts of the first candidate, concatenated.
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn audio(&self) -> Option<&str> {
        self.parts()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.as_str())
            .filter(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_concatenated_text() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Crop "},{"text":"Suggestions"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("Crop Suggestions"));
    }

    #[test]
    fn blank_or_missing_text_is_none() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(resp.text().is_none());

        let resp: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(resp.text().is_none());

        let resp: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(resp.text().is_none());
    }

    #[test]
    fn extracts_inline_audio() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;rate=24000","data":"AAEC"}}]}}]}"#,
        )
        .unwrap();
        let audio = resp.audio().unwrap();
        assert_eq!(STANDARD.decode(audio).unwrap(), vec![0u8, 1, 2]);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = GeminiClient::new(GeminiConfig {
            api_base: "http://localhost:9/v1beta/".into(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(matches!(
            client.generate_text("hi").await,
            Err(AdvisoryError::MissingApiKey)
        ));
        assert!(matches!(
            client.synthesize_speech("hi", "Kore").await,
            Err(SpeechError::MissingApiKey)
        ));
    }
}
