use futures::future::BoxFuture;

use crate::error::{AdvisoryError, SpeechError};

/// A remote text and speech model.
pub trait AdvisoryModel: Send + Sync {
    /// Free-text completion for `prompt`.
    fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AdvisoryError>>;

    /// Raw 16-bit little-endian PCM (mono, 24 kHz) for `text` spoken by `voice`.
    fn synthesize_speech<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, SpeechError>>;
}
