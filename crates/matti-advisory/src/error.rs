use thiserror::Error;

/// The remote completion call failed; nothing from it may be saved.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("No API key configured for the advisory service")]
    MissingApiKey,

    #[error("Advisory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Advisory service responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Advisory service returned no text")]
    EmptyResponse,
}

/// Speech synthesis failed. Callers degrade to "no audio".
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("No API key configured for the speech service")]
    MissingApiKey,

    #[error("Speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech service responded {status}")]
    Status { status: u16 },

    #[error("Speech service returned no audio")]
    NoAudio,

    #[error("Invalid audio encoding: {0}")]
    Decode(#[from] base64::DecodeError),
}
