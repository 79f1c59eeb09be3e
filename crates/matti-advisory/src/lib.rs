//! # matti-advisory
//!
//! Turns a soil reading into a farmer-readable report.
//!
//! The soil-health category is computed locally (see
//! [`matti_shared::health`]); the remote model only writes the prose of the
//! three report sections and, optionally, reads the report aloud.

pub mod client;
pub mod gemini;
pub mod model;
pub mod prompt;
pub mod sections;
pub mod speech;

mod error;

pub use client::AdvisoryClient;
pub use error::{AdvisoryError, SpeechError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use model::AdvisoryModel;
pub use speech::{speech_script, voice_for, SpeechClip};
