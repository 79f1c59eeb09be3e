use thiserror::Error;

use matti_advisory::AdvisoryError;
use matti_link::LinkError;
use matti_shared::ValidationError;
use matti_store::StoreError;

use crate::state::Action;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Sensor connection failed: {0}")]
    Connection(#[from] LinkError),

    #[error("Failed to get AI analysis: {0}")]
    Advisory(#[from] AdvisoryError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} is already in progress")]
    Busy(Action),

    #[error("Not on the analysis screen")]
    NoAnalysis,

    #[error("This test is already saved and cannot be changed")]
    ReadOnly,

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;
