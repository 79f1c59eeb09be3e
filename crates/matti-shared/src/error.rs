use thiserror::Error;

/// Input rejected before it reaches state or the network.
///
/// These are surfaced inline to the user and block the submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your name.")]
    MissingFarmerName,

    #[error("Farm name is required.")]
    MissingFarmName,

    #[error("Please enter a valid farm size.")]
    InvalidFarmSize,

    #[error("Select a farm for this test.")]
    NoFarmSelected,

    #[error("Run the analysis before saving.")]
    NoAdvisory,

    #[error("Farm deletion must be confirmed.")]
    DeleteNotConfirmed,

    #[error("Unknown language code: {0}")]
    UnknownLanguage(String),

    #[error("Unknown reading field: {0}")]
    UnknownField(String),
}
