use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("not found")]
    NotFound,

    #[error("invalid input")]
    Invalid,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("region {0} is already resolved")]
    RegionAlreadyResolved(Uuid),

    #[error("region {0} is not awaiting user input")]
    RegionNotAwaitingUser(Uuid),

    #[error("backend {backend} failed: {reason}")]
    BackendFailure { backend: String, reason: String },

    #[error("correction rejected: {0}")]
    CorrectionRejected(String),

    #[error("training failed: {0}")]
    TrainingFailed(String),

    #[error("external service error: {0}")]
    ExternalServiceError(String),

    #[error("internal server error")]
    InternalServerError,
}
