use crate::CourseId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("payment required for course {0}")]
    PaymentRequired(CourseId),
    #[error("invalid progress: {0} (expected 0..=100)")]
    InvalidProgress(i64),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),
}

impl CoreError {
    /// Stable name surfaced to callers in `{success: false, error}` envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NotFound",
            CoreError::PaymentRequired(_) => "PaymentRequired",
            CoreError::InvalidProgress(_) => "InvalidProgress",
            CoreError::ProviderUnavailable(_) => "ProviderUnavailable",
            CoreError::Invalid(_) => "Invalid",
            CoreError::Conflict(_) => "Conflict",
            CoreError::Storage(_) => "Storage",
        }
    }

    pub fn unavailable(reason: impl ToString) -> Self {
        CoreError::ProviderUnavailable(reason.to_string())
    }
}
