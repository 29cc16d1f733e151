use thiserror::Error;

use crate::allocation::AllocationError;
use crate::inference::InferenceError;

/// How a failed portal operation should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing changed and nothing is broken, e.g. a duplicate submission
    Warning,
    Error,
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("This email is already registered. Please use a different email.")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Please log in to access the dashboard.")]
    NotLoggedIn,

    #[error("You are already parked.")]
    AlreadyParked,

    #[error("No parking details found.")]
    NoActiveSession,

    #[error("You have already submitted a report.")]
    ReportAlreadySubmitted,

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("Prediction failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Failed to hash password")]
    PasswordHash,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PortalError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PortalError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PortalError::DuplicateEmail
            | PortalError::AlreadyParked
            | PortalError::NoActiveSession
            | PortalError::ReportAlreadySubmitted
            | PortalError::NotLoggedIn => Severity::Warning,
            _ => Severity::Error,
        }
    }
}
