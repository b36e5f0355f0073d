//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CivicError {
    /// Malformed or missing submission fields. User-correctable.
    #[error("VALIDATION/{0}")]
    Validation(String),

    /// Missing or invalid credential.
    #[error("AUTHN/{0}")]
    Authentication(String),

    /// Valid credential, wrong region or role.
    #[error("AUTHZ/{0}")]
    Authorization(String),

    #[error("NOT_FOUND/{0}")]
    NotFound(String),

    /// A value outside a closed enumeration, or a transition the lifecycle forbids.
    #[error("STATE/{0}")]
    InvalidState(String),

    /// A unique index would be violated.
    #[error("CONFLICT/{0}")]
    Conflict(String),

    /// External classifier failure or timeout. Recorded as FAILED, never fatal.
    #[error("CLASSIFIER/{0}")]
    Classifier(String),

    #[error("STORE/{0}")]
    Persistence(String),
}

impl CivicError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// The human-readable detail without the category prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::Authentication(m)
            | Self::Authorization(m)
            | Self::NotFound(m)
            | Self::InvalidState(m)
            | Self::Conflict(m)
            | Self::Classifier(m)
            | Self::Persistence(m) => m,
        }
    }
}

pub type CivicResult<T> = Result<T, CivicError>;
