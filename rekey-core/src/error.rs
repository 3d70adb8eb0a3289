//! Error types for the rekey recovery protocol

/// Result type for recovery operations
pub type RecoveryResult<T> = std::result::Result<T, RecoveryError>;

/// Recovery protocol error types
#[derive(thiserror::Error, Debug)]
pub enum RecoveryError {
    #[error("Recovery service endpoint is not configured")]
    MissingRecoveryEndpoint,

    #[error("Tenant endpoint is not configured: {0}")]
    MissingTenantEndpoint(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Delegated signing failed: {0}")]
    DelegationFailed(String),

    #[error("Recovery service request failed with status {status}: {message}")]
    ServiceError { status: u16, message: String },

    #[error("Response parsing failed: {0}")]
    ResponseParsingFailed(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),
}

impl RecoveryError {
    /// Get error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecoveryError::MissingRecoveryEndpoint
            | RecoveryError::MissingTenantEndpoint(_)
            | RecoveryError::InvalidEndpoint(_)
            | RecoveryError::InvalidConfiguration(_) => ErrorKind::Configuration,
            RecoveryError::InvalidKeyMaterial(_)
            | RecoveryError::InvalidAddress(_)
            | RecoveryError::SigningFailed(_)
            | RecoveryError::DelegationFailed(_)
            | RecoveryError::UuidError(_) => ErrorKind::Signing,
            RecoveryError::ServiceError { .. }
            | RecoveryError::ResponseParsingFailed(_)
            | RecoveryError::HttpError(_) => ErrorKind::Transport,
        }
    }

    /// Check if the failure is worth retrying by the caller
    ///
    /// The session itself never retries; this only informs the caller's
    /// own retry policy.
    pub fn is_transient(&self) -> bool {
        match self {
            RecoveryError::HttpError(_) => true,
            RecoveryError::ServiceError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Recovery error kinds for handling
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Signing,
    Transport,
    Configuration,
}
