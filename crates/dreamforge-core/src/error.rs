//! Error types for the DreamForge system.

use std::fmt;

use thiserror::Error;

/// External collaborator that produced an [`DreamforgeError::ExternalService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalService {
    Auth,
    Generation,
    Storage,
    Payment,
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExternalService::Auth => "auth",
            ExternalService::Generation => "generation",
            ExternalService::Storage => "storage",
            ExternalService::Payment => "payment",
        };
        f.write_str(name)
    }
}

/// Coarse classification used by callers to decide between
/// "fix your input", "retry later" and "this is a bug".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Recoverable at the call site (bad input, not enough credits, plan too low).
    Local,
    /// A collaborator failed; the caller may retry.
    External,
    /// A programming invariant was violated.
    Invariant,
}

#[derive(Debug, Error)]
pub enum DreamforgeError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("Feature not available: {feature} ({reason})")]
    FeatureDenied { feature: String, reason: String },

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("{service} service failed{}: {message}", status_suffix(.status))]
    ExternalService {
        service: ExternalService,
        status: Option<u16>,
        message: String,
    },

    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DreamforgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        DreamforgeError::Validation {
            message: message.into(),
        }
    }

    pub fn external(
        service: ExternalService,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        DreamforgeError::ExternalService {
            service,
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DreamforgeError::Validation { .. }
            | DreamforgeError::InsufficientCredits { .. }
            | DreamforgeError::FeatureDenied { .. }
            | DreamforgeError::AuthenticationRequired
            | DreamforgeError::NotFound { .. }
            | DreamforgeError::AlreadyExists { .. } => ErrorKind::Local,
            DreamforgeError::ExternalService { .. } => ErrorKind::External,
            DreamforgeError::InconsistentState(_) | DreamforgeError::Internal(_) => {
                ErrorKind::Invariant
            }
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

pub type DreamforgeResult<T> = Result<T, DreamforgeError>;
