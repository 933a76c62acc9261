//! Error types for roster-core.

use thiserror::Error;

/// A failed call against the directory or contacts service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Expected to resolve on retry (service unavailable, rate limited,
    /// connection reset, ...).
    #[error("transient service error{}: {message}", status_suffix(.status))]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// Not worth retrying (bad request, not found, malformed response).
    #[error("service error{}: {message}", status_suffix(.status))]
    Permanent {
        status: Option<u16>,
        message: String,
    },
}

impl ServiceError {
    pub fn transient(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transient {
            status,
            message: message.into(),
        }
    }

    pub fn permanent(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Permanent {
            status,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } | Self::Permanent { status, .. } => *status,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// The roster could not be fetched. Fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("directory unavailable for customer '{customer_id}' after {attempts} attempt(s): {source}")]
    Unavailable {
        customer_id: String,
        attempts: u32,
        #[source]
        source: ServiceError,
    },
}

/// A delegated credential could not be produced for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelegationError {
    /// The subject may not be impersonated. Configuration problem, never retried.
    #[error("delegation denied for {subject}: {reason}")]
    Denied { subject: String, reason: String },

    /// The token endpoint itself failed.
    #[error("token exchange failed for {subject}: {source}")]
    Service {
        subject: String,
        #[source]
        source: ServiceError,
    },
}

/// A contact payload failed validation before any call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("contact payload has an empty email address")]
    MissingEmail,

    #[error("contact payload email '{0}' is not an address")]
    InvalidEmail(String),
}
