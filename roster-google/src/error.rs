//! Error types for roster-google.

use std::path::PathBuf;

use thiserror::Error;

use roster_core::DelegationError;

/// Base credential bootstrap failures. Fatal for the run.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The key file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file is not a service-account JSON key.
    #[error("invalid service account key{}: {source}", location_suffix(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported key type '{0}'; expected 'service_account'")]
    KeyType(String),

    /// `private_key` is not a usable RSA PEM.
    #[error("invalid private key: {0}")]
    PrivateKey(#[source] jsonwebtoken::errors::Error),

    /// The administrator could not be delegated for directory access.
    #[error("admin delegation failed: {0}")]
    AdminDelegation(#[from] DelegationError),
}

fn location_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CredentialError {
    CredentialError::Io {
        path: path.into(),
        source,
    }
}
