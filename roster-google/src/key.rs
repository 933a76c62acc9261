//! Service-account JSON key material.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{io_err, CredentialError};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a downloaded service-account key that delegation needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let key: Self =
            serde_json::from_str(&contents).map_err(|source| CredentialError::Parse {
                path: Some(path.to_path_buf()),
                source,
            })?;
        key.validated()
    }

    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let key: Self = serde_json::from_str(json)
            .map_err(|source| CredentialError::Parse { path: None, source })?;
        key.validated()
    }

    fn validated(self) -> Result<Self, CredentialError> {
        match self.key_type.as_deref() {
            None | Some("service_account") => Ok(self),
            Some(other) => Err(CredentialError::KeyType(other.to_string())),
        }
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
