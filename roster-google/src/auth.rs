//! Domain-wide delegation: sign a JWT-bearer assertion for a subject with
//! the service-account key and exchange it for an access token.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use roster_core::{
    CredentialDelegator, DelegationError, EmailAddress, RetryPolicy, ScopedCredential,
    ServiceError, Sleeper, ThreadSleeper,
};

use crate::error::CredentialError;
use crate::http::{classify, read_json, HttpClient};
use crate::key::ServiceAccountKey;

pub const DIRECTORY_SCOPE: &str = "https://www.googleapis.com/auth/admin.directory.user.readonly";
pub const CONTACTS_SCOPE: &str = "https://www.googleapis.com/auth/contacts";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// OAuth error codes meaning "this subject may not be impersonated".
const DENIAL_CODES: [&str; 3] = ["unauthorized_client", "access_denied", "invalid_grant"];

/// Claims of the signed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// Owns the base credential and mints per-subject tokens for a fixed scope set.
pub struct ServiceAccountDelegator {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scopes: Vec<String>,
    http: HttpClient,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl ServiceAccountDelegator {
    pub fn new(
        key: ServiceAccountKey,
        scopes: &[&str],
        http: HttpClient,
    ) -> Result<Self, CredentialError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(CredentialError::PrivateKey)?;
        Ok(Self {
            key,
            encoding_key,
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            http,
            retry: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
        })
    }

    /// Retry policy for transient token-endpoint failures. Denials are never retried.
    pub fn with_retry(mut self, retry: RetryPolicy, sleeper: Box<dyn Sleeper>) -> Self {
        self.retry = retry;
        self.sleeper = sleeper;
        self
    }

    pub fn claims(&self, subject: &str, now: DateTime<Utc>) -> AssertionClaims {
        let iat = now.timestamp();
        AssertionClaims {
            iss: self.key.client_email.clone(),
            sub: subject.to_string(),
            scope: self.scopes.join(" "),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }

    /// RS256-signed assertion for `subject`.
    pub fn assertion(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        jsonwebtoken::encode(&header, &self.claims(subject, now), &self.encoding_key)
    }

    fn request_token(&self, assertion: &str) -> Result<TokenResponse, ServiceError> {
        let response = self
            .http
            .agent()
            .post(&self.key.token_uri)
            .send_form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
            .map_err(classify)?;
        read_json(response)
    }
}

impl CredentialDelegator for ServiceAccountDelegator {
    fn delegate(&self, subject: &str) -> Result<ScopedCredential, DelegationError> {
        let now = Utc::now();
        let assertion = self
            .assertion(subject, now)
            .map_err(|e| DelegationError::Service {
                subject: subject.to_string(),
                source: ServiceError::permanent(None, format!("failed to sign assertion: {e}")),
            })?;

        let (token, attempts) = self
            .retry
            .run(self.sleeper.as_ref(), || self.request_token(&assertion))
            .map_err(|failure| denial_or_service(subject, failure.error))?;
        tracing::debug!(subject, attempts, "delegated credential issued");

        Ok(ScopedCredential {
            subject: EmailAddress::from(subject),
            access_token: token.access_token,
            expires_at: now + ChronoDuration::seconds(token.expires_in),
        })
    }
}

fn denial_or_service(subject: &str, error: ServiceError) -> DelegationError {
    if let ServiceError::Permanent { status, message } = &error {
        let denied_status = matches!(status, Some(401 | 403));
        let denied_code = DENIAL_CODES.iter().any(|code| message.starts_with(code));
        if denied_status || denied_code {
            return DelegationError::Denied {
                subject: subject.to_string(),
                reason: message.clone(),
            };
        }
    }
    DelegationError::Service {
        subject: subject.to_string(),
        source: error,
    }
}
