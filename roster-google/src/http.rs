//! Shared HTTP plumbing: agent construction, error classification, paging.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use roster_core::ServiceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response body excerpt kept in error messages.
const MAX_ERROR_BODY: usize = 300;

/// A cloneable blocking HTTP agent. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    pub(crate) fn agent(&self) -> &ureq::Agent {
        &self.agent
    }
}

/// Statuses worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Map a non-success response to a [`ServiceError`], pulling the message out
/// of Google's JSON error envelopes when present.
pub fn status_error(status: u16, body: &str) -> ServiceError {
    let message = api_error_message(body).unwrap_or_else(|| excerpt(body));
    if is_transient_status(status) {
        ServiceError::transient(Some(status), message)
    } else {
        ServiceError::permanent(Some(status), message)
    }
}

/// Map any `ureq` failure to a [`ServiceError`].
pub(crate) fn classify(err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            status_error(status, &body)
        }
        ureq::Error::Transport(transport) => {
            let message = transport.to_string();
            match transport.kind() {
                ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Io => {
                    ServiceError::transient(None, message)
                }
                _ => ServiceError::permanent(None, message),
            }
        }
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ServiceError> {
    response
        .into_json::<T>()
        .map_err(|e| ServiceError::permanent(None, format!("malformed response body: {e}")))
}

/// Follow page tokens until the service stops returning one.
///
/// `fetch` receives the previous page's token (`None` for the first page).
/// An empty token ends the walk. A repeated token means the listing cannot be
/// trusted to be complete, so it fails through `repeated` instead of
/// returning a partial result.
pub fn paginate<T, E>(
    mut fetch: impl FnMut(Option<&str>) -> Result<(Vec<T>, Option<String>), E>,
    repeated: impl FnOnce(ServiceError) -> E,
) -> Result<Vec<T>, E> {
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let (page, next) = fetch(token.as_deref())?;
        items.extend(page);
        match next.filter(|t| !t.is_empty()) {
            None => return Ok(items),
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(repeated(ServiceError::permanent(
                    None,
                    format!("page token repeated: {next}"),
                )));
            }
            Some(next) => token = Some(next),
        }
    }
}

// Two envelopes: `{"error": {"code", "message", "status"}}` from the REST
// APIs and `{"error": "...", "error_description": "..."}` from the token endpoint.
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::Object(error) => {
            let message = error.get("message").and_then(Value::as_str)?;
            match error.get("status").and_then(Value::as_str) {
                Some(status) => Some(format!("{status}: {message}")),
                None => Some(message.to_string()),
            }
        }
        Value::String(code) => match value.get("error_description").and_then(Value::as_str) {
            Some(description) => Some(format!("{code}: {description}")),
            None => Some(code.clone()),
        },
        _ => None,
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
