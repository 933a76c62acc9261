//! Admin SDK Directory `users.list`.

use serde::Deserialize;

use roster_core::{
    DirectoryError, DirectoryMember, DirectoryService, EmailAddress, RetryPolicy,
    ScopedCredential, ServiceError, Sleeper, ThreadSleeper,
};

use crate::http::{classify, paginate, read_json, HttpClient};

pub const DEFAULT_DIRECTORY_BASE_URL: &str = "https://admin.googleapis.com";
const MAX_RESULTS: &str = "500";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsersPage {
    #[serde(default)]
    users: Vec<ApiUser>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUser {
    primary_email: String,
    #[serde(default)]
    name: Option<ApiUserName>,
    #[serde(default)]
    phones: Vec<ApiPhone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUserName {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPhone {
    #[serde(default)]
    value: Option<String>,
}

impl From<ApiUser> for DirectoryMember {
    fn from(user: ApiUser) -> Self {
        let full_name = user
            .name
            .and_then(|name| {
                name.full_name.filter(|n| !n.trim().is_empty()).or_else(|| {
                    let joined = [name.given_name, name.family_name]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    Some(joined).filter(|n| !n.trim().is_empty())
                })
            })
            .unwrap_or_else(|| user.primary_email.clone());

        DirectoryMember {
            primary_email: EmailAddress::from(user.primary_email),
            full_name,
            phone_numbers: user
                .phones
                .into_iter()
                .filter_map(|p| p.value)
                .filter(|v| !v.trim().is_empty())
                .collect(),
        }
    }
}

/// Lists users through the administrator's delegated credential.
pub struct DirectoryClient {
    http: HttpClient,
    credential: ScopedCredential,
    base_url: String,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl DirectoryClient {
    pub fn new(http: HttpClient, credential: ScopedCredential) -> Self {
        Self {
            http,
            credential,
            base_url: DEFAULT_DIRECTORY_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Retry policy applied to each page fetch.
    pub fn with_retry(mut self, retry: RetryPolicy, sleeper: Box<dyn Sleeper>) -> Self {
        self.retry = retry;
        self.sleeper = sleeper;
        self
    }

    fn fetch_page(
        &self,
        customer_id: &str,
        page_token: Option<&str>,
    ) -> Result<UsersPage, ServiceError> {
        let url = format!("{}/admin/directory/v1/users", self.base_url);
        let mut request = self
            .http
            .agent()
            .get(&url)
            .set("Authorization", &self.credential.bearer())
            .query("customer", customer_id)
            .query("maxResults", MAX_RESULTS);
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        let response = request.call().map_err(classify)?;
        read_json(response)
    }
}

impl DirectoryService for DirectoryClient {
    fn list_members(&self, customer_id: &str) -> Result<Vec<DirectoryMember>, DirectoryError> {
        paginate(
            |token| {
                let (page, attempts) = self
                    .retry
                    .run(self.sleeper.as_ref(), || self.fetch_page(customer_id, token))
                    .map_err(|failure| DirectoryError::Unavailable {
                        customer_id: customer_id.to_string(),
                        attempts: failure.attempts,
                        source: failure.error,
                    })?;
                tracing::debug!(
                    customer_id,
                    users = page.users.len(),
                    attempts,
                    "fetched directory page"
                );
                let members: Vec<DirectoryMember> =
                    page.users.into_iter().map(DirectoryMember::from).collect();
                Ok((members, page.next_page_token))
            },
            |source| DirectoryError::Unavailable {
                customer_id: customer_id.to_string(),
                attempts: 1,
                source,
            },
        )
    }
}
