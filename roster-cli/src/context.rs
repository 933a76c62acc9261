//! Everything a command needs, built once per invocation.

use anyhow::{Context, Result};

use roster_core::{CredentialDelegator, ThreadSleeper};
use roster_google::{
    CredentialError, DirectoryClient, HttpClient, PeopleClient, ServiceAccountDelegator,
    ServiceAccountKey, CONTACTS_SCOPE, DIRECTORY_SCOPE,
};

use crate::config::AppConfig;

pub struct RunContext {
    pub directory: DirectoryClient,
    pub delegator: ServiceAccountDelegator,
    pub people: PeopleClient,
    pub sleeper: ThreadSleeper,
}

impl RunContext {
    /// Load the key, delegate the administrator for directory access, and
    /// wire the contacts clients. Any failure here aborts the run.
    pub fn bootstrap(config: &AppConfig) -> Result<Self> {
        let key_path = config
            .service_account_key
            .as_deref()
            .context("service_account_key is not configured (set it in the config file or ROSTER_SERVICE_ACCOUNT_KEY)")?;
        let admin_email = config
            .admin_email
            .as_deref()
            .context("admin_email is not configured (set it in the config file or ROSTER_ADMIN_EMAIL)")?;

        let key = ServiceAccountKey::from_file(key_path)
            .context("failed to load service account key")?;
        tracing::debug!(
            service_account = %key.client_email,
            key = %key_path.display(),
            "loaded service account key"
        );

        let http = HttpClient::new(config.http_timeout());
        let retry = config.retry_policy();

        let admin = ServiceAccountDelegator::new(key.clone(), &[DIRECTORY_SCOPE], http.clone())?
            .with_retry(retry.clone(), Box::new(ThreadSleeper));
        let admin_credential = admin
            .delegate(admin_email)
            .map_err(CredentialError::AdminDelegation)?;
        tracing::info!(admin = admin_email, "directory access delegated");

        let directory = DirectoryClient::new(http.clone(), admin_credential)
            .with_base_url(config.http.directory_base_url.as_str())
            .with_retry(retry.clone(), Box::new(ThreadSleeper));
        let delegator = ServiceAccountDelegator::new(key, &[CONTACTS_SCOPE], http.clone())?
            .with_retry(retry, Box::new(ThreadSleeper));
        let people = PeopleClient::new(http).with_base_url(config.http.people_base_url.as_str());

        Ok(Self {
            directory,
            delegator,
            people,
            sleeper: ThreadSleeper,
        })
    }
}
