//! Layered configuration: defaults < YAML file < `ROSTER_*` env < flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use roster_core::RetryPolicy;
use roster_google::{DEFAULT_DIRECTORY_BASE_URL, DEFAULT_PEOPLE_BASE_URL};
use roster_sync::ReconcileOptions;

use crate::paths;

pub const ENV_PREFIX: &str = "ROSTER_";
pub const DEFAULT_CUSTOMER_ID: &str = "my_customer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the service-account JSON key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_key: Option<PathBuf>,
    /// Administrator impersonated for directory reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    pub concurrency: usize,
    /// When non-empty, only stale contacts in these domains are deleted.
    pub managed_domains: Vec<String>,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_account_key: None,
            admin_email: None,
            customer_id: DEFAULT_CUSTOMER_ID.to_string(),
            limit: None,
            concurrency: 1,
            managed_domains: Vec::new(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
    pub retry_deletes: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_jitter_ms: policy.max_jitter.as_millis() as u64,
            retry_deletes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub directory_base_url: String,
    pub people_base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            directory_base_url: DEFAULT_DIRECTORY_BASE_URL.to_string(),
            people_base_url: DEFAULT_PEOPLE_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    /// Write logs here instead of stderr. Truncated at start-up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl AppConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_jitter: Duration::from_millis(self.retry.max_jitter_ms),
        }
    }

    pub fn reconcile_options(&self, dry_run: bool) -> ReconcileOptions {
        ReconcileOptions {
            retry: self.retry_policy(),
            retry_deletes: self.retry.retry_deletes,
            dry_run,
            managed_domains: self.managed_domains.clone(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.customer_id.trim().is_empty() {
            bail!("customer_id must not be empty");
        }
        Ok(())
    }
}

/// Provider stack for `explicit` (or the default file when it exists).
pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file '{}' not found", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        None => {
            if let Ok(path) = paths::default_config_path() {
                if path.exists() {
                    figment = figment.merge(Yaml::file(path));
                }
            }
        }
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    let config: AppConfig = figment(explicit)?
        .extract()
        .context("failed to load configuration")?;
    config.validate()?;
    Ok(config)
}
