//! Roster core library: domain types, service seams, errors, retry policy.
//!
//! - [`types`]: directory members, contact records, payloads, reports
//! - [`service`]: traits implemented by the Google clients and test fakes
//! - [`error`]: service, directory, delegation, and payload errors
//! - [`retry`]: exponential backoff with jitter

pub mod error;
pub mod retry;
pub mod service;
pub mod types;

pub use error::{DelegationError, DirectoryError, PayloadError, ServiceError};
pub use retry::{RetryFailure, RetryPolicy, Sleeper, ThreadSleeper};
pub use service::{ContactService, CredentialDelegator, DirectoryService};
pub use types::{
    ContactPayload, ContactRecord, DirectoryMember, EmailAddress, MemberFailure, ReconcileEvent,
    ReconcileReport, ResourceName, Roster, RunSummary, ScopedCredential,
};
