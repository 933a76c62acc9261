//! Seams between the sync logic and the external services.
//!
//! `roster-google` implements these over HTTP; tests use in-memory fakes.
//! All calls are blocking.

use crate::error::{DelegationError, DirectoryError, ServiceError};
use crate::types::{ContactPayload, ContactRecord, DirectoryMember, ResourceName, ScopedCredential};

/// Lists organization members.
pub trait DirectoryService: Send + Sync {
    /// Every member of `customer_id`, paginated to completion, in directory order.
    fn list_members(&self, customer_id: &str) -> Result<Vec<DirectoryMember>, DirectoryError>;
}

/// Turns the base credential it owns into per-subject credentials.
pub trait CredentialDelegator: Send + Sync {
    fn delegate(&self, subject: &str) -> Result<ScopedCredential, DelegationError>;
}

/// A member's personal contact store, addressed through a delegated credential.
pub trait ContactService: Send + Sync {
    /// Every contact of `credential.subject`, paginated to completion.
    fn list_contacts(&self, credential: &ScopedCredential)
        -> Result<Vec<ContactRecord>, ServiceError>;

    fn create_contact(
        &self,
        credential: &ScopedCredential,
        payload: &ContactPayload,
    ) -> Result<ContactRecord, ServiceError>;

    fn delete_contact(
        &self,
        credential: &ScopedCredential,
        resource_name: &ResourceName,
    ) -> Result<(), ServiceError>;
}
