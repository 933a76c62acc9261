//! Error types for roster-sync.

use thiserror::Error;

use roster_core::{DelegationError, ServiceError};

/// Reasons a single member's reconciliation could not run.
///
/// Contact-level failures never surface here; they are recorded as events
/// in the member's report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    /// No delegated credential for this member.
    #[error(transparent)]
    Delegation(#[from] DelegationError),

    /// The member's contact list could not be read.
    #[error("failed to list contacts after {attempts} attempt(s): {source}")]
    ListContacts {
        attempts: u32,
        #[source]
        source: ServiceError,
    },
}
