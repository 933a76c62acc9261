//! Domain types shared by the directory, contacts, and sync layers.
//!
//! Every snapshot type here is read-only for the duration of a run; nothing
//! is persisted between runs.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// An email address compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(pub String);

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the last `@`, if any.
    pub fn domain(&self) -> Option<&str> {
        self.0.rsplit_once('@').map(|(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EmailAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmailAddress {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque contact identifier assigned by the contacts service
/// (`people/c123...`). Unique within one member's contact list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(pub String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// An organization member as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMember {
    pub primary_email: EmailAddress,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<String>,
}

impl DirectoryMember {
    pub fn new(primary_email: impl Into<EmailAddress>, full_name: impl Into<String>) -> Self {
        Self {
            primary_email: primary_email.into(),
            full_name: full_name.into(),
            phone_numbers: Vec::new(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_numbers.push(phone.into());
        self
    }

    /// Creation payload that makes this member a contact of someone else.
    ///
    /// Only name, email, and the first phone number are carried; the contacts
    /// API does not accept job title or organization on this path.
    pub fn contact_payload(&self) -> Result<ContactPayload, PayloadError> {
        ContactPayload::new(
            self.full_name.clone(),
            self.primary_email.clone(),
            self.phone_numbers.first().cloned(),
        )
    }
}

/// Every organization member, in directory order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    members: Vec<DirectoryMember>,
}

impl Roster {
    pub fn new(members: Vec<DirectoryMember>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[DirectoryMember] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirectoryMember> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Set of every primary email, for membership tests.
    pub fn email_index(&self) -> HashSet<&str> {
        self.members.iter().map(|m| m.primary_email.as_str()).collect()
    }
}

impl From<Vec<DirectoryMember>> for Roster {
    fn from(members: Vec<DirectoryMember>) -> Self {
        Self::new(members)
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a DirectoryMember;
    type IntoIter = std::slice::Iter<'a, DirectoryMember>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

/// One entry in a member's personal contact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub resource_name: ResourceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Validated body of a contact creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    given_name: String,
    email: EmailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

impl ContactPayload {
    /// Build a payload. The email must look like an address; a blank name
    /// falls back to the email so the contact is never nameless.
    pub fn new(
        given_name: impl Into<String>,
        email: impl Into<EmailAddress>,
        phone: Option<String>,
    ) -> Result<Self, PayloadError> {
        let email = email.into();
        let trimmed = email.as_str().trim();
        if trimmed.is_empty() {
            return Err(PayloadError::MissingEmail);
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(PayloadError::InvalidEmail(email.0)),
        }

        let given_name = given_name.into();
        let given_name = if given_name.trim().is_empty() {
            email.0.clone()
        } else {
            given_name
        };
        let phone = phone.filter(|p| !p.trim().is_empty());

        Ok(Self {
            given_name,
            email,
            phone,
        })
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// Access token that acts as one subject. Short-lived.
#[derive(Clone, PartialEq, Eq)]
pub struct ScopedCredential {
    pub subject: EmailAddress,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl ScopedCredential {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Tokens never reach logs.
impl fmt::Debug for ScopedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedCredential")
            .field("subject", &self.subject)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Outcome of a single contact operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileEvent {
    /// Contact was created.
    Added { email: EmailAddress, attempts: u32 },
    /// Creation gave up (permanent error, invalid payload, or retries exhausted).
    CreateFailed {
        email: EmailAddress,
        attempts: u32,
        error: String,
    },
    /// Stale contact was deleted.
    Deleted {
        email: EmailAddress,
        resource_name: ResourceName,
    },
    /// Deletion gave up.
    DeleteFailed {
        email: EmailAddress,
        resource_name: ResourceName,
        error: String,
    },
    /// `--dry-run` mode: the contact *would* have been created.
    WouldAdd { email: EmailAddress },
    /// `--dry-run` mode: the contact *would* have been deleted.
    WouldDelete {
        email: EmailAddress,
        resource_name: ResourceName,
    },
}

impl ReconcileEvent {
    pub fn email(&self) -> &EmailAddress {
        match self {
            Self::Added { email, .. }
            | Self::CreateFailed { email, .. }
            | Self::Deleted { email, .. }
            | Self::DeleteFailed { email, .. }
            | Self::WouldAdd { email }
            | Self::WouldDelete { email, .. } => email,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CreateFailed { .. } | Self::DeleteFailed { .. })
    }
}

/// Everything that happened while reconciling one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub member: EmailAddress,
    /// Contacts present before any change.
    pub existing_contacts: usize,
    pub events: Vec<ReconcileEvent>,
}

impl ReconcileReport {
    pub fn new(member: EmailAddress, existing_contacts: usize) -> Self {
        Self {
            member,
            existing_contacts,
            events: Vec::new(),
        }
    }

    pub fn added(&self) -> usize {
        self.count(|e| matches!(e, ReconcileEvent::Added { .. }))
    }

    pub fn deleted(&self) -> usize {
        self.count(|e| matches!(e, ReconcileEvent::Deleted { .. }))
    }

    pub fn failures(&self) -> usize {
        self.count(ReconcileEvent::is_failure)
    }

    pub fn planned_additions(&self) -> usize {
        self.count(|e| matches!(e, ReconcileEvent::WouldAdd { .. }))
    }

    pub fn planned_deletions(&self) -> usize {
        self.count(|e| matches!(e, ReconcileEvent::WouldDelete { .. }))
    }

    /// No contact operation was needed or attempted.
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }

    fn count(&self, pred: impl Fn(&ReconcileEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

/// A member whose reconciliation could not run or finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberFailure {
    pub member: EmailAddress,
    pub error: String,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub members_processed: usize,
    pub members_failed: usize,
    pub contacts_added: usize,
    pub contacts_deleted: usize,
    pub contact_failures: usize,
    pub planned_additions: usize,
    pub planned_deletions: usize,
}

impl RunSummary {
    pub fn from_parts(reports: &[ReconcileReport], failures: &[MemberFailure]) -> Self {
        let mut summary = Self {
            members_processed: reports.len() + failures.len(),
            members_failed: failures.len(),
            ..Self::default()
        };
        for report in reports {
            summary.contacts_added += report.added();
            summary.contacts_deleted += report.deleted();
            summary.contact_failures += report.failures();
            summary.planned_additions += report.planned_additions();
            summary.planned_deletions += report.planned_deletions();
        }
        summary
    }

    /// Contact-level plus member-level failures.
    pub fn total_failures(&self) -> usize {
        self.contact_failures + self.members_failed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
