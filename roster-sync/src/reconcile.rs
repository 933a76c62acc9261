//! Per-member contact reconciliation.
//!
//! ## Passes
//!
//! 1. Fetch the member's current contacts.
//! 2. Additions, in roster order: every other member whose primary email no
//!    existing contact carries is created.
//! 3. Deletions, in contact order: for every distinct contact email that no
//!    roster member owns, the *first* contact carrying it is deleted.
//!
//! Additions always finish before deletions start. Contacts without an email
//! address are never touched. A failed contact operation is recorded and the
//! pass moves on.

use std::collections::HashSet;

use roster_core::{
    ContactPayload, ContactRecord, ContactService, DirectoryMember, EmailAddress, PayloadError,
    ReconcileEvent, ReconcileReport, ResourceName, RetryPolicy, Roster, ScopedCredential, Sleeper,
};

use crate::error::MemberError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Applied to contact listing and creation.
    pub retry: RetryPolicy,
    /// Apply `retry` to deletions too; otherwise deletions get one attempt.
    pub retry_deletes: bool,
    /// Plan only: report `WouldAdd` / `WouldDelete` and mutate nothing.
    pub dry_run: bool,
    /// When non-empty, stale contacts are deleted only if their email domain
    /// is listed (case-insensitive).
    pub managed_domains: Vec<String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            retry_deletes: true,
            dry_run: false,
            managed_domains: Vec::new(),
        }
    }
}

impl ReconcileOptions {
    fn delete_policy(&self) -> RetryPolicy {
        if self.retry_deletes {
            self.retry.clone()
        } else {
            RetryPolicy::none()
        }
    }

    fn in_deletion_scope(&self, email: &EmailAddress) -> bool {
        if self.managed_domains.is_empty() {
            return true;
        }
        email.domain().is_some_and(|domain| {
            self.managed_domains
                .iter()
                .any(|managed| managed.eq_ignore_ascii_case(domain))
        })
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A roster member missing from the contact list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAddition {
    pub email: EmailAddress,
    pub payload: Result<ContactPayload, PayloadError>,
}

/// A contact whose email no roster member owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDeletion {
    pub email: EmailAddress,
    pub resource_name: ResourceName,
}

/// The set difference between a member's contacts and the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPlan {
    pub additions: Vec<PlannedAddition>,
    pub deletions: Vec<PlannedDeletion>,
}

impl ContactPlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Compute the additions and deletions that bring `contacts` in line with
/// `roster` for `member`. Pure; performs no calls.
pub fn plan(
    member: &DirectoryMember,
    roster: &Roster,
    contacts: &[ContactRecord],
    options: &ReconcileOptions,
) -> ContactPlan {
    let existing: HashSet<&str> = contacts
        .iter()
        .filter_map(|c| c.email_address.as_ref())
        .map(EmailAddress::as_str)
        .collect();

    let mut considered = HashSet::new();
    let additions = roster
        .iter()
        .filter(|&other| other.primary_email != member.primary_email)
        .filter(|&other| considered.insert(other.primary_email.as_str()))
        .filter(|&other| !existing.contains(other.primary_email.as_str()))
        .map(|other| PlannedAddition {
            email: other.primary_email.clone(),
            payload: other.contact_payload(),
        })
        .collect();

    // Contact order, first record per distinct email.
    let directory = roster.email_index();
    let mut seen = HashSet::new();
    let deletions = contacts
        .iter()
        .filter_map(|c| c.email_address.as_ref().map(|email| (email, c)))
        .filter(|&(email, _)| seen.insert(email.as_str()))
        .filter(|&(email, _)| !directory.contains(email.as_str()))
        .filter(|&(email, _)| options.in_deletion_scope(email))
        .map(|(email, c)| PlannedDeletion {
            email: email.clone(),
            resource_name: c.resource_name.clone(),
        })
        .collect();

    ContactPlan {
        additions,
        deletions,
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Executes a [`ContactPlan`] against a member's contact store.
pub struct Reconciler<'a> {
    contacts: &'a dyn ContactService,
    sleeper: &'a dyn Sleeper,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        contacts: &'a dyn ContactService,
        sleeper: &'a dyn Sleeper,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            contacts,
            sleeper,
            options,
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Reconcile one member's contacts against the roster.
    ///
    /// Only a failure to read the contact list is an error; every contact
    /// operation outcome lands in the returned report.
    pub fn reconcile(
        &self,
        member: &DirectoryMember,
        roster: &Roster,
        credential: &ScopedCredential,
    ) -> Result<ReconcileReport, MemberError> {
        let (contacts, _) = self
            .options
            .retry
            .run(self.sleeper, || self.contacts.list_contacts(credential))
            .map_err(|failure| MemberError::ListContacts {
                attempts: failure.attempts,
                source: failure.error,
            })?;
        tracing::debug!(
            member = %member.primary_email,
            contacts = contacts.len(),
            "fetched contacts"
        );

        let plan = plan(member, roster, &contacts, &self.options);
        let mut report = ReconcileReport::new(member.primary_email.clone(), contacts.len());

        for addition in plan.additions {
            report
                .events
                .push(self.add(member, credential, addition));
        }
        let delete_policy = self.options.delete_policy();
        for deletion in plan.deletions {
            report
                .events
                .push(self.delete(member, credential, deletion, &delete_policy));
        }

        Ok(report)
    }

    fn add(
        &self,
        member: &DirectoryMember,
        credential: &ScopedCredential,
        addition: PlannedAddition,
    ) -> ReconcileEvent {
        let PlannedAddition { email, payload } = addition;
        let payload = match payload {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(
                    member = %member.primary_email,
                    contact = %email,
                    error = %err,
                    "invalid contact payload"
                );
                return ReconcileEvent::CreateFailed {
                    email,
                    attempts: 0,
                    error: err.to_string(),
                };
            }
        };

        if self.options.dry_run {
            tracing::info!(member = %member.primary_email, contact = %email, "[dry-run] would add contact");
            return ReconcileEvent::WouldAdd { email };
        }

        match self
            .options
            .retry
            .run(self.sleeper, || self.contacts.create_contact(credential, &payload))
        {
            Ok((_, attempts)) => {
                tracing::info!(member = %member.primary_email, contact = %email, attempts, "added contact");
                ReconcileEvent::Added { email, attempts }
            }
            Err(failure) => {
                tracing::error!(
                    member = %member.primary_email,
                    contact = %email,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "failed to add contact"
                );
                ReconcileEvent::CreateFailed {
                    email,
                    attempts: failure.attempts,
                    error: failure.error.to_string(),
                }
            }
        }
    }

    fn delete(
        &self,
        member: &DirectoryMember,
        credential: &ScopedCredential,
        deletion: PlannedDeletion,
        policy: &RetryPolicy,
    ) -> ReconcileEvent {
        let PlannedDeletion {
            email,
            resource_name,
        } = deletion;

        if self.options.dry_run {
            tracing::info!(member = %member.primary_email, contact = %email, "[dry-run] would delete contact");
            return ReconcileEvent::WouldDelete {
                email,
                resource_name,
            };
        }

        match policy.run(self.sleeper, || {
            self.contacts.delete_contact(credential, &resource_name)
        }) {
            Ok(((), _)) => {
                tracing::info!(
                    member = %member.primary_email,
                    contact = %email,
                    resource_name = %resource_name,
                    "deleted contact"
                );
                ReconcileEvent::Deleted {
                    email,
                    resource_name,
                }
            }
            Err(failure) => {
                tracing::error!(
                    member = %member.primary_email,
                    contact = %email,
                    resource_name = %resource_name,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "failed to delete contact"
                );
                ReconcileEvent::DeleteFailed {
                    email,
                    resource_name,
                    error: failure.error.to_string(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
