//! In-memory fakes of the directory, delegation, and contacts services.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use roster_core::{
    ContactPayload, ContactRecord, ContactService, CredentialDelegator, DelegationError,
    DirectoryError, DirectoryMember, DirectoryService, EmailAddress, ResourceName, RetryPolicy,
    Roster, ScopedCredential, ServiceError, Sleeper,
};
use roster_sync::ReconcileOptions;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn member(email: &str) -> DirectoryMember {
    let name = email.split('@').next().unwrap_or(email).to_uppercase();
    DirectoryMember::new(email, name)
}

pub fn roster(emails: &[&str]) -> Roster {
    Roster::new(emails.iter().map(|e| member(e)).collect())
}

pub fn credential(subject: &str) -> ScopedCredential {
    ScopedCredential {
        subject: EmailAddress::from(subject),
        access_token: format!("token-for-{subject}"),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

/// Options with instant backoff so tests never wait.
pub fn fast_options() -> ReconcileOptions {
    ReconcileOptions {
        retry: RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        },
        ..ReconcileOptions::default()
    }
}

pub fn busy() -> ServiceError {
    ServiceError::transient(Some(503), "backend unavailable")
}

pub fn rejected() -> ServiceError {
    ServiceError::permanent(Some(400), "invalid argument")
}

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

pub struct FakeDirectory {
    pub members: Vec<DirectoryMember>,
    pub fail: bool,
}

impl DirectoryService for FakeDirectory {
    fn list_members(&self, customer_id: &str) -> Result<Vec<DirectoryMember>, DirectoryError> {
        if self.fail {
            return Err(DirectoryError::Unavailable {
                customer_id: customer_id.to_string(),
                attempts: 5,
                source: busy(),
            });
        }
        Ok(self.members.clone())
    }
}

// ---------------------------------------------------------------------------
// Delegation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeDelegator {
    denied: HashSet<String>,
    pub delegated: Mutex<Vec<String>>,
}

impl FakeDelegator {
    pub fn deny(mut self, subject: &str) -> Self {
        self.denied.insert(subject.to_string());
        self
    }
}

impl CredentialDelegator for FakeDelegator {
    fn delegate(&self, subject: &str) -> Result<ScopedCredential, DelegationError> {
        self.delegated.lock().unwrap().push(subject.to_string());
        if self.denied.contains(subject) {
            return Err(DelegationError::Denied {
                subject: subject.to_string(),
                reason: "unauthorized_client".to_string(),
            });
        }
        Ok(credential(subject))
    }
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { subject: String },
    Create { subject: String, email: String },
    Delete { subject: String, resource_name: String },
}

#[derive(Default)]
pub struct FakeContacts {
    stores: Mutex<HashMap<String, Vec<ContactRecord>>>,
    next_id: AtomicUsize,
    create_failures: Mutex<HashMap<String, VecDeque<ServiceError>>>,
    delete_failures: Mutex<HashMap<String, VecDeque<ServiceError>>>,
    list_failures: Mutex<HashMap<String, ServiceError>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeContacts {
    /// Seed `subject`'s store with `(resource_name, email)` pairs.
    pub fn with_contacts(self, subject: &str, contacts: &[(&str, Option<&str>)]) -> Self {
        let records = contacts
            .iter()
            .map(|(id, email)| ContactRecord {
                resource_name: ResourceName::from(*id),
                email_address: email.map(EmailAddress::from),
                name: None,
                phone_number: None,
            })
            .collect();
        self.stores.lock().unwrap().insert(subject.to_string(), records);
        self
    }

    /// Creating a contact for `email` returns these errors, in order, before succeeding.
    pub fn fail_create(self, email: &str, errors: Vec<ServiceError>) -> Self {
        self.create_failures
            .lock()
            .unwrap()
            .insert(email.to_string(), errors.into());
        self
    }

    pub fn fail_delete(self, resource_name: &str, errors: Vec<ServiceError>) -> Self {
        self.delete_failures
            .lock()
            .unwrap()
            .insert(resource_name.to_string(), errors.into());
        self
    }

    pub fn fail_list(self, subject: &str, error: ServiceError) -> Self {
        self.list_failures
            .lock()
            .unwrap()
            .insert(subject.to_string(), error);
        self
    }

    pub fn contacts_of(&self, subject: &str) -> Vec<ContactRecord> {
        self.stores
            .lock()
            .unwrap()
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    pub fn emails_of(&self, subject: &str) -> Vec<String> {
        let mut emails: Vec<String> = self
            .contacts_of(subject)
            .into_iter()
            .filter_map(|c| c.email_address.map(|e| e.0))
            .collect();
        emails.sort();
        emails
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { email, .. } => Some(email),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { resource_name, .. } => Some(resource_name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted(
        failures: &Mutex<HashMap<String, VecDeque<ServiceError>>>,
        key: &str,
    ) -> Option<ServiceError> {
        failures
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(VecDeque::pop_front)
    }
}

impl ContactService for FakeContacts {
    fn list_contacts(
        &self,
        credential: &ScopedCredential,
    ) -> Result<Vec<ContactRecord>, ServiceError> {
        let subject = credential.subject.as_str();
        self.record(Call::List {
            subject: subject.to_string(),
        });
        if let Some(err) = self.list_failures.lock().unwrap().get(subject) {
            return Err(err.clone());
        }
        Ok(self.contacts_of(subject))
    }

    fn create_contact(
        &self,
        credential: &ScopedCredential,
        payload: &ContactPayload,
    ) -> Result<ContactRecord, ServiceError> {
        let subject = credential.subject.as_str();
        self.record(Call::Create {
            subject: subject.to_string(),
            email: payload.email().to_string(),
        });
        if let Some(err) = Self::scripted(&self.create_failures, payload.email().as_str()) {
            return Err(err);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = ContactRecord {
            resource_name: ResourceName::from(format!("people/new{id}")),
            email_address: Some(payload.email().clone()),
            name: Some(payload.given_name().to_string()),
            phone_number: payload.phone().map(str::to_owned),
        };
        self.stores
            .lock()
            .unwrap()
            .entry(subject.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn delete_contact(
        &self,
        credential: &ScopedCredential,
        resource_name: &ResourceName,
    ) -> Result<(), ServiceError> {
        let subject = credential.subject.as_str();
        self.record(Call::Delete {
            subject: subject.to_string(),
            resource_name: resource_name.to_string(),
        });
        if let Some(err) = Self::scripted(&self.delete_failures, resource_name.as_str()) {
            return Err(err);
        }

        let mut stores = self.stores.lock().unwrap();
        let store = stores.entry(subject.to_string()).or_default();
        let before = store.len();
        store.retain(|c| &c.resource_name != resource_name);
        if store.len() == before {
            return Err(ServiceError::permanent(Some(404), "contact not found"));
        }
        Ok(())
    }
}
