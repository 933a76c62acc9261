//! People API: list connections, create and delete contacts as a delegated user.

use serde::{Deserialize, Serialize};

use roster_core::{
    ContactPayload, ContactRecord, ContactService, EmailAddress, ResourceName, ScopedCredential,
    ServiceError,
};

use crate::http::{classify, paginate, read_json, HttpClient};

pub const DEFAULT_PEOPLE_BASE_URL: &str = "https://people.googleapis.com";
const PERSON_FIELDS: &str = "names,emailAddresses,phoneNumbers";
const PAGE_SIZE: &str = "1000";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionsPage {
    #[serde(default)]
    connections: Vec<ApiPerson>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPerson {
    #[serde(default)]
    resource_name: Option<String>,
    #[serde(default)]
    names: Vec<ApiName>,
    #[serde(default)]
    email_addresses: Vec<ApiValue>,
    #[serde(default)]
    phone_numbers: Vec<ApiValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiName {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiValue {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewPerson<'a> {
    names: [NewName<'a>; 1],
    email_addresses: [NewValue<'a>; 1],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    phone_numbers: Vec<NewValue<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewName<'a> {
    given_name: &'a str,
}

#[derive(Debug, Serialize)]
struct NewValue<'a> {
    value: &'a str,
}

impl<'a> From<&'a ContactPayload> for NewPerson<'a> {
    fn from(payload: &'a ContactPayload) -> Self {
        Self {
            names: [NewName {
                given_name: payload.given_name(),
            }],
            email_addresses: [NewValue {
                value: payload.email().as_str(),
            }],
            phone_numbers: payload
                .phone()
                .map(|value| NewValue { value })
                .into_iter()
                .collect(),
        }
    }
}

fn first_value(values: Vec<ApiValue>) -> Option<String> {
    values
        .into_iter()
        .next()
        .and_then(|v| v.value)
        .filter(|v| !v.is_empty())
}

impl ApiPerson {
    /// The first email, name, and phone of the person. `None` without a
    /// resource name, since such a contact could never be deleted.
    fn into_record(self) -> Option<ContactRecord> {
        let resource_name = self.resource_name.filter(|r| !r.is_empty())?;
        let name = self
            .names
            .into_iter()
            .next()
            .and_then(|n| n.display_name.or(n.given_name));
        Some(ContactRecord {
            resource_name: ResourceName::from(resource_name),
            email_address: first_value(self.email_addresses).map(EmailAddress::from),
            name,
            phone_number: first_value(self.phone_numbers),
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Contacts of whichever subject the passed credential acts as.
#[derive(Debug, Clone)]
pub struct PeopleClient {
    http: HttpClient,
    base_url: String,
}

impl PeopleClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: DEFAULT_PEOPLE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn fetch_page(
        &self,
        credential: &ScopedCredential,
        page_token: Option<&str>,
    ) -> Result<ConnectionsPage, ServiceError> {
        let url = format!("{}/v1/people/me/connections", self.base_url);
        let mut request = self
            .http
            .agent()
            .get(&url)
            .set("Authorization", &credential.bearer())
            .query("personFields", PERSON_FIELDS)
            .query("pageSize", PAGE_SIZE);
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        let response = request.call().map_err(classify)?;
        read_json(response)
    }
}

impl ContactService for PeopleClient {
    fn list_contacts(
        &self,
        credential: &ScopedCredential,
    ) -> Result<Vec<ContactRecord>, ServiceError> {
        paginate(
            |token| {
                let page = self.fetch_page(credential, token)?;
                let total = page.connections.len();
                let records: Vec<ContactRecord> = page
                    .connections
                    .into_iter()
                    .filter_map(ApiPerson::into_record)
                    .collect();
                if records.len() < total {
                    tracing::warn!(
                        subject = %credential.subject,
                        skipped = total - records.len(),
                        "connections without resource name ignored"
                    );
                }
                Ok((records, page.next_page_token))
            },
            |err| err,
        )
    }

    fn create_contact(
        &self,
        credential: &ScopedCredential,
        payload: &ContactPayload,
    ) -> Result<ContactRecord, ServiceError> {
        let url = format!("{}/v1/people:createContact", self.base_url);
        let response = self
            .http
            .agent()
            .post(&url)
            .set("Authorization", &credential.bearer())
            .send_json(NewPerson::from(payload))
            .map_err(classify)?;
        let person: ApiPerson = read_json(response)?;
        person
            .into_record()
            .ok_or_else(|| ServiceError::permanent(None, "created contact has no resource name"))
    }

    fn delete_contact(
        &self,
        credential: &ScopedCredential,
        resource_name: &ResourceName,
    ) -> Result<(), ServiceError> {
        let url = format!("{}/v1/{}:deleteContact", self.base_url, resource_name);
        self.http
            .agent()
            .delete(&url)
            .set("Authorization", &credential.bearer())
            .call()
            .map_err(classify)?;
        Ok(())
    }
}
