//! # roster-google
//!
//! Blocking Google Workspace clients behind the `roster-core` service traits:
//!
//! - [`DirectoryClient`]: Admin SDK Directory `users.list`
//! - [`PeopleClient`]: People API connections, `createContact`, `deleteContact`
//! - [`ServiceAccountDelegator`]: domain-wide delegation via signed JWT assertions

pub mod auth;
pub mod directory;
pub mod error;
pub mod http;
pub mod key;
pub mod people;

pub use auth::{ServiceAccountDelegator, CONTACTS_SCOPE, DIRECTORY_SCOPE};
pub use directory::{DirectoryClient, DEFAULT_DIRECTORY_BASE_URL};
pub use error::CredentialError;
pub use http::HttpClient;
pub use key::ServiceAccountKey;
pub use people::{PeopleClient, DEFAULT_PEOPLE_BASE_URL};
