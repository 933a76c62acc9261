mod support;

use roster_core::{ContactPayload, ContactService, ResourceName};
use roster_google::{HttpClient, PeopleClient};
use serde_json::json;

use support::{credential, Reply, ScriptedServer};

fn client(server: &ScriptedServer) -> PeopleClient {
    PeopleClient::new(HttpClient::default()).with_base_url(format!("{}/", server.url()))
}

#[test]
fn lists_connections_across_pages() {
    let server = ScriptedServer::start(vec![
        Reply::ok(json!({
            "connections": [
                {"resourceName": "people/c1", "emailAddresses": [{"value": "b@example.com"}]},
                {"resourceName": "people/c2", "names": [{"displayName": "Someone Else"}]}
            ],
            "nextPageToken": "t2"
        })),
        Reply::ok(json!({
            "connections": [
                {"resourceName": "people/c3", "emailAddresses": [{"value": "gone@example.com"}]}
            ]
        })),
    ]);

    let contacts = client(&server)
        .list_contacts(&credential("a@example.com"))
        .expect("list");
    let names: Vec<_> = contacts.iter().map(|c| c.resource_name.as_str()).collect();
    assert_eq!(names, vec!["people/c1", "people/c2", "people/c3"]);
    assert!(contacts[1].email_address.is_none());

    let requests = server.requests();
    assert_eq!(requests[0].path(), "/v1/people/me/connections");
    assert_eq!(
        requests[0].query("personFields"),
        Some("names%2CemailAddresses%2CphoneNumbers")
    );
    assert_eq!(requests[0].query("pageSize"), Some("1000"));
    assert_eq!(requests[0].header("authorization"), Some("Bearer ya29.test"));
    assert_eq!(requests[1].query("pageToken"), Some("t2"));
}

#[test]
fn empty_account_has_no_connections() {
    let server = ScriptedServer::start(vec![Reply::ok(json!({"totalPeople": 0}))]);
    let contacts = client(&server)
        .list_contacts(&credential("a@example.com"))
        .expect("list");
    assert!(contacts.is_empty());
}

#[test]
fn creates_contact_with_payload_body() {
    let server = ScriptedServer::start(vec![Reply::ok(json!({
        "resourceName": "people/c9",
        "names": [{"givenName": "Carol"}],
        "emailAddresses": [{"value": "c@example.com"}]
    }))]);
    let payload = ContactPayload::new("Carol", "c@example.com", None).unwrap();

    let record = client(&server)
        .create_contact(&credential("a@example.com"), &payload)
        .expect("create");
    assert_eq!(record.resource_name.as_str(), "people/c9");

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path(), "/v1/people:createContact");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        json!({
            "names": [{"givenName": "Carol"}],
            "emailAddresses": [{"value": "c@example.com"}]
        })
    );
}

#[test]
fn rate_limited_create_is_transient() {
    let server = ScriptedServer::start(vec![Reply::json(
        429,
        json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}),
    )]);
    let payload = ContactPayload::new("Carol", "c@example.com", None).unwrap();

    let err = client(&server)
        .create_contact(&credential("a@example.com"), &payload)
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.status(), Some(429));
    assert!(err.to_string().contains("RESOURCE_EXHAUSTED: Quota exceeded"));
}

#[test]
fn deletes_by_resource_name() {
    let server = ScriptedServer::start(vec![Reply::ok(json!({}))]);
    client(&server)
        .delete_contact(&credential("a@example.com"), &ResourceName::from("people/c3"))
        .expect("delete");

    let request = &server.requests()[0];
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.target, "/v1/people/c3:deleteContact");
}

#[test]
fn missing_contact_delete_is_permanent() {
    let server = ScriptedServer::start(vec![Reply::json(
        404,
        json!({"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}),
    )]);
    let err = client(&server)
        .delete_contact(&credential("a@example.com"), &ResourceName::from("people/c3"))
        .unwrap_err();
    assert!(!err.is_transient());
    assert_eq!(err.status(), Some(404));
}
