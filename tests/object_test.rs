//! Skynology Rust SDK - Object lifecycle tests

mod common;

use common::{client, BASE_URL};
use serde_json::{json, Value};
use skynology::{Error, Method, Object};

#[tokio::test]
async fn test_create_sends_pending_changes() {
    let (client, transport, _) = client();
    transport.respond(json!({
        "objectId": "abc",
        "name": "Bo",
        "createdAt": "2024-01-01T00:00:00Z",
    }));

    let mut obj = Object::new("Person");
    obj.set("name", "Bo");
    obj.save(&client).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, format!("{}/resources/Person", BASE_URL));
    assert_eq!(request.body, Some(json!({"name": "Bo"})));

    assert_eq!(obj.id(), "abc");
    assert_eq!(obj.get("name"), Some(&json!("Bo")));
    assert_eq!(obj.created_at().unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert!(obj.changes().is_empty());
}

#[tokio::test]
async fn test_second_save_sends_empty_changes() {
    let (client, transport, _) = client();
    transport.respond(json!({"objectId": "abc", "name": "Bo"}));
    transport.respond(json!({"objectId": "abc", "name": "Bo"}));

    let mut obj = Object::new("Person");
    obj.set("name", "Bo");
    obj.save(&client).await.unwrap();
    obj.save(&client).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.url, format!("{}/resources/Person/abc", BASE_URL));
    assert_eq!(request.body, Some(json!({})));
}

#[tokio::test]
async fn test_save_replaces_fetched_state() {
    let (client, transport, _) = client();
    transport.respond(json!({"objectId": "abc", "updatedAt": "2024-02-01T00:00:00.5Z"}));

    let mut obj = Object::with_id("Person", "abc");
    obj.set("name", "Bo");
    obj.save(&client).await.unwrap();

    // response carried no `name`, so nothing is visible locally
    assert!(obj.get("name").is_none());
    assert_eq!(obj.id(), "abc");
    assert!(obj.updated_at().is_some());
}

#[tokio::test]
async fn test_increment_is_server_side() {
    let (client, transport, _) = client();
    transport.respond(json!({"objectId": "p1", "views": 15}));

    let mut obj = Object::with_id("Post", "p1");
    obj.increment_by("views", 5);
    assert!(obj.get("views").is_none());

    obj.save(&client).await.unwrap();
    assert_eq!(
        transport.last_request().body,
        Some(json!({"views": {"__op": "Increment", "amount": 5}}))
    );
    assert_eq!(obj.get_int("views"), 15);
}

#[tokio::test]
async fn test_failed_save_keeps_pending_changes() {
    let (client, transport, _) = client();
    transport.fail(503, "unavailable");

    let mut obj = Object::new("Person");
    obj.set("name", "Bo");
    let err = obj.save(&client).await.unwrap_err();

    assert!(matches!(err, Error::Api { code: 503, .. }));
    assert!(obj.is_new());
    assert_eq!(obj.changes()["name"], json!("Bo"));

    // retry goes through with the same body
    transport.respond(json!({"objectId": "abc", "name": "Bo"}));
    obj.save(&client).await.unwrap();
    assert_eq!(transport.last_request().body, Some(json!({"name": "Bo"})));
    assert_eq!(obj.id(), "abc");
}

#[tokio::test]
async fn test_update_object_in_array_targets_array_path() {
    let (client, transport, _) = client();
    transport.respond(json!({"objectId": "p1"}));

    let mut obj = Object::with_id("Post", "p1");
    obj.set("title", "dropped");
    obj.update_object_in_array(json!({"comments.id": 3}), json!({"comments.$.text": "edited"}));
    obj.save(&client).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.url, format!("{}/resources/Post/p1/array", BASE_URL));
    assert_eq!(
        request.body,
        Some(json!({"query": {"comments.id": 3}, "data": {"comments.$.text": "edited"}}))
    );

    // the array path only applies to that save
    obj.set("title", "next");
    assert_eq!(obj.save_url(&client), format!("{}/resources/Post/p1", BASE_URL));
}

#[tokio::test]
async fn test_save_stages_acl() {
    let (client, transport, _) = client();
    transport.respond(json!({
        "objectId": "p1",
        "ACL": {"u1": {"read": true, "write": true}, "role:admin": {"read": true, "write": false}},
    }));

    let mut obj = Object::new("Post");
    obj.set_read_write_access("u1", true, true)
        .set_role_read_access("admin", true);
    obj.save(&client).await.unwrap();

    let body = transport.last_request().body.unwrap();
    assert_eq!(
        body["ACL"],
        json!({"role:admin": {"read": true, "write": false}, "u1": {"read": true, "write": true}})
    );
    assert!(obj.check_acl("u2", &["admin"], skynology::AccessKind::Read));
    assert!(!obj.check_acl("u2", &["admin"], skynology::AccessKind::Write));
}

#[tokio::test]
async fn test_delete_clears_object() {
    let (client, transport, _) = client();

    let mut obj = Object::from_data(
        "Post",
        serde_json::from_value(json!({"objectId": "p1", "title": "t"})).unwrap(),
    );
    obj.delete(&client).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.url, format!("{}/resources/Post/p1", BASE_URL));
    assert_eq!(request.body, None);
    assert!(obj.is_new());
    assert!(obj.data().is_empty());
}

#[tokio::test]
async fn test_failed_delete_leaves_object() {
    let (client, transport, _) = client();
    transport.fail(404, "not found");

    let mut obj = Object::from_data(
        "Post",
        serde_json::from_value(json!({"objectId": "p1", "title": "t"})).unwrap(),
    );
    let err = obj.delete(&client).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(obj.id(), "p1");
    assert_eq!(obj.get_string("title"), "t");
}

#[tokio::test]
async fn test_delete_and_fetch_require_id() {
    let (client, transport, _) = client();
    let mut obj = Object::new("Post");

    assert!(matches!(obj.delete(&client).await, Err(Error::MissingObjectId)));
    assert!(matches!(obj.fetch(&client).await, Err(Error::MissingObjectId)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_fetch_hydrates() {
    let (client, transport, _) = client();
    transport.respond(json!({"objectId": "p1", "title": "fresh", "tags": ["a"]}));

    let mut obj = Object::with_id("Post", "p1");
    obj.set("title", "local");
    obj.fetch(&client).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, format!("{}/resources/Post/p1", BASE_URL));
    assert_eq!(obj.get_string("title"), "fresh");
    assert_eq!(obj.get_array("tags"), &[Value::from("a")]);
    assert!(obj.changes().is_empty());
}
