//! User session tests for Skynology Rust SDK.

mod common;

use common::{client, header, BASE_URL};
use serde_json::json;
use skynology::protocol::SESSION_TOKEN_HEADER;
use skynology::{Error, MemorySessionStore, Method, Object, SessionStore, Skynology, User};
use std::sync::Arc;

#[tokio::test]
async fn test_login_with_user_name() {
  let (mut client, transport, sessions) = client();
  transport.respond(json!({
    "objectId": "u1",
    "username": "bo",
    "email": "bo@example.com",
    "sessionToken": "tok-1",
  }));

  let user = client.login_with_user_name("bo", "secret").await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.method, Method::Post);
  assert_eq!(request.url, format!("{}/login", BASE_URL));
  assert_eq!(request.body, Some(json!({"username": "bo", "password": "secret"})));

  assert_eq!(user.id(), "u1");
  assert_eq!(user.user_name(), "bo");
  assert_eq!(user.password(), "");
  assert_eq!(client.session_token(), Some("tok-1"));
  assert!(client.is_authenticated());
  assert!(!sessions.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_variants_send_their_credentials() {
  let (mut client, transport, _) = client();
  transport.respond(json!({"objectId": "u1"}));
  transport.respond(json!({"objectId": "u1"}));

  client.login_with_phone("13800000000", "pw").await.unwrap();
  client.login_with_email("bo@example.com", "pw").await.unwrap();

  let requests = transport.requests();
  assert_eq!(requests[0].body, Some(json!({"phone": "13800000000", "password": "pw"})));
  assert_eq!(requests[1].body, Some(json!({"email": "bo@example.com", "password": "pw"})));
}

#[tokio::test]
async fn test_session_token_is_attached_after_login() {
  let (mut client, transport, _) = client();
  transport.respond(json!({"objectId": "u1", "sessionToken": "tok-1"}));
  transport.respond(json!({"objectId": "p1"}));

  client.login_with_user_name("bo", "pw").await.unwrap();
  let mut obj = Object::new("Post");
  obj.set("title", "t");
  obj.save(&client).await.unwrap();

  let login = &transport.requests()[0];
  assert!(header(login, SESSION_TOKEN_HEADER).is_none());
  assert_eq!(header(&transport.last_request(), SESSION_TOKEN_HEADER), Some("tok-1"));
}

#[tokio::test]
async fn test_failed_login_persists_nothing() {
  let (mut client, transport, sessions) = client();
  transport.fail(211, "wrong password");

  let err = client.login_with_email("bo@example.com", "bad").await.unwrap_err();
  assert_eq!(err.code(), Some(211));
  assert!(!client.is_authenticated());
  assert!(sessions.load().unwrap().is_empty());
  assert!(client.current_user().is_none());
}

#[tokio::test]
async fn test_current_user_and_resume() {
  let (mut client, transport, _) = client();
  transport.respond(json!({"objectId": "u1", "username": "bo", "sessionToken": "tok-1"}));
  client.login_with_user_name("bo", "pw").await.unwrap();

  let current = client.current_user().unwrap();
  assert_eq!(current.id(), "u1");
  assert_eq!(current.user_name(), "bo");

  client.set_session_token(None);
  let resumed = client.resume_session().unwrap();
  assert_eq!(resumed.id(), "u1");
  assert_eq!(client.session_token(), Some("tok-1"));
}

#[tokio::test]
async fn test_logout_clears_session() {
  let (mut client, transport, sessions) = client();
  transport.respond(json!({"objectId": "u1", "sessionToken": "tok-1"}));
  let mut user = client.login_with_user_name("bo", "pw").await.unwrap();

  client.logout(&mut user).await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.url, format!("{}/logout", BASE_URL));
  assert_eq!(request.body, Some(json!({"objectId": "u1"})));
  assert_eq!(header(&request, SESSION_TOKEN_HEADER), Some("tok-1"));

  assert!(!client.is_authenticated());
  assert!(sessions.load().unwrap().is_empty());
  assert!(client.current_user().is_none());
  assert_eq!(user.id(), "");
}

#[tokio::test]
async fn test_failed_logout_keeps_local_session() {
  let (mut client, transport, sessions) = client();
  transport.respond(json!({"objectId": "u1", "sessionToken": "tok-1"}));
  let mut user = client.login_with_user_name("bo", "pw").await.unwrap();

  transport.fail(500, "boom");
  assert!(client.logout(&mut user).await.is_err());

  assert_eq!(client.session_token(), Some("tok-1"));
  assert!(!sessions.load().unwrap().is_empty());
  assert_eq!(user.id(), "u1");
}

#[tokio::test]
async fn test_logout_requires_id() {
  let (mut client, transport, _) = client();
  let mut user = User::new();

  assert!(matches!(client.logout(&mut user).await, Err(Error::MissingObjectId)));
  assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_register() {
  let (client, transport, _) = client();
  transport.respond(json!({"objectId": "u2", "username": "al", "createdAt": "2024-05-01T00:00:00Z"}));

  let mut user = User::new();
  user.set_user_name("al").set_password("pw").set_email("al@example.com");
  user.register(&client).await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.method, Method::Post);
  assert_eq!(request.url, format!("{}/users", BASE_URL));
  assert_eq!(
    request.body,
    Some(json!({"username": "al", "password": "pw", "email": "al@example.com"}))
  );

  assert_eq!(user.id(), "u2");
  assert_eq!(user.user_name(), "al");
  // not echoed by the server, so kept from the setter
  assert_eq!(user.email(), "al@example.com");
}

#[tokio::test]
async fn test_register_with_id_still_creates() {
  let (client, transport, _) = client();
  transport.respond(json!({"objectId": "u5"}));

  let mut user = User::with_id("u4");
  user.set_user_name("al");
  user.register(&client).await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.method, Method::Post);
  assert_eq!(request.url, format!("{}/users", BASE_URL));
  assert_eq!(user.id(), "u5");
}

#[tokio::test]
async fn test_user_writes_use_user_resource() {
  let (client, transport, _) = client();
  transport.respond(json!({"objectId": "u2", "nickname": "Al"}));

  let mut user = User::with_id("u2");
  user.set("nickname", "Al");
  user.save(&client).await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.method, Method::Put);
  assert_eq!(request.url, format!("{}/resources/_User/u2", BASE_URL));
  assert_eq!(user.get("nickname"), Some(&json!("Al")));

  user.delete(&client).await.unwrap();
  let request = transport.last_request();
  assert_eq!(request.method, Method::Delete);
  assert_eq!(request.url, format!("{}/resources/_User/u2", BASE_URL));
  assert_eq!(user.id(), "");
}

#[tokio::test]
async fn test_reset_password() {
  let (client, transport, _) = client();

  let user = User::with_id("u3");
  user.reset_password(&client, "old", "new").await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.method, Method::Post);
  assert_eq!(request.url, format!("{}/users/u3/resetPassword", BASE_URL));
  assert_eq!(
    request.body,
    Some(json!({"old_password": "old", "new_password": "new"}))
  );

  let anonymous = User::new();
  assert!(matches!(
    anonymous.reset_password(&client, "old", "new").await,
    Err(Error::MissingObjectId)
  ));
}

#[tokio::test]
async fn test_func_posts_to_functions() {
  let (client, transport, _) = client();
  transport.respond(json!({"result": "pong"}));

  let out = client.func("ping", json!({"n": 1})).await.unwrap();

  let request = transport.last_request();
  assert_eq!(request.method, Method::Post);
  assert_eq!(request.url, format!("{}/functions/ping", BASE_URL));
  assert_eq!(request.body, Some(json!({"n": 1})));
  assert_eq!(out["result"], json!("pong"));
}

#[tokio::test]
async fn test_call_drops_body_for_get() {
  let (client, transport, _) = client();

  client.call("files/fetch", "get", Some(json!({"x": 1}))).await.unwrap();
  let request = transport.last_request();
  assert_eq!(request.method, Method::Get);
  assert_eq!(request.url, format!("{}/files/fetch", BASE_URL));
  assert_eq!(request.body, None);

  client.call("/files", "PUT", Some(json!({"x": 1}))).await.unwrap();
  let request = transport.last_request();
  assert_eq!(request.method, Method::Put);
  assert_eq!(request.url, format!("{}/files", BASE_URL));
  assert_eq!(request.body, Some(json!({"x": 1})));
}

#[tokio::test]
async fn test_call_rejects_unknown_method() {
  let (client, transport, _) = client();

  let err = client.call("files", "PATCH", None).await.unwrap_err();
  assert!(matches!(err, Error::Config(_)));
  assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_weixin_requires_binding() {
  let (client, transport, _) = client();

  let err = client.weixin_get("menu").await.unwrap_err();
  assert!(matches!(err, Error::Config(_)));
  assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_weixin_calls() {
  let transport = common::MockTransport::new();
  let config = common::config().with_weixin("wx1", "mp");
  let client = Skynology::with_parts(
    config,
    transport.clone(),
    Arc::new(MemorySessionStore::new()),
  );

  client.weixin_post("/menu", json!({"button": []})).await.unwrap();
  let request = transport.last_request();
  assert_eq!(request.method, Method::Post);
  assert_eq!(request.url, format!("{}/weixin/menu", BASE_URL));

  client.weixin_delete("menu").await.unwrap();
  let request = transport.last_request();
  assert_eq!(request.method, Method::Delete);
  assert_eq!(request.body, None);
}

struct StuckSessionStore;

impl SessionStore for StuckSessionStore {
  fn save(&self, _identity: &[u8]) -> skynology::Result<()> {
    Ok(())
  }

  fn load(&self) -> skynology::Result<Vec<u8>> {
    Ok(Vec::new())
  }

  fn clear(&self) -> skynology::Result<()> {
    Err(Error::Session("read-only store".to_string()))
  }
}

#[tokio::test]
async fn test_logout_forgets_token_when_store_fails() {
  let transport = common::MockTransport::new();
  let mut client = Skynology::with_parts(
    common::config(),
    transport.clone(),
    Arc::new(StuckSessionStore),
  );
  transport.respond(json!({"objectId": "u1", "sessionToken": "tok-1"}));
  let mut user = client.login_with_user_name("bo", "pw").await.unwrap();

  let err = client.logout(&mut user).await.unwrap_err();

  assert!(matches!(err, Error::Session(_)));
  assert_eq!(transport.requests().len(), 2);
  assert_eq!(client.session_token(), None);
  assert!(!client.is_authenticated());
  assert_eq!(user.id(), "");
}
