//! Client context shared by every call.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::protocol::{Method, SESSION_TOKEN_HEADER};
use crate::query::Query;
use crate::session::{FileSessionStore, SessionStore};
use crate::transport::{HttpTransport, Request, Transport};
use crate::user::User;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Skynology client
///
/// Holds the configuration, the transport, the session store and the
/// token of the logged-in user. Not synchronized: share it behind a lock
/// if several tasks need to log in or out concurrently.
pub struct Skynology {
  config: Config,
  transport: Arc<dyn Transport>,
  sessions: Arc<dyn SessionStore>,
  session_token: Option<String>,
}

impl Skynology {
  /// Create a client talking HTTP and keeping the session on disk
  pub fn new(config: Config) -> Result<Self> {
    let transport = HttpTransport::new(config.clone())?;
    let sessions = FileSessionStore::for_config(&config);
    Ok(Self::with_parts(config, Arc::new(transport), Arc::new(sessions)))
  }

  /// Create a client from explicit collaborators
  pub fn with_parts(
    config: Config,
    transport: Arc<dyn Transport>,
    sessions: Arc<dyn SessionStore>,
  ) -> Self {
    Self {
      config,
      transport,
      sessions,
      session_token: None,
    }
  }

  /// Get the configuration
  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn session_token(&self) -> Option<&str> {
    self.session_token.as_deref()
  }

  pub fn set_session_token(&mut self, token: Option<String>) {
    self.session_token = token;
  }

  pub fn is_authenticated(&self) -> bool {
    self.session_token.is_some()
  }

  /// New object in a resource
  pub fn object(&self, resource_name: &str) -> Object {
    Object::new(resource_name)
  }

  /// Query over a resource
  pub fn query(&self, resource_name: &str) -> Query {
    Query::new(resource_name)
  }

  /// Send one request, attaching the session token when logged in
  pub async fn send(
    &self,
    method: Method,
    url: String,
    body: Option<Value>,
  ) -> Result<Map<String, Value>> {
    let mut request = Request::new(method, url);
    if let Some(body) = body {
      request = request.with_body(body);
    }
    if let Some(token) = &self.session_token {
      request = request.with_header(SESSION_TOKEN_HEADER, token.clone());
    }
    debug!("{} {}", request.method, request.url);
    self.transport.send(request).await
  }

  // ==================== Users ====================

  /// Log in with user name and password
  pub async fn login_with_user_name(&mut self, user_name: &str, password: &str) -> Result<User> {
    self
      .login(json!({"username": user_name, "password": password}))
      .await
  }

  /// Log in with phone number and password
  pub async fn login_with_phone(&mut self, phone: &str, password: &str) -> Result<User> {
    self
      .login(json!({"phone": phone, "password": password}))
      .await
  }

  /// Log in with email and password
  pub async fn login_with_email(&mut self, email: &str, password: &str) -> Result<User> {
    self
      .login(json!({"email": email, "password": password}))
      .await
  }

  #[instrument(skip(self, credentials))]
  async fn login(&mut self, credentials: Value) -> Result<User> {
    let url = self.config.url("login");
    let data = self.send(Method::Post, url, Some(credentials)).await?;

    let user = User::from_data(data);
    if let Some(token) = user.session_token() {
      self.session_token = Some(token);
    }

    // best effort
    if let Err(e) = self.persist_user(&user) {
      warn!(error = %e, "failed to persist session");
    }

    Ok(user)
  }

  fn persist_user(&self, user: &User) -> Result<()> {
    let bytes = serde_json::to_vec(user.object().data())?;
    self.sessions.save(&bytes)
  }

  /// Log out remotely, then forget the local session.
  ///
  /// If the server rejects the logout the local session is kept. Once the
  /// server has accepted it, the token and `user` are dropped even when the
  /// session store fails to clear; that failure is still returned.
  #[instrument(skip(self, user), fields(id = %user.id()))]
  pub async fn logout(&mut self, user: &mut User) -> Result<()> {
    if user.object().is_new() {
      return Err(Error::MissingObjectId);
    }

    let url = self.config.url("logout");
    self
      .send(Method::Post, url, Some(json!({"objectId": user.id()})))
      .await?;

    self.session_token = None;
    user.clear();
    self.sessions.clear()
  }

  /// User persisted by the last login, if any
  pub fn current_user(&self) -> Option<User> {
    let bytes = match self.sessions.load() {
      Ok(bytes) if !bytes.is_empty() => bytes,
      Ok(_) => return None,
      Err(e) => {
        debug!(error = %e, "no session available");
        return None;
      }
    };

    match serde_json::from_slice::<Map<String, Value>>(&bytes) {
      Ok(data) => Some(User::from_data(data)),
      Err(e) => {
        debug!(error = %e, "discarding unreadable session");
        None
      }
    }
  }

  /// Restore the session token of the persisted user
  pub fn resume_session(&mut self) -> Option<User> {
    let user = self.current_user()?;
    if let Some(token) = user.session_token() {
      self.session_token = Some(token);
    }
    Some(user)
  }

  // ==================== Functions & raw calls ====================

  /// Invoke a cloud function
  #[instrument(skip(self, data))]
  pub async fn func(&self, name: &str, data: Value) -> Result<Map<String, Value>> {
    let url = self.config.url(&format!("functions/{}", name));
    self.send(Method::Post, url, Some(data)).await
  }

  /// Call an API path relative to the base URL, e.g. `files/fetch`.
  /// The body is dropped for GET and DELETE.
  #[instrument(skip(self, data))]
  pub async fn call(
    &self,
    path: &str,
    method: &str,
    data: Option<Value>,
  ) -> Result<Map<String, Value>> {
    let method = Method::try_from(method)
      .map_err(|_| Error::Config(format!("unsupported method `{}`", method)))?;
    let body = match method {
      Method::Get | Method::Delete => None,
      Method::Post | Method::Put => data,
    };
    self.send(method, self.config.url(path), body).await
  }

  // ==================== WeChat ====================

  fn weixin_url(&self, path: &str) -> Result<String> {
    if self.config.weixin.is_none() {
      return Err(Error::Config("weixin binding is not configured".to_string()));
    }
    Ok(self.config.url(&format!("weixin/{}", path.trim_start_matches('/'))))
  }

  #[instrument(skip(self))]
  pub async fn weixin_get(&self, path: &str) -> Result<Map<String, Value>> {
    let url = self.weixin_url(path)?;
    self.send(Method::Get, url, None).await
  }

  #[instrument(skip(self, data))]
  pub async fn weixin_post(&self, path: &str, data: Value) -> Result<Map<String, Value>> {
    let url = self.weixin_url(path)?;
    self.send(Method::Post, url, Some(data)).await
  }

  #[instrument(skip(self, data))]
  pub async fn weixin_put(&self, path: &str, data: Value) -> Result<Map<String, Value>> {
    let url = self.weixin_url(path)?;
    self.send(Method::Put, url, Some(data)).await
  }

  #[instrument(skip(self))]
  pub async fn weixin_delete(&self, path: &str) -> Result<Map<String, Value>> {
    let url = self.weixin_url(path)?;
    self.send(Method::Delete, url, None).await
  }
}
