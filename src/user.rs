//! Users: objects in the `_User` resource with credentials and profile fields.

use crate::client::Skynology;
use crate::coerce;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::protocol::Method;
use serde_json::{json, Map, Value};
use tracing::instrument;

pub const USER_RESOURCE: &str = "_User";

/// Endpoint for sign-up and password changes; other writes go through
/// `resources/_User` like any object
pub const USERS_PATH: &str = "users";

/// Key under which login responses carry the session token
pub const SESSION_TOKEN_KEY: &str = "sessionToken";

/// An authenticated identity on top of an [`Object`]
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    object: Object,
    user_name: String,
    /// Only kept client-side; the server never returns it
    password: String,
    email: String,
    phone: String,
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

impl User {
    pub fn new() -> Self {
        Self {
            object: Object::new(USER_RESOURCE),
            user_name: String::new(),
            password: String::new(),
            email: String::new(),
            phone: String::new(),
        }
    }

    pub fn with_id(object_id: impl Into<String>) -> Self {
        let mut user = Self::new();
        user.object.set_id(object_id.into());
        user
    }

    pub fn from_data(data: Map<String, Value>) -> Self {
        let mut user = Self::new();
        user.hydrate(data);
        user
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut Object {
        &mut self.object
    }

    pub fn into_object(self) -> Object {
        self.object
    }

    pub fn id(&self) -> &str {
        self.object.id()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Session token returned by the last login, if any
    pub fn session_token(&self) -> Option<String> {
        Some(self.object.get_string(SESSION_TOKEN_KEY)).filter(|t| !t.is_empty())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.object.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.object.set(field, value);
        self
    }

    pub fn set_user_name(&mut self, user_name: impl Into<String>) -> &mut Self {
        self.user_name = user_name.into();
        self.object.set("username", self.user_name.clone());
        self
    }

    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.password = password.into();
        self.object.set("password", self.password.clone());
        self
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = email.into();
        self.object.set("email", self.email.clone());
        self
    }

    pub fn set_phone(&mut self, phone: impl Into<String>) -> &mut Self {
        self.phone = phone.into();
        self.object.set("phone", self.phone.clone());
        self
    }

    /// Sign up with the pending changes. Always a create, even when an id
    /// is already set.
    #[instrument(skip(self, client))]
    pub async fn register(&mut self, client: &Skynology) -> Result<()> {
        let url = client.config().url(USERS_PATH);
        let body = Value::Object(self.object.changes().clone());
        let data = client.send(Method::Post, url, Some(body)).await?;
        self.hydrate(data);
        Ok(())
    }

    /// Save pending changes to the `_User` resource
    pub async fn save(&mut self, client: &Skynology) -> Result<()> {
        self.object.save(client).await?;
        self.read_profile();
        Ok(())
    }

    /// Delete the account and reset the user locally
    pub async fn delete(&mut self, client: &Skynology) -> Result<()> {
        self.object.delete(client).await?;
        self.clear();
        Ok(())
    }

    pub async fn fetch(&mut self, client: &Skynology) -> Result<()> {
        self.object.fetch(client).await?;
        self.read_profile();
        Ok(())
    }

    /// Change the password of a logged-in user
    #[instrument(skip(self, client, old_password, new_password), fields(id = %self.id()))]
    pub async fn reset_password(
        &self,
        client: &Skynology,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if self.object.is_new() {
            return Err(Error::MissingObjectId);
        }
        let url = client
            .config()
            .url(&format!("{}/{}/resetPassword", USERS_PATH, self.id()));
        let body = json!({
            "old_password": old_password,
            "new_password": new_password,
        });
        client.send(Method::Post, url, Some(body)).await?;
        Ok(())
    }

    pub(crate) fn hydrate(&mut self, data: Map<String, Value>) {
        self.object.hydrate(data);
        self.read_profile();
    }

    /// Copy profile fields out of the fetched state; absent keys keep their value.
    fn read_profile(&mut self) {
        let data = self.object.data();
        if data.contains_key("username") {
            self.user_name = coerce::to_string(data.get("username"));
        }
        if data.contains_key("email") {
            self.email = coerce::to_string(data.get("email"));
        }
        if data.contains_key("phone") {
            self.phone = coerce::to_string(data.get("phone"));
        }
    }

    pub(crate) fn clear(&mut self) {
        self.object.clear();
        self.user_name.clear();
        self.password.clear();
        self.email.clear();
        self.phone.clear();
    }
}
