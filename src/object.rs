//! Change-tracked objects.
//!
//! An [`Object`] keeps two maps apart: the state last fetched from the
//! server, which every getter reads, and the pending changes staged by the
//! setters. [`Object::save`] sends only the pending changes and replaces the
//! fetched state with whatever the server returns.

use crate::acl::{self, AccessKind, Acl};
use crate::client::Skynology;
use crate::coerce;
use crate::error::{Error, Result};
use crate::protocol::{
    Method, Operation, ACL_KEY, CREATED_AT_KEY, OBJECT_ID_KEY, UPDATED_AT_KEY,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

/// Path suffix used when patching an element inside an array field
pub const ARRAY_PATCH_PATH: &str = "/array";

/// A single remote record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    resource_name: String,
    object_id: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    acl: Option<Acl>,
    data: Map<String, Value>,
    changes: Map<String, Value>,
    additional_path: Option<String>,
}

impl Object {
    /// New, never persisted object
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Default::default()
        }
    }

    /// Reference to an existing object by id
    pub fn with_id(resource_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        let mut obj = Self::new(resource_name);
        obj.set_id(object_id.into());
        obj
    }

    /// Object hydrated from decoded server data
    pub fn from_data(resource_name: impl Into<String>, data: Map<String, Value>) -> Self {
        let mut obj = Self::new(resource_name);
        obj.hydrate(data);
        obj
    }

    pub(crate) fn set_id(&mut self, object_id: String) {
        self.object_id = object_id;
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Server-assigned id; empty until the first successful save
    pub fn id(&self) -> &str {
        &self.object_id
    }

    pub fn is_new(&self) -> bool {
        self.object_id.is_empty()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// ACL as last fetched
    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    /// Fetched state, without pending changes
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Changes staged for the next save
    pub fn changes(&self) -> &Map<String, Value> {
        &self.changes
    }

    // ==================== Getters ====================

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn get_int(&self, field: &str) -> i32 {
        coerce::to_int(self.get(field))
    }

    pub fn get_int64(&self, field: &str) -> i64 {
        coerce::to_int64(self.get(field))
    }

    pub fn get_float(&self, field: &str) -> f64 {
        coerce::to_float(self.get(field))
    }

    pub fn get_string(&self, field: &str) -> String {
        coerce::to_string(self.get(field))
    }

    pub fn get_bool(&self, field: &str) -> bool {
        coerce::to_bool(self.get(field))
    }

    /// Array field, empty when absent or not an array
    pub fn get_array(&self, field: &str) -> &[Value] {
        self.get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_map(&self, field: &str) -> Option<&Map<String, Value>> {
        self.get(field).and_then(Value::as_object)
    }

    /// RFC3339 timestamp field, with or without fractional seconds
    pub fn get_time(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(parse_time)
    }

    // ==================== Mutations ====================

    /// Stage a value for `field`. Server-assigned fields are ignored.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        if is_server_assigned(&field) {
            warn!(field = %field, "ignoring write to server-assigned field");
            return self;
        }
        self.changes.insert(field, value.into());
        self
    }

    pub fn set_many<K, V, I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (field, value) in values {
            self.set(field, value);
        }
        self
    }

    /// Increment a numeric field by one on the server
    pub fn increment(&mut self, field: impl Into<String>) -> &mut Self {
        self.increment_by(field, 1)
    }

    pub fn increment_by(&mut self, field: impl Into<String>, amount: i64) -> &mut Self {
        self.set(field, Operation::Increment { amount })
    }

    /// Append a value to an array field
    pub fn add_to_array(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.add_all_to_array(field, vec![value.into()])
    }

    /// Append a value unless the array already holds it
    pub fn add_unique_to_array(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_all_unique_to_array(field, vec![value.into()])
    }

    pub fn remove_from_array(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.remove_all_from_array(field, vec![value.into()])
    }

    pub fn add_all_to_array(&mut self, field: impl Into<String>, objects: Vec<Value>) -> &mut Self {
        self.set(field, Operation::Add { objects })
    }

    pub fn add_all_unique_to_array(
        &mut self,
        field: impl Into<String>,
        objects: Vec<Value>,
    ) -> &mut Self {
        self.set(field, Operation::AddUnique { objects })
    }

    pub fn remove_all_from_array(
        &mut self,
        field: impl Into<String>,
        objects: Vec<Value>,
    ) -> &mut Self {
        self.set(field, Operation::Remove { objects })
    }

    /// Remove the array elements matching `query`
    pub fn remove_object_from_array(
        &mut self,
        field: impl Into<String>,
        query: impl Into<Value>,
    ) -> &mut Self {
        self.set(field, Operation::RemoveObject { query: query.into() })
    }

    /// Patch the array element matching `query` with `data`.
    ///
    /// Drops every other pending change: the next save only carries
    /// `{query, data}` and targets the array patch endpoint.
    pub fn update_object_in_array(
        &mut self,
        query: impl Into<Value>,
        data: impl Into<Value>,
    ) -> &mut Self {
        self.changes.clear();
        self.changes.insert("query".to_string(), query.into());
        self.changes.insert("data".to_string(), data.into());
        self.additional_path = Some(ARRAY_PATCH_PATH.to_string());
        self
    }

    // ==================== Access control ====================

    /// Stage a whole ACL, replacing any staged entries
    pub fn set_acl(&mut self, acl: &Acl) -> &mut Self {
        self.changes.insert(ACL_KEY.to_string(), acl.to_value());
        self
    }

    pub fn set_read_access(&mut self, user_id: &str, allowed: bool) -> &mut Self {
        self.stage_access(user_id.to_string(), AccessKind::Read, allowed)
    }

    pub fn set_write_access(&mut self, user_id: &str, allowed: bool) -> &mut Self {
        self.stage_access(user_id.to_string(), AccessKind::Write, allowed)
    }

    pub fn set_read_write_access(&mut self, user_id: &str, read: bool, write: bool) -> &mut Self {
        self.set_read_access(user_id, read)
            .set_write_access(user_id, write)
    }

    pub fn set_role_read_access(&mut self, role_name: &str, allowed: bool) -> &mut Self {
        self.stage_access(acl::role(role_name), AccessKind::Read, allowed)
    }

    pub fn set_role_write_access(&mut self, role_name: &str, allowed: bool) -> &mut Self {
        self.stage_access(acl::role(role_name), AccessKind::Write, allowed)
    }

    pub fn set_role_read_write_access(
        &mut self,
        role_name: &str,
        read: bool,
        write: bool,
    ) -> &mut Self {
        self.set_role_read_access(role_name, read)
            .set_role_write_access(role_name, write)
    }

    fn stage_access(&mut self, principal: String, kind: AccessKind, allowed: bool) -> &mut Self {
        let mut staged = self
            .changes
            .get(ACL_KEY)
            .and_then(|raw| Acl::from_value(raw).ok())
            .unwrap_or_default();
        staged.grant(principal, kind, allowed);
        self.changes.insert(ACL_KEY.to_string(), staged.to_value());
        self
    }

    /// Whether the fetched ACL grants `kind` to `user_id` directly or
    /// through one of `roles`.
    pub fn check_acl<S: AsRef<str>>(&self, user_id: &str, roles: &[S], kind: AccessKind) -> bool {
        let Some(acl) = &self.acl else {
            return false;
        };
        acl.allows(user_id, kind)
            || roles
                .iter()
                .any(|r| acl.allows(&acl::role(r.as_ref()), kind))
    }

    // ==================== Lifecycle ====================

    /// Collection URL, without id
    pub fn collection_url(&self, client: &Skynology) -> String {
        client
            .config()
            .url(&format!("resources/{}", self.resource_name))
    }

    fn object_url(&self, client: &Skynology) -> String {
        format!("{}/{}", self.collection_url(client), self.object_id)
    }

    /// Target of the next save
    pub fn save_url(&self, client: &Skynology) -> String {
        let mut url = if self.is_new() {
            self.collection_url(client)
        } else {
            self.object_url(client)
        };
        if let Some(suffix) = &self.additional_path {
            url.push_str(suffix);
        }
        url
    }

    /// Create or update the object with the pending changes.
    ///
    /// On failure the pending changes are kept so the save can be retried.
    #[instrument(skip(self, client), fields(resource = %self.resource_name, id = %self.object_id))]
    pub async fn save(&mut self, client: &Skynology) -> Result<()> {
        let method = if self.is_new() { Method::Post } else { Method::Put };
        let url = self.save_url(client);
        let body = Value::Object(self.changes.clone());

        let data = client.send(method, url, Some(body)).await?;

        self.hydrate(data);
        self.additional_path = None;
        Ok(())
    }

    /// Delete the object on the server and reset it locally
    #[instrument(skip(self, client), fields(resource = %self.resource_name, id = %self.object_id))]
    pub async fn delete(&mut self, client: &Skynology) -> Result<()> {
        if self.is_new() {
            return Err(Error::MissingObjectId);
        }
        client.send(Method::Delete, self.object_url(client), None).await?;
        self.clear();
        Ok(())
    }

    /// Reload the fetched state from the server, dropping pending changes
    #[instrument(skip(self, client), fields(resource = %self.resource_name, id = %self.object_id))]
    pub async fn fetch(&mut self, client: &Skynology) -> Result<()> {
        if self.is_new() {
            return Err(Error::MissingObjectId);
        }
        let data = client.send(Method::Get, self.object_url(client), None).await?;
        self.hydrate(data);
        Ok(())
    }

    /// Replace the fetched state with server data and drop pending changes.
    /// A missing id or timestamp keeps its previous value; the ACL always
    /// follows `data`.
    pub(crate) fn hydrate(&mut self, data: Map<String, Value>) {
        let id = coerce::to_string(data.get(OBJECT_ID_KEY));
        if !id.is_empty() {
            self.object_id = id;
        }

        self.acl = data.get(ACL_KEY).and_then(|raw| match Acl::from_value(raw) {
            Ok(acl) => Some(acl),
            Err(e) => {
                warn!(error = %e, "ignoring malformed ACL in server data");
                None
            }
        });

        if let Some(t) = data.get(CREATED_AT_KEY).and_then(parse_time) {
            self.created_at = Some(t);
        }
        if let Some(t) = data.get(UPDATED_AT_KEY).and_then(parse_time) {
            self.updated_at = Some(t);
        }

        self.data = data;
        self.changes = Map::new();
    }

    pub(crate) fn clear(&mut self) {
        self.object_id.clear();
        self.created_at = None;
        self.updated_at = None;
        self.acl = None;
        self.data = Map::new();
        self.changes = Map::new();
        self.additional_path = None;
    }
}

fn is_server_assigned(field: &str) -> bool {
    matches!(field, OBJECT_ID_KEY | CREATED_AT_KEY | UPDATED_AT_KEY)
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
