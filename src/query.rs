//! Query builder for Skynology resources
//!
//! Accumulates filters, ordering, projection and paging, then renders them
//! into the query string understood by the resources endpoint:
//!
//! ```text
//! _=_&count=1&order=a,-b&select=a,b&skip=10&take=20&where=<url-encoded json>
//! ```

use crate::client::Skynology;
use crate::coerce;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::protocol::Method;
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::instrument;

/// Page size used when `take` is never called
pub const DEFAULT_TAKE: usize = 20;

/// Filter condition on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, f64),
    Gte(String, f64),
    Lt(String, f64),
    Lte(String, f64),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    All(String, Vec<Value>),
    Contains(String, String),
    StartsWith(String, String),
    EndsWith(String, String),
    Exists(String, bool),
}

impl Filter {
    /// Field the condition applies to
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _)
            | Filter::Ne(field, _)
            | Filter::Gt(field, _)
            | Filter::Gte(field, _)
            | Filter::Lt(field, _)
            | Filter::Lte(field, _)
            | Filter::In(field, _)
            | Filter::NotIn(field, _)
            | Filter::All(field, _)
            | Filter::Contains(field, _)
            | Filter::StartsWith(field, _)
            | Filter::EndsWith(field, _)
            | Filter::Exists(field, _) => field,
        }
    }

    /// Value stored under the field in the `where` mapping.
    ///
    /// Text matches become case-insensitive regexes over the escaped input.
    fn to_value(&self) -> Value {
        match self {
            Filter::Eq(_, value) => value.clone(),
            Filter::Ne(_, value) => json!({"$ne": value}),
            Filter::Gt(_, value) => json!({"$gt": value}),
            Filter::Gte(_, value) => json!({"$gte": value}),
            Filter::Lt(_, value) => json!({"$lt": value}),
            Filter::Lte(_, value) => json!({"$lte": value}),
            Filter::In(_, values) => json!({"$in": values}),
            Filter::NotIn(_, values) => json!({"$nin": values}),
            Filter::All(_, values) => json!({"$all": values}),
            Filter::Contains(_, value) => {
                json!({"$regex": format!("/{}/i", regex::escape(value))})
            }
            Filter::StartsWith(_, value) => {
                json!({"$regex": format!("/^{}/i", regex::escape(value))})
            }
            Filter::EndsWith(_, value) => {
                json!({"$regex": format!("/{}$/i", regex::escape(value))})
            }
            Filter::Exists(_, value) => json!({"$exists": value}),
        }
    }
}

/// Field expression builder for fluent filter construction
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn eq(self, value: impl Into<Value>) -> Filter {
        Filter::Eq(self.name, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> Filter {
        Filter::Ne(self.name, value.into())
    }

    pub fn gt(self, value: f64) -> Filter {
        Filter::Gt(self.name, value)
    }

    pub fn gte(self, value: f64) -> Filter {
        Filter::Gte(self.name, value)
    }

    pub fn lt(self, value: f64) -> Filter {
        Filter::Lt(self.name, value)
    }

    pub fn lte(self, value: f64) -> Filter {
        Filter::Lte(self.name, value)
    }

    pub fn is_in(self, values: Vec<Value>) -> Filter {
        Filter::In(self.name, values)
    }

    pub fn not_in(self, values: Vec<Value>) -> Filter {
        Filter::NotIn(self.name, values)
    }

    pub fn all(self, values: Vec<Value>) -> Filter {
        Filter::All(self.name, values)
    }

    /// Case-insensitive substring match. `value` is literal text, not a
    /// regex fragment.
    pub fn contains(self, value: impl Into<String>) -> Filter {
        Filter::Contains(self.name, value.into())
    }

    /// Case-insensitive prefix match on literal text
    pub fn starts_with(self, value: impl Into<String>) -> Filter {
        Filter::StartsWith(self.name, value.into())
    }

    /// Case-insensitive suffix match on literal text
    pub fn ends_with(self, value: impl Into<String>) -> Filter {
        Filter::EndsWith(self.name, value.into())
    }

    pub fn exists(self, value: bool) -> Filter {
        Filter::Exists(self.name, value)
    }
}

/// Create a field expression
pub fn field(name: impl Into<String>) -> Field {
    Field::new(name)
}

/// Objects returned by [`Query::find`]
#[derive(Debug, Clone, Default)]
pub struct FindResult {
    pub objects: Vec<Object>,
    /// Total number of matches; only filled when counting was requested
    pub count: i64,
}

/// Query builder for one resource
///
/// Each field holds at most one condition: a later condition on the same
/// field replaces the earlier one, so a range on one field cannot be
/// expressed.
///
/// # Example
/// ```
/// use skynology::query::{query, field};
///
/// let qs = query("Post")
///     .filter(field("views").gt(100.0))
///     .equal("published", true)
///     .order_by_descending("createdAt")
///     .take(10)
///     .query_string();
/// assert!(qs.starts_with("_=_&order=-createdAt&take=10&where="));
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    resource_name: String,
    conditions: Map<String, Value>,
    order: Vec<String>,
    fields: Vec<String>,
    skip_value: usize,
    take_value: usize,
    with_count: bool,
}

impl Query {
    /// Create a new query for a resource
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            conditions: Map::new(),
            order: Vec::new(),
            fields: Vec::new(),
            skip_value: 0,
            take_value: DEFAULT_TAKE,
            with_count: false,
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Set the condition for the filter's field, replacing any earlier one
    pub fn filter(mut self, filter: Filter) -> Self {
        let value = filter.to_value();
        self.conditions.insert(filter.field().to_string(), value);
        self
    }

    pub fn equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Field::new(field).eq(value))
    }

    pub fn not_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Field::new(field).ne(value))
    }

    pub fn less_than(self, field: &str, value: f64) -> Self {
        self.filter(Field::new(field).lt(value))
    }

    pub fn less_than_or_equal(self, field: &str, value: f64) -> Self {
        self.filter(Field::new(field).lte(value))
    }

    pub fn greater_than(self, field: &str, value: f64) -> Self {
        self.filter(Field::new(field).gt(value))
    }

    pub fn greater_than_or_equal(self, field: &str, value: f64) -> Self {
        self.filter(Field::new(field).gte(value))
    }

    /// Prefix match; regex metacharacters in `value` are escaped
    pub fn starts_with(self, field: &str, value: &str) -> Self {
        self.filter(Field::new(field).starts_with(value))
    }

    pub fn ends_with(self, field: &str, value: &str) -> Self {
        self.filter(Field::new(field).ends_with(value))
    }

    pub fn contains(self, field: &str, value: &str) -> Self {
        self.filter(Field::new(field).contains(value))
    }

    pub fn exists(self, field: &str, exists: bool) -> Self {
        self.filter(Field::new(field).exists(exists))
    }

    pub fn is_in(self, field: &str, values: Vec<Value>) -> Self {
        self.filter(Field::new(field).is_in(values))
    }

    pub fn not_in(self, field: &str, values: Vec<Value>) -> Self {
        self.filter(Field::new(field).not_in(values))
    }

    /// Match arrays holding every one of `values`
    pub fn match_all(self, field: &str, values: Vec<Value>) -> Self {
        self.filter(Field::new(field).all(values))
    }

    /// Sort ascending; repeated calls add secondary keys
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order.push(field.into());
        self
    }

    pub fn order_by_descending(mut self, field: impl Into<String>) -> Self {
        self.order.push(format!("-{}", field.into()));
        self
    }

    /// Restrict returned fields; additive across calls
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Skip results (offset)
    pub fn skip(mut self, n: usize) -> Self {
        self.skip_value = n;
        self
    }

    /// Limit number of results
    pub fn take(mut self, n: usize) -> Self {
        self.take_value = n;
        self
    }

    /// Ask the server for the total match count
    pub fn count(mut self, enabled: bool) -> Self {
        self.with_count = enabled;
        self
    }

    /// Conditions as they will be sent under `where`
    pub fn conditions(&self) -> &Map<String, Value> {
        &self.conditions
    }

    /// Render the query string
    pub fn query_string(&self) -> String {
        let mut search = String::from("_=_");

        if self.with_count {
            search.push_str("&count=1");
        }
        if !self.order.is_empty() {
            search.push_str(&format!("&order={}", self.order.join(",")));
        }
        if !self.fields.is_empty() {
            search.push_str(&format!("&select={}", self.fields.join(",")));
        }
        if self.skip_value > 0 {
            search.push_str(&format!("&skip={}", self.skip_value));
        }

        search.push_str(&format!("&take={}", self.take_value));

        let conditions = Value::Object(self.conditions.clone()).to_string();
        search.push_str(&format!("&where={}", urlencoding::encode(&conditions)));

        search
    }

    fn collection_url(&self, client: &Skynology) -> String {
        client
            .config()
            .url(&format!("resources/{}", self.resource_name))
    }

    /// Run the query
    #[instrument(skip(self, client), fields(resource = %self.resource_name))]
    pub async fn find(&self, client: &Skynology) -> Result<FindResult> {
        let url = format!("{}?{}", self.collection_url(client), self.query_string());
        let response = client.send(Method::Get, url, None).await?;

        let mut objects = Vec::new();
        if let Some(Value::Array(results)) = response.get("results") {
            objects.reserve(results.len());
            for item in results {
                match item {
                    Value::Object(data) => {
                        objects.push(Object::from_data(self.resource_name.clone(), data.clone()))
                    }
                    other => {
                        return Err(Error::Decode(format!(
                            "expected an object in results, got {}",
                            other
                        )))
                    }
                }
            }
        }

        Ok(FindResult {
            objects,
            count: coerce::to_int64(response.get("count")),
        })
    }

    /// Fetch one object by id, ignoring every filter
    #[instrument(skip(self, client), fields(resource = %self.resource_name))]
    pub async fn get_object(&self, client: &Skynology, object_id: &str) -> Result<Object> {
        let url = format!("{}/{}", self.collection_url(client), object_id);
        let data = client.send(Method::Get, url, None).await?;
        Ok(Object::from_data(self.resource_name.clone(), data))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query_string())
    }
}

/// Create a query builder for a resource
pub fn query(resource_name: impl Into<String>) -> Query {
    Query::new(resource_name)
}
