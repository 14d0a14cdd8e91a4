//! Wire-level constants and shapes for the Skynology REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// SDK version reported to the server
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://skynology.com/api/1.0";

pub const APPLICATION_ID_HEADER: &str = "X-SKY-Application-Id";
pub const REQUEST_SIGN_HEADER: &str = "X-SKY-Request-Sign";
pub const SESSION_TOKEN_HEADER: &str = "X-SKY-Session-Token";
pub const CLIENT_VERSION_HEADER: &str = "X-SKY-Client-Version";
pub const WEIXIN_ID_HEADER: &str = "X-SKY-Weixin-Id";
pub const WEIXIN_TYPE_HEADER: &str = "X-SKY-Weixin-Type";

/// Fields assigned by the server; never staged as pending changes.
pub const OBJECT_ID_KEY: &str = "objectId";
pub const CREATED_AT_KEY: &str = "createdAt";
pub const UPDATED_AT_KEY: &str = "updatedAt";
pub const ACL_KEY: &str = "ACL";

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Post => "POST",
      Self::Put => "PUT",
      Self::Delete => "DELETE",
    }
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl TryFrom<&str> for Method {
  type Error = ();

  /// Case-insensitive.
  fn try_from(s: &str) -> Result<Self, Self::Error> {
    match s.to_ascii_uppercase().as_str() {
      "GET" => Ok(Self::Get),
      "POST" => Ok(Self::Post),
      "PUT" => Ok(Self::Put),
      "DELETE" => Ok(Self::Delete),
      _ => Err(()),
    }
  }
}

/// Server-side mutation sent in place of a literal field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__op")]
pub enum Operation {
  Increment { amount: i64 },
  Add { objects: Vec<Value> },
  AddUnique { objects: Vec<Value> },
  Remove { objects: Vec<Value> },
  RemoveObject { query: Value },
}

impl From<Operation> for Value {
  fn from(op: Operation) -> Self {
    serde_json::to_value(op).unwrap_or_default()
  }
}

/// Error body returned with non-2xx responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub code: i64,
  #[serde(default)]
  pub error: String,
  #[serde(default)]
  pub error_en: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl ApiErrorBody {
  /// Prefers the localized message, falling back to the English one.
  pub fn message(&self) -> &str {
    if self.error.is_empty() {
      &self.error_en
    } else {
      &self.error
    }
  }
}
