//! Access control lists attached to objects.
//!
//! On the wire an ACL is a mapping from principal to permission pair:
//!
//! ```json
//! { "5f1c...": { "read": true, "write": false }, "role:admin": { "read": true, "write": true } }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix that turns a role name into a principal key.
pub const ROLE_PREFIX: &str = "role:";

/// Principal key for a role.
pub fn role(name: &str) -> String {
    format!("{}{}", ROLE_PREFIX, name)
}

/// Kind of access being granted or checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

impl FromStr for AccessKind {
    type Err = Error;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("read") {
            Ok(AccessKind::Read)
        } else if s.eq_ignore_ascii_case("write") {
            Ok(AccessKind::Write)
        } else {
            Err(Error::InvalidAcl(format!("unknown access kind `{}`", s)))
        }
    }
}

/// Read/write pair for one principal. Missing keys default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Permission {
    pub read: bool,
    pub write: bool,
}

impl Permission {
    pub fn new(read: bool, write: bool) -> Self {
        Self { read, write }
    }

    pub fn allows(&self, kind: AccessKind) -> bool {
        match kind {
            AccessKind::Read => self.read,
            AccessKind::Write => self.write,
        }
    }

    fn grant(&mut self, kind: AccessKind, value: bool) {
        match kind {
            AccessKind::Read => self.read = value,
            AccessKind::Write => self.write = value,
        }
    }
}

/// Principal to permission mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl(BTreeMap<String, Permission>);

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode from the wire mapping.
    ///
    /// Fails as a whole if any entry is not an object holding only boolean
    /// `read`/`write` keys.
    pub fn from_value(raw: &Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(Error::InvalidAcl("expected an object".to_string()));
        }
        Acl::deserialize(raw).map_err(|e| Error::InvalidAcl(e.to_string()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn get(&self, principal: &str) -> Option<&Permission> {
        self.0.get(principal)
    }

    pub fn insert(&mut self, principal: impl Into<String>, permission: Permission) -> &mut Self {
        self.0.insert(principal.into(), permission);
        self
    }

    /// Set one kind of access for a principal, keeping the other kind as is.
    pub fn grant(&mut self, principal: impl Into<String>, kind: AccessKind, value: bool) -> &mut Self {
        self.0.entry(principal.into()).or_default().grant(kind, value);
        self
    }

    pub fn allows(&self, principal: &str, kind: AccessKind) -> bool {
        self.get(principal).is_some_and(|p| p.allows(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Permission)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
