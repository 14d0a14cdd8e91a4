//! Skynology Rust Client SDK
//!
//! A client for the Skynology backend-as-a-service platform: change-tracked
//! objects, a query builder, ACLs and user sessions over the REST API.
//!
//! # Example
//!
//! ```no_run
//! use skynology::{query, Config, Object, Skynology};
//!
//! #[tokio::main]
//! async fn main() -> skynology::Result<()> {
//!     let mut client = Skynology::new(Config::new("app-id", "app-key"))?;
//!
//!     // Log in; the session token rides along on later requests
//!     let user = client.login_with_user_name("bo", "secret").await?;
//!
//!     // Create an object readable by everyone, writable by its author
//!     let mut post = Object::new("Post");
//!     post.set("title", "Hello")
//!         .set_read_access("*", true)
//!         .set_read_write_access(user.id(), true, true);
//!     post.save(&client).await?;
//!
//!     // Bump a counter atomically on the server
//!     post.increment("views");
//!     post.save(&client).await?;
//!
//!     // Query
//!     let found = query("Post")
//!         .starts_with("title", "Hel")
//!         .order_by_descending("createdAt")
//!         .count(true)
//!         .find(&client)
//!         .await?;
//!     println!("{} posts, first page: {}", found.count, found.objects.len());
//!
//!     Ok(())
//! }
//! ```

pub mod acl;
mod client;
pub mod coerce;
mod config;
mod error;
pub mod object;
pub mod protocol;
pub mod query;
pub mod session;
pub mod transport;
pub mod user;

pub use acl::{AccessKind, Acl, Permission};
pub use client::Skynology;
pub use config::{Config, WeixinParams};
pub use error::{Error, Result};
pub use object::Object;
pub use protocol::{Method, Operation, DEFAULT_BASE_URL, SDK_VERSION};
pub use query::{field, query, Filter, FindResult, Query};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use transport::{HttpTransport, Request, Transport};
pub use user::User;
