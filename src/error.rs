//! Error types for the Skynology client SDK.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  /// The server answered with a non-2xx status.
  #[error("API error ({code}): {message}")]
  Api {
    code: i64,
    message: String,
    description: Option<String>,
  },

  /// The server could not be reached or the exchange failed mid-flight.
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Decode error: {0}")]
  Decode(String),

  #[error("Invalid ACL format: {0}")]
  InvalidAcl(String),

  #[error("Object has no id")]
  MissingObjectId,

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Session error: {0}")]
  Session(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Whether the server reported the target as missing.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Api { code, .. } if *code == 404 || *code == 101)
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Api { code, .. } if *code == 401 || *code == 403)
  }

  /// Code carried by an API error, if any.
  pub fn code(&self) -> Option<i64> {
    match self {
      Self::Api { code, .. } => Some(*code),
      _ => None,
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Decode(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
