//! Request transport.
//!
//! The SDK builds requests and interprets JSON results; moving bytes,
//! signing and status handling live behind [`Transport`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::{
  ApiErrorBody, Method, APPLICATION_ID_HEADER, CLIENT_VERSION_HEADER, REQUEST_SIGN_HEADER,
  SDK_VERSION, WEIXIN_ID_HEADER, WEIXIN_TYPE_HEADER,
};
use async_trait::async_trait;
use chrono::Utc;
use md5::{Digest, Md5};
use reqwest::{header, Client};
use serde_json::{Map, Value};
use tracing::debug;

/// A single API call
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method: Method,
  pub url: String,
  pub body: Option<Value>,
  pub headers: Vec<(String, String)>,
}

impl Request {
  pub fn new(method: Method, url: impl Into<String>) -> Self {
    Self {
      method,
      url: url.into(),
      body: None,
      headers: Vec::new(),
    }
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }
}

/// Sends a request and returns the decoded JSON object of a successful response.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: Request) -> Result<Map<String, Value>>;
}

/// Build the request signature: `<ts>,<md5(ts + key)>[,master]`.
pub fn request_sign(config: &Config, timestamp: u64) -> Result<String> {
  config.validate()?;

  let (key, master) = match config.master_key.as_deref() {
    Some(master_key) if !master_key.is_empty() => (master_key, true),
    _ => (config.application_key.as_str(), false),
  };

  let mut hasher = Md5::new();
  hasher.update(format!("{}{}", timestamp, key).as_bytes());
  let digest = hex::encode(hasher.finalize());

  let mut sign = format!("{},{}", timestamp, digest);
  if master {
    sign.push_str(",master");
  }
  Ok(sign)
}

/// reqwest-backed transport talking to the Skynology REST API
pub struct HttpTransport {
  config: Config,
  http: Client,
}

impl HttpTransport {
  pub fn new(config: Config) -> Result<Self> {
    config.validate()?;

    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header_value(&config.user_agent)?);
    headers.insert(
      header::CONTENT_TYPE,
      header::HeaderValue::from_static("application/json"),
    );

    let http = Client::builder()
      .timeout(config.timeout)
      .default_headers(headers)
      .build()?;

    Ok(Self { config, http })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  fn now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, request: Request) -> Result<Map<String, Value>> {
    let sign = request_sign(&self.config, Self::now())?;

    let mut req = match request.method {
      Method::Get => self.http.get(&request.url),
      Method::Post => self.http.post(&request.url),
      Method::Put => self.http.put(&request.url),
      Method::Delete => self.http.delete(&request.url),
    };

    req = req
      .header(CLIENT_VERSION_HEADER, format!("rust-{}", SDK_VERSION))
      .header(APPLICATION_ID_HEADER, &self.config.application_id)
      .header(REQUEST_SIGN_HEADER, sign);

    if let Some(weixin) = &self.config.weixin {
      if !weixin.id.is_empty() {
        req = req.header(WEIXIN_ID_HEADER, &weixin.id);
      }
      if !weixin.kind.is_empty() {
        req = req.header(WEIXIN_TYPE_HEADER, &weixin.kind);
      }
    }

    for (name, value) in &request.headers {
      req = req.header(name.as_str(), value.as_str());
    }

    if let Some(body) = &request.body {
      req = req.body(serde_json::to_vec(body)?);
    }

    debug!("Sending {} request to {}", request.method, request.url);
    let response = req.send().await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
      return Err(api_error(status.as_u16(), &text));
    }

    decode_object(&text)
  }
}

fn header_value(value: &str) -> Result<header::HeaderValue> {
  header::HeaderValue::from_str(value)
    .map_err(|e| Error::Config(format!("invalid header value `{}`: {}", value, e)))
}

/// Parse a successful response body. An empty body counts as an empty object.
fn decode_object(text: &str) -> Result<Map<String, Value>> {
  if text.trim().is_empty() {
    return Ok(Map::new());
  }
  match serde_json::from_str::<Value>(text)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::Decode(format!("expected a JSON object, got {}", other))),
  }
}

fn api_error(status: u16, text: &str) -> Error {
  match serde_json::from_str::<ApiErrorBody>(text) {
    Ok(body) => Error::Api {
      code: if body.code == 0 { i64::from(status) } else { body.code },
      message: body.message().to_string(),
      description: body.description.clone(),
    },
    Err(_) => Error::Api {
      code: i64::from(status),
      message: text.to_string(),
      description: None,
    },
  }
}
