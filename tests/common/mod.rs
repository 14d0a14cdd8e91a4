//! Shared test fixtures: a transport that records requests and replays
//! queued responses.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use skynology::{Config, Error, MemorySessionStore, Request, Result, Skynology, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://api.test/1.0";

#[derive(Default)]
pub struct MockTransport {
  requests: Mutex<Vec<Request>>,
  responses: Mutex<VecDeque<Result<Map<String, Value>>>>,
}

impl MockTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Queue a successful response; `value` must be a JSON object.
  pub fn respond(&self, value: Value) {
    let Value::Object(map) = value else {
      panic!("mock responses must be objects");
    };
    self.responses.lock().unwrap().push_back(Ok(map));
  }

  pub fn fail(&self, code: i64, message: &str) {
    self.responses.lock().unwrap().push_back(Err(Error::Api {
      code,
      message: message.to_string(),
      description: None,
    }));
  }

  pub fn requests(&self) -> Vec<Request> {
    self.requests.lock().unwrap().clone()
  }

  pub fn last_request(&self) -> Request {
    self
      .requests
      .lock()
      .unwrap()
      .last()
      .cloned()
      .expect("no request was sent")
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn send(&self, request: Request) -> Result<Map<String, Value>> {
    self.requests.lock().unwrap().push(request);
    self
      .responses
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Ok(Map::new()))
  }
}

pub fn config() -> Config {
  Config::new("app", "key").with_base_url(BASE_URL)
}

pub fn client() -> (Skynology, Arc<MockTransport>, Arc<MemorySessionStore>) {
  let transport = MockTransport::new();
  let sessions = Arc::new(MemorySessionStore::new());
  let client = Skynology::with_parts(config(), transport.clone(), sessions.clone());
  (client, transport, sessions)
}

pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
  request
    .headers
    .iter()
    .find(|(n, _)| n == name)
    .map(|(_, v)| v.as_str())
}
