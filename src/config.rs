//! Client configuration

use crate::error::{Error, Result};
use crate::protocol::{DEFAULT_BASE_URL, SDK_VERSION};
use std::path::PathBuf;
use std::time::Duration;

/// WeChat account binding created in the console
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeixinParams {
    /// Binding id generated by the platform
    pub id: String,
    /// Account type, e.g. `mp` or `corp`
    pub kind: String,
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// API endpoint, without trailing slash
    pub base_url: String,
    pub application_id: String,
    pub application_key: String,
    /// Signs requests with full privileges when set
    pub master_key: Option<String>,
    /// Directory holding the file session store
    pub data_dir: PathBuf,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    pub weixin: Option<WeixinParams>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            application_id: String::new(),
            application_key: String::new(),
            master_key: None,
            data_dir: PathBuf::from("./"),
            timeout: Duration::from_secs(30),
            user_agent: format!(
                "Skynology-Rust/{} ({};{};)",
                SDK_VERSION,
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            weixin: None,
        }
    }
}

impl Config {
    /// Create a config for an application id and key
    pub fn new(application_id: impl Into<String>, application_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            application_key: application_key.into(),
            ..Default::default()
        }
    }

    /// Create a config signing with the master key
    pub fn with_master_key(application_id: impl Into<String>, master_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            master_key: Some(master_key.into()),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bind a WeChat account; required before calling the weixin endpoints
    pub fn with_weixin(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.weixin = Some(WeixinParams {
            id: id.into(),
            kind: kind.into(),
        });
        self
    }

    /// Check that requests can be signed
    pub fn validate(&self) -> Result<()> {
        let has_key = !self.application_key.is_empty()
            || self.master_key.as_deref().is_some_and(|k| !k.is_empty());
        if self.application_id.is_empty() || !has_key {
            return Err(Error::Config(
                "application id and application key (or master key) are required".to_string(),
            ));
        }
        Ok(())
    }

    /// Build an absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
