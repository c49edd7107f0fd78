//! Blocking `Transport` implementation on ureq.
//!
//! Owns the base URL, the API key header and the timeout, and decides how
//! path segments reach the wire through `PathEncoding`.

use std::time::Duration;

use serde::Deserialize;
use ureq::Agent;

use crate::error::{ConfigError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, PathEncoding, Transport};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Default cap on a response body, in bytes.
const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Header Redmine reads the REST API key from.
const API_KEY_HEADER: &str = "X-Redmine-API-Key";

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

/// Connection settings for `UreqTransport`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Server root, e.g. `https://redmine.example.com`.
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub path_encoding: PathEncoding,
    /// Responses larger than this fail with `TransportError::Body`.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl TransportConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT,
            path_encoding: PathEncoding::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Reads `REDMINE_URL`, `REDMINE_API_KEY`, `REDMINE_TIMEOUT_SECS` and
    /// `REDMINE_PATH_ENCODING` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("REDMINE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("REDMINE_URL"))?;
        let mut config = Self::new(&base_url);
        config.api_key = lookup("REDMINE_API_KEY").filter(|key| !key.is_empty());

        if let Some(value) = lookup("REDMINE_TIMEOUT_SECS") {
            config.timeout_secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    key: "REDMINE_TIMEOUT_SECS",
                    value,
                })?;
        }
        if let Some(value) = lookup("REDMINE_PATH_ENCODING") {
            config.path_encoding = match value.as_str() {
                "verbatim" => PathEncoding::Verbatim,
                "percent" | "percent-encode" => PathEncoding::PercentEncode,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "REDMINE_PATH_ENCODING",
                        value,
                    })
                }
            };
        }
        Ok(config)
    }
}

/// Executes requests with a shared ureq agent.
///
/// Status codes never become errors here: ureq's status-as-error behavior is
/// switched off so 4xx/5xx answers reach the parsers as data.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    base_url: String,
    api_key: Option<String>,
    path_encoding: PathEncoding,
    max_body_bytes: u64,
}

impl UreqTransport {
    pub fn new(config: TransportConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            path_encoding: config.path_encoding,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Absolute URL for `request` under this transport's base URL.
    pub fn url_for(&self, request: &HttpRequest) -> String {
        format!("{}{}", self.base_url, request.target(self.path_encoding))
    }

    fn headers<'a>(&'a self, request: &'a HttpRequest) -> impl Iterator<Item = (&'a str, &'a str)> {
        let auth = self.api_key.as_deref().map(|key| (API_KEY_HEADER, key));
        request
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .chain(std::iter::once(("accept", "application/json")))
            .chain(auth)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(request);

        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&url), self.headers(request)).call(),
            HttpMethod::Delete => {
                with_headers(self.agent.delete(&url), self.headers(request)).call()
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(&url), self.headers(request));
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|source| TransportError::Body { status, source })?;
        // Invalid UTF-8 is left for the JSON decoder to reject with the status.
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<'a, B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: impl Iterator<Item = (&'a str, &'a str)>,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder
}
