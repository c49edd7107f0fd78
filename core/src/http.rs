//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The wiki layer builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network; a `Transport` implementation performs the actual exchange.
//!
//! A request carries its path as separate segments. The binding layer never
//! escapes them; how they are joined onto the wire is a transport decision
//! expressed by `PathEncoding`.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;

use crate::error::TransportError;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query key or value. `,` stays literal so
/// joined include lists read as `include=a,b`.
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How path segments are joined into the request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathEncoding {
    /// Segments are concatenated untouched. Callers must pass URL-safe
    /// project identifiers and titles.
    #[default]
    Verbatim,
    /// Each segment is percent-encoded before joining.
    #[serde(rename = "percent", alias = "percent-encode")]
    PercentEncode,
}

/// An HTTP request described as plain data.
///
/// Built by the `wiki::build_*` functions and executed by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Path segments relative to the server root, without separators.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// The request path with segments joined verbatim, e.g.
    /// `/projects/foo/wiki/Home.json`.
    pub fn path(&self) -> String {
        self.encoded_path(PathEncoding::Verbatim)
    }

    pub fn encoded_path(&self, encoding: PathEncoding) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match encoding {
                PathEncoding::Verbatim => path.push_str(segment),
                PathEncoding::PercentEncode => {
                    path.extend(utf8_percent_encode(segment, SEGMENT));
                }
            }
        }
        path
    }

    /// The encoded query string without the leading `?`, or `None` when the
    /// request has no query parameters.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .query
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, QUERY),
                    utf8_percent_encode(value, QUERY)
                )
            })
            .collect();
        Some(pairs.join("&"))
    }

    /// Path plus query string, ready to append to a base URL.
    pub fn target(&self, encoding: PathEncoding) -> String {
        let path = self.encoded_path(encoding);
        match self.query_string() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        }
    }
}

/// An HTTP response described as plain data.
///
/// Returned by a `Transport`, then handed to the `wiki::parse_*` functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Performs HTTP exchanges on behalf of the client.
///
/// Implementations own everything about the wire: base URL, authentication,
/// timeouts and path encoding. A non-2xx status is a response, not an error;
/// `Err` is reserved for exchanges that produced no response at all.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}
