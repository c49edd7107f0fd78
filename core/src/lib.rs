//! Synchronous client for Redmine's wiki pages REST API.
//!
//! # Overview
//! `wiki` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `Client` wires those
//! functions to an injected `Transport`; `UreqTransport` is the blocking
//! implementation used outside tests.
//!
//! # Design
//! - Every operation returns an `ApiResponse` carrying the received status
//!   and the outcome side by side. A status other than the documented one is
//!   reported, never converted into an error.
//! - Project identifiers and titles are path segments used verbatim; the
//!   transport's `PathEncoding` decides whether they are escaped.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;
pub mod types;
pub mod wiki;

pub use client::Client;
pub use error::{ApiError, ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, PathEncoding, Transport};
pub use response::ApiResponse;
pub use transport::{TransportConfig, UreqTransport};
pub use types::{
    Attachment, AttachmentUpload, CreatePage, GetPageOptions, IdName, Include, Page,
    PageSummary, ParentRef, UpdatePage,
};
