//! Wiki page DTOs.
//!
//! # Design
//! These types mirror Redmine's wiki JSON schema and are defined
//! independently from the mock server's types; integration tests catch schema
//! drift between the two crates. Timestamps stay opaque strings.

use serde::{Deserialize, Serialize};

/// Reference to a parent page, by title only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentRef {
    pub title: String,
}

/// An `{id, name}` pair as Redmine uses for users and other named records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdName {
    pub id: u64,
    pub name: String,
}

/// One entry of a project's wiki index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    pub version: u32,
    pub created_on: String,
    pub updated_on: String,
}

/// A single wiki page at a given version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    pub text: String,
    pub version: u32,
    #[serde(default)]
    pub author: IdName,
    #[serde(default)]
    pub comments: String,
    pub created_on: String,
    pub updated_on: String,
    /// Present only when the request asked for `Include::Attachments`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

/// A file attached to a wiki page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    pub filesize: u64,
    pub content_type: String,
    pub description: String,
    pub content_url: String,
    pub author: IdName,
    pub created_on: String,
}

/// A previously uploaded file to attach to a page on create or update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttachmentUpload {
    /// Token returned by Redmine's upload endpoint.
    pub token: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request payload for creating (or overwriting) a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Title of the page to nest this one under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<AttachmentUpload>,
}

/// Request payload for updating a page.
///
/// `version` enables optimistic concurrency: the server rejects the update
/// when the page has moved past it. Leave it `None` to update the latest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatePage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// New parent title; an empty string detaches the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<AttachmentUpload>,
}

/// Related data a get request may ask the server to embed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Include {
    Attachments,
    /// Sent as-is; the server decides whether it means anything.
    Other(String),
}

impl Include {
    pub fn as_str(&self) -> &str {
        match self {
            Include::Attachments => "attachments",
            Include::Other(value) => value,
        }
    }
}

impl From<&str> for Include {
    fn from(value: &str) -> Self {
        match value {
            "attachments" => Include::Attachments,
            other => Include::Other(other.to_string()),
        }
    }
}

/// Options for fetching a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetPageOptions {
    pub includes: Vec<Include>,
}

impl GetPageOptions {
    pub fn with_include(mut self, include: impl Into<Include>) -> Self {
        self.includes.push(include.into());
        self
    }
}

impl From<Include> for GetPageOptions {
    fn from(include: Include) -> Self {
        Self {
            includes: vec![include],
        }
    }
}

// Wire envelopes.

#[derive(Debug, Deserialize)]
pub(crate) struct PagesEnvelope {
    pub wiki_pages: Vec<PageSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageEnvelope {
    pub wiki_page: Page,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteEnvelope<'a, T> {
    pub wiki_page: &'a T,
}

/// Redmine's validation failure body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorsEnvelope {
    pub errors: Vec<String>,
}
