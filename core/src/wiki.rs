//! Request builders and response parsers for the wiki pages endpoints.
//!
//! # Design
//! Each operation is split into a `build_*` function that produces an
//! `HttpRequest` and a `parse_*` function that consumes an `HttpResponse`.
//! Nothing here touches the network, so the whole contract is testable with
//! plain data. Project identifiers and titles are used as path segments
//! verbatim; escaping belongs to the transport's `PathEncoding`.
//!
//! See <https://www.redmine.org/projects/redmine/wiki/Rest_WikiPages>.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::ApiResponse;
use crate::types::{
    CreatePage, ErrorsEnvelope, GetPageOptions, Include, Page, PageEnvelope, PageSummary,
    PagesEnvelope, UpdatePage, WriteEnvelope,
};

pub const LIST_PAGES_STATUS: u16 = 200;
pub const GET_PAGE_STATUS: u16 = 200;
pub const CREATE_PAGE_STATUS: u16 = 201;
pub const UPDATE_PAGE_STATUS: u16 = 204;
pub const DELETE_PAGE_STATUS: u16 = 204;

/// `GET /projects/{project}/wiki/index.json`
pub fn build_list_pages(project: &str) -> HttpRequest {
    get(wiki_segments(project, ["index.json".to_string()]), Vec::new())
}

/// `GET /projects/{project}/wiki/{title}.json[?include=...]`
pub fn build_get_page(project: &str, title: &str, options: &GetPageOptions) -> HttpRequest {
    get(
        wiki_segments(project, [format!("{title}.json")]),
        include_query(&options.includes),
    )
}

/// `GET /projects/{project}/wiki/{title}/{version}.json[?include=...]`
pub fn build_get_page_version(
    project: &str,
    title: &str,
    version: u32,
    options: &GetPageOptions,
) -> HttpRequest {
    get(
        wiki_segments(project, [title.to_string(), format!("{version}.json")]),
        include_query(&options.includes),
    )
}

/// `PUT /projects/{project}/wiki/{title}.json` creating the page, or
/// overwriting it when the title already exists.
pub fn build_create_page(
    project: &str,
    title: &str,
    input: &CreatePage,
) -> Result<HttpRequest, ApiError> {
    put(project, title, input)
}

/// `PUT /projects/{project}/wiki/{title}.json` updating an existing page.
pub fn build_update_page(
    project: &str,
    title: &str,
    input: &UpdatePage,
) -> Result<HttpRequest, ApiError> {
    put(project, title, input)
}

/// `DELETE /projects/{project}/wiki/{title}.json`
pub fn build_delete_page(project: &str, title: &str) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Delete,
        segments: wiki_segments(project, [format!("{title}.json")]),
        query: Vec::new(),
        headers: Vec::new(),
        body: None,
    }
}

pub fn parse_list_pages(response: HttpResponse) -> ApiResponse<Vec<PageSummary>> {
    decode(response, LIST_PAGES_STATUS, |e: PagesEnvelope| e.wiki_pages)
}

/// Parses both the latest and the versioned get.
pub fn parse_get_page(response: HttpResponse) -> ApiResponse<Page> {
    decode(response, GET_PAGE_STATUS, |e: PageEnvelope| e.wiki_page)
}

pub fn parse_create_page(response: HttpResponse) -> ApiResponse<Page> {
    decode(response, CREATE_PAGE_STATUS, |e: PageEnvelope| e.wiki_page)
}

pub fn parse_update_page(response: HttpResponse) -> ApiResponse<()> {
    no_content(response, UPDATE_PAGE_STATUS)
}

pub fn parse_delete_page(response: HttpResponse) -> ApiResponse<()> {
    no_content(response, DELETE_PAGE_STATUS)
}

fn wiki_segments<const N: usize>(project: &str, tail: [String; N]) -> Vec<String> {
    let mut segments = vec!["projects".to_string(), project.to_string(), "wiki".to_string()];
    segments.extend(tail);
    segments
}

fn include_query(includes: &[Include]) -> Vec<(String, String)> {
    if includes.is_empty() {
        return Vec::new();
    }
    let joined = includes
        .iter()
        .map(Include::as_str)
        .collect::<Vec<_>>()
        .join(",");
    vec![("include".to_string(), joined)]
}

fn get(segments: Vec<String>, query: Vec<(String, String)>) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Get,
        segments,
        query,
        headers: Vec::new(),
        body: None,
    }
}

fn put<T: Serialize>(project: &str, title: &str, input: &T) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(&WriteEnvelope { wiki_page: input })
        .map_err(ApiError::Serialization)?;
    Ok(HttpRequest {
        method: HttpMethod::Put,
        segments: wiki_segments(project, [format!("{title}.json")]),
        query: Vec::new(),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

/// Decode the body when the status matches; otherwise hand the status back
/// untouched with any server-side validation messages.
fn decode<E, T>(response: HttpResponse, expected: u16, extract: impl FnOnce(E) -> T) -> ApiResponse<T>
where
    E: DeserializeOwned,
{
    if response.status != expected {
        return mismatch(response, expected);
    }
    let result = match serde_json::from_str::<E>(&response.body) {
        Ok(envelope) => Ok(Some(extract(envelope))),
        Err(source) => {
            warn!(status = response.status, error = %source, "response body did not decode");
            Err(ApiError::Deserialization {
                status: response.status,
                source,
            })
        }
    };
    ApiResponse {
        status: Some(response.status),
        expected,
        result,
        errors: Vec::new(),
    }
}

fn no_content(response: HttpResponse, expected: u16) -> ApiResponse<()> {
    if response.status != expected {
        return mismatch(response, expected);
    }
    ApiResponse {
        status: Some(response.status),
        expected,
        result: Ok(Some(())),
        errors: Vec::new(),
    }
}

fn mismatch<T>(response: HttpResponse, expected: u16) -> ApiResponse<T> {
    let errors = serde_json::from_str::<ErrorsEnvelope>(&response.body)
        .map(|e| e.errors)
        .unwrap_or_default();
    ApiResponse {
        status: Some(response.status),
        expected,
        result: Ok(None),
        errors,
    }
}
