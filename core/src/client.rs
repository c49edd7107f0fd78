//! Redmine client bound to an injected transport.
//!
//! # Design
//! `Client` holds only its transport and carries no mutable state between
//! calls. Every operation is build → execute → parse over the functions in
//! `wiki`, so the client adds nothing but the exchange itself: no retries,
//! no status interpretation.

use tracing::{debug, warn};

use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::response::ApiResponse;
use crate::types::{CreatePage, GetPageOptions, Page, PageSummary, UpdatePage};
use crate::wiki;

#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Lists every page of a project's wiki, in server order.
    pub fn list_wiki_pages(&self, project: &str) -> ApiResponse<Vec<PageSummary>> {
        let req = wiki::build_list_pages(project);
        self.exchange(req, wiki::LIST_PAGES_STATUS, wiki::parse_list_pages)
    }

    /// Fetches the latest version of a page.
    pub fn get_wiki_page(
        &self,
        project: &str,
        title: &str,
        options: &GetPageOptions,
    ) -> ApiResponse<Page> {
        let req = wiki::build_get_page(project, title, options);
        self.exchange(req, wiki::GET_PAGE_STATUS, wiki::parse_get_page)
    }

    /// Fetches a page as it was at `version`.
    pub fn get_wiki_page_version(
        &self,
        project: &str,
        title: &str,
        version: u32,
        options: &GetPageOptions,
    ) -> ApiResponse<Page> {
        let req = wiki::build_get_page_version(project, title, version, options);
        self.exchange(req, wiki::GET_PAGE_STATUS, wiki::parse_get_page)
    }

    /// Creates a page. When the title already exists the server updates it
    /// instead and answers 204, which comes back as a status mismatch.
    pub fn create_wiki_page(
        &self,
        project: &str,
        title: &str,
        input: &CreatePage,
    ) -> ApiResponse<Page> {
        match wiki::build_create_page(project, title, input) {
            Ok(req) => self.exchange(req, wiki::CREATE_PAGE_STATUS, wiki::parse_create_page),
            Err(err) => ApiResponse::failed(wiki::CREATE_PAGE_STATUS, err),
        }
    }

    pub fn update_wiki_page(
        &self,
        project: &str,
        title: &str,
        input: &UpdatePage,
    ) -> ApiResponse<()> {
        match wiki::build_update_page(project, title, input) {
            Ok(req) => self.exchange(req, wiki::UPDATE_PAGE_STATUS, wiki::parse_update_page),
            Err(err) => ApiResponse::failed(wiki::UPDATE_PAGE_STATUS, err),
        }
    }

    pub fn delete_wiki_page(&self, project: &str, title: &str) -> ApiResponse<()> {
        let req = wiki::build_delete_page(project, title);
        self.exchange(req, wiki::DELETE_PAGE_STATUS, wiki::parse_delete_page)
    }

    fn exchange<R>(
        &self,
        req: HttpRequest,
        expected: u16,
        parse: fn(HttpResponse) -> ApiResponse<R>,
    ) -> ApiResponse<R> {
        debug!(method = %req.method, path = %req.path(), "sending request");
        match self.transport.execute(&req) {
            Ok(response) => {
                debug!(status = response.status, expected, "received response");
                parse(response)
            }
            Err(err) => {
                warn!(method = %req.method, path = %req.path(), error = %err, "transport failure");
                ApiResponse {
                    status: err.status(),
                    ..ApiResponse::failed(expected, err.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{ApiError, TransportError};
    use crate::http::HttpMethod;

    /// Answers every request with the same response and records what it saw.
    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.to_string(),
            })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Other("connection refused".to_string()))
        }
    }

    #[test]
    fn delete_sends_one_request() {
        let client = Client::new(Canned::new(204, ""));
        let resp = client.delete_wiki_page("foo", "Home");
        assert!(resp.is_success());
        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Delete);
        assert_eq!(seen[0].path(), "/projects/foo/wiki/Home.json");
    }

    #[test]
    fn transport_failure_has_no_status() {
        let client = Client::new(Unreachable);
        let resp = client.list_wiki_pages("foo");
        assert_eq!(resp.status, None);
        assert_eq!(resp.expected, 200);
        assert!(matches!(resp.result, Err(ApiError::Transport(_))));
    }

    struct TruncatedBody;

    impl Transport for TruncatedBody {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Body {
                status: 200,
                source: ureq::Error::BodyExceedsLimit(4),
            })
        }
    }

    #[test]
    fn body_failure_keeps_received_status() {
        let client = Client::new(TruncatedBody);
        let resp = client.list_wiki_pages("foo");
        assert_eq!(resp.status, Some(200));
        assert!(matches!(
            resp.result,
            Err(ApiError::Transport(TransportError::Body { status: 200, .. }))
        ));
    }

    #[test]
    fn client_works_through_a_reference() {
        let canned = Canned::new(200, r#"{"wiki_pages":[]}"#);
        let client = Client::new(&canned);
        let pages = client.list_wiki_pages("foo").into_result().unwrap();
        assert!(pages.is_empty());
        assert_eq!(canned.seen.lock().unwrap().len(), 1);
    }
}
