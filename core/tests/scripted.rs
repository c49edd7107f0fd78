//! Pass-through contract checks against a scripted in-memory transport.
//!
//! The transport replays queued responses in order and records every request
//! it receives, so each test can assert on both sides of the exchange.

use std::collections::VecDeque;
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use redmine_client::{
    ApiError, Client, CreatePage, GetPageOptions, HttpMethod, HttpRequest, HttpResponse, Include,
    Transport, TransportError, UpdatePage,
};

#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<Result<HttpResponse, String>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl Scripted {
    fn reply(self, status: u16, body: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
        self
    }

    fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left")
            .map_err(TransportError::Other)
    }
}

fn page_body(title: &str, text: &str, version: u32) -> String {
    serde_json::json!({
        "wiki_page": {
            "title": title,
            "text": text,
            "version": version,
            "author": { "id": 1, "name": "Redmine Admin" },
            "comments": "",
            "created_on": "2024-01-01T00:00:00Z",
            "updated_on": "2024-01-01T00:00:00Z"
        }
    })
    .to_string()
}

#[test]
fn create_home_scenario() {
    let client = Client::new(Scripted::default().reply(201, &page_body("Home", "Hello", 1)));

    let input = CreatePage {
        text: "Hello".to_string(),
        ..Default::default()
    };
    let resp = client.create_wiki_page("foo", "Home", &input);

    assert_eq!(resp.status, Some(201));
    assert!(resp.is_success());
    let page = resp.into_result().unwrap();
    assert_eq!(page.title, "Home");
    assert_eq!(page.text, "Hello");
    assert_eq!(page.version, 1);

    let seen = client.transport().requests();
    assert_eq!(seen[0].method, HttpMethod::Put);
    assert_eq!(seen[0].path(), "/projects/foo/wiki/Home.json");
}

#[test]
fn get_after_create_returns_created_text() {
    let client = Client::new(
        Scripted::default()
            .reply(201, &page_body("Home", "Hello", 1))
            .reply(200, &page_body("Home", "Hello", 1)),
    );

    let input = CreatePage {
        text: "Hello".to_string(),
        ..Default::default()
    };
    let created = client.create_wiki_page("foo", "Home", &input).into_result().unwrap();
    let fetched = client
        .get_wiki_page("foo", "Home", &GetPageOptions::default())
        .into_result()
        .unwrap();

    assert_eq!(fetched.text, input.text);
    assert_eq!(fetched, created);
}

#[test]
fn update_then_old_version_keeps_old_text() {
    let client = Client::new(
        Scripted::default()
            .reply(204, "")
            .reply(200, &page_body("Home", "Hello", 1))
            .reply(200, &page_body("Home", "Hello again", 2)),
    );

    let update = UpdatePage {
        text: "Hello again".to_string(),
        version: Some(1),
        ..Default::default()
    };
    let resp = client.update_wiki_page("foo", "Home", &update);
    assert_eq!(resp.status, Some(204));
    assert!(resp.error().is_none());

    let old = client
        .get_wiki_page_version("foo", "Home", 1, &GetPageOptions::default())
        .into_result()
        .unwrap();
    assert_eq!(old.text, "Hello");

    let latest = client
        .get_wiki_page("foo", "Home", &GetPageOptions::default())
        .into_result()
        .unwrap();
    assert_eq!(latest.text, "Hello again");

    let paths: Vec<String> = client.transport().requests().iter().map(HttpRequest::path).collect();
    assert_eq!(
        paths,
        [
            "/projects/foo/wiki/Home.json",
            "/projects/foo/wiki/Home/1.json",
            "/projects/foo/wiki/Home.json",
        ]
    );
}

#[test]
fn list_preserves_transport_order() {
    let body = serde_json::json!({
        "wiki_pages": [
            { "title": "Zeta", "version": 1, "created_on": "c", "updated_on": "u" },
            { "title": "Alpha", "version": 2, "created_on": "c", "updated_on": "u" },
            { "title": "Mid", "version": 1, "created_on": "c", "updated_on": "u" }
        ]
    })
    .to_string();
    let client = Client::new(Scripted::default().reply(200, &body));

    let pages = client.list_wiki_pages("foo").into_result().unwrap();
    let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Zeta", "Alpha", "Mid"]);
}

#[test]
fn include_set_reaches_query_string() {
    let client = Client::new(
        Scripted::default()
            .reply(200, &page_body("Home", "Hello", 1))
            .reply(200, &page_body("Home", "Hello", 1)),
    );

    let _ = client.get_wiki_page("foo", "Home", &Include::Attachments.into());
    let _ = client.get_wiki_page("foo", "Home", &GetPageOptions::default());

    let seen = client.transport().requests();
    assert_eq!(seen[0].query_string().as_deref(), Some("include=attachments"));
    assert_eq!(seen[1].query_string(), None);
}

#[test]
fn delete_status_passes_through_without_error() {
    for status in [204, 200, 404, 500] {
        let client = Client::new(Scripted::default().reply(status, ""));
        let resp = client.delete_wiki_page("foo", "Home");
        assert_eq!(resp.status, Some(status));
        assert!(resp.error().is_none(), "status {status} must not produce an error");
        assert_eq!(resp.is_success(), status == 204);
    }
}

#[test]
fn transport_failure_surfaces_verbatim() {
    let client = Client::new(Scripted::default().fail("connection reset"));
    let resp = client.get_wiki_page("foo", "Home", &GetPageOptions::default());

    assert_eq!(resp.status, None);
    match resp.result {
        Err(ApiError::Transport(TransportError::Other(message))) => {
            assert_eq!(message, "connection reset")
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn decode_failure_keeps_received_status() {
    let client = Client::new(Scripted::default().reply(201, r#"{"wiki_page":{"title":1}}"#));
    let resp = client.create_wiki_page(
        "foo",
        "Home",
        &CreatePage {
            text: "Hello".to_string(),
            ..Default::default()
        },
    );

    assert_eq!(resp.status, Some(201));
    assert!(matches!(
        resp.result,
        Err(ApiError::Deserialization { status: 201, .. })
    ));
}

#[test]
fn validation_messages_ride_along_with_status() {
    let client = Client::new(
        Scripted::default().reply(422, r#"{"errors":["Text cannot be blank"]}"#),
    );
    let resp = client.update_wiki_page("foo", "Home", &UpdatePage::default());

    assert_eq!(resp.status, Some(422));
    assert!(resp.error().is_none());
    assert_eq!(resp.errors, ["Text cannot be blank"]);
}
