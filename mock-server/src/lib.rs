//! In-memory Redmine wiki server for integration tests.
//!
//! Keeps every project's pages in creation order with their full revision
//! history, and answers the wiki endpoints with Redmine's status codes.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parent {
    pub title: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    pub filesize: u64,
    pub content_type: String,
    pub description: String,
    pub content_url: String,
    pub author: Author,
    pub created_on: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WikiPageSummary {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
    pub version: u32,
    pub created_on: String,
    pub updated_on: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WikiPage {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
    pub text: String,
    pub version: u32,
    pub author: Author,
    pub comments: String,
    pub created_on: String,
    pub updated_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Serialize, Deserialize)]
pub struct WikiPagesBody {
    pub wiki_pages: Vec<WikiPageSummary>,
}

#[derive(Serialize, Deserialize)]
pub struct WikiPageBody {
    pub wiki_page: WikiPage,
}

#[derive(Deserialize)]
pub struct Upload {
    pub token: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct WritePage {
    #[serde(default)]
    pub text: String,
    pub comments: Option<String>,
    pub version: Option<u32>,
    pub parent_title: Option<String>,
    #[serde(default)]
    pub uploads: Vec<Upload>,
}

#[derive(Deserialize)]
pub struct WriteBody {
    pub wiki_page: WritePage,
}

#[derive(Deserialize)]
pub struct IncludeParams {
    pub include: Option<String>,
}

impl IncludeParams {
    fn attachments(&self) -> bool {
        self.include
            .as_deref()
            .is_some_and(|list| list.split(',').any(|item| item.trim() == "attachments"))
    }
}

/// The user every write is attributed to.
pub fn admin() -> Author {
    Author {
        id: 1,
        name: "Redmine Admin".to_string(),
    }
}

struct Revision {
    version: u32,
    text: String,
    comments: String,
    updated_on: String,
}

struct PageRecord {
    title: String,
    parent: Option<String>,
    created_on: String,
    revisions: Vec<Revision>,
    attachments: Vec<Attachment>,
}

impl PageRecord {
    fn latest(&self) -> &Revision {
        // A record is never stored without its first revision.
        &self.revisions[self.revisions.len() - 1]
    }

    fn summary(&self) -> WikiPageSummary {
        let latest = self.latest();
        WikiPageSummary {
            title: self.title.clone(),
            parent: self.parent.clone().map(|title| Parent { title }),
            version: latest.version,
            created_on: self.created_on.clone(),
            updated_on: latest.updated_on.clone(),
        }
    }

    fn render(&self, revision: &Revision, with_attachments: bool) -> WikiPage {
        WikiPage {
            title: self.title.clone(),
            parent: self.parent.clone().map(|title| Parent { title }),
            text: revision.text.clone(),
            version: revision.version,
            author: admin(),
            comments: revision.comments.clone(),
            created_on: self.created_on.clone(),
            updated_on: revision.updated_on.clone(),
            attachments: with_attachments.then(|| self.attachments.clone()),
        }
    }
}

#[derive(Default)]
pub struct Store {
    projects: HashMap<String, Vec<PageRecord>>,
    next_attachment_id: u64,
}

impl Store {
    fn page(&self, project: &str, title: &str) -> Option<&PageRecord> {
        self.projects
            .get(project)?
            .iter()
            .find(|page| page.title == title)
    }

    fn attach(&mut self, uploads: Vec<Upload>, now: &str) -> Vec<Attachment> {
        uploads
            .into_iter()
            .map(|upload| {
                self.next_attachment_id += 1;
                let id = self.next_attachment_id;
                Attachment {
                    id,
                    content_url: format!("/attachments/download/{id}/{}", upload.filename),
                    filename: upload.filename,
                    filesize: 0,
                    content_type: upload.content_type.unwrap_or_default(),
                    description: upload.description.unwrap_or_default(),
                    author: admin(),
                    created_on: now.to_string(),
                }
            })
            .collect()
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/projects/{project}/wiki/index.json", get(list_pages))
        .route(
            "/projects/{project}/wiki/{page}",
            get(get_page).put(put_page).delete(delete_page),
        )
        .route("/projects/{project}/wiki/{title}/{version}", get(get_page_version))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Strip the `.json` format suffix Redmine routes carry.
fn json_segment(segment: &str) -> Result<&str, StatusCode> {
    segment.strip_suffix(".json").ok_or(StatusCode::NOT_FOUND)
}

fn validation_error(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "errors": [message] })),
    )
        .into_response()
}

async fn list_pages(State(db): State<Db>, Path(project): Path<String>) -> Json<WikiPagesBody> {
    let store = db.read().await;
    let wiki_pages = store
        .projects
        .get(&project)
        .map(|pages| pages.iter().map(PageRecord::summary).collect())
        .unwrap_or_default();
    Json(WikiPagesBody { wiki_pages })
}

async fn get_page(
    State(db): State<Db>,
    Path((project, page)): Path<(String, String)>,
    Query(params): Query<IncludeParams>,
) -> Result<Json<WikiPageBody>, StatusCode> {
    let title = json_segment(&page)?;
    let store = db.read().await;
    let record = store.page(&project, title).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(WikiPageBody {
        wiki_page: record.render(record.latest(), params.attachments()),
    }))
}

async fn get_page_version(
    State(db): State<Db>,
    Path((project, title, version)): Path<(String, String, String)>,
    Query(params): Query<IncludeParams>,
) -> Result<Json<WikiPageBody>, StatusCode> {
    let version: u32 = json_segment(&version)?
        .parse()
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let store = db.read().await;
    let record = store.page(&project, &title).ok_or(StatusCode::NOT_FOUND)?;
    let revision = record
        .revisions
        .iter()
        .find(|revision| revision.version == version)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(WikiPageBody {
        wiki_page: record.render(revision, params.attachments()),
    }))
}

async fn put_page(
    State(db): State<Db>,
    Path((project, page)): Path<(String, String)>,
    Json(input): Json<WriteBody>,
) -> Result<Response, StatusCode> {
    let title = json_segment(&page)?.to_string();
    let input = input.wiki_page;
    if input.text.trim().is_empty() {
        return Ok(validation_error("Text cannot be blank"));
    }

    let now = now();
    let mut store = db.write().await;
    let existing = store.projects.get(&project).and_then(|pages| {
        let index = pages.iter().position(|record| record.title == title)?;
        Some((index, pages[index].latest().version))
    });
    if let Some((_, current)) = existing {
        if input.version.is_some_and(|version| version != current) {
            return Ok(StatusCode::CONFLICT.into_response());
        }
    }

    let attachments = store.attach(input.uploads, &now);
    let pages = store.projects.entry(project.clone()).or_default();

    let Some((index, current)) = existing else {
        let record = PageRecord {
            title: title.clone(),
            parent: input.parent_title.filter(|parent| !parent.is_empty()),
            created_on: now.clone(),
            revisions: vec![Revision {
                version: 1,
                text: input.text,
                comments: input.comments.unwrap_or_default(),
                updated_on: now,
            }],
            attachments,
        };
        let body = WikiPageBody {
            wiki_page: record.render(record.latest(), false),
        };
        pages.push(record);
        debug!(%project, %title, "created wiki page");
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    };

    let record = &mut pages[index];
    let unchanged = record.latest().text == input.text;
    record.attachments.extend(attachments);
    if let Some(parent) = input.parent_title {
        record.parent = Some(parent).filter(|parent| !parent.is_empty());
    }
    if !unchanged {
        record.revisions.push(Revision {
            version: current + 1,
            text: input.text,
            comments: input.comments.unwrap_or_default(),
            updated_on: now,
        });
        debug!(%project, %title, version = current + 1, "updated wiki page");
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn delete_page(
    State(db): State<Db>,
    Path((project, page)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let title = json_segment(&page)?;
    let mut store = db.write().await;
    let pages = store.projects.get_mut(&project).ok_or(StatusCode::NOT_FOUND)?;
    let index = pages
        .iter()
        .position(|record| record.title == title)
        .ok_or(StatusCode::NOT_FOUND)?;
    pages.remove(index);
    debug!(%project, %title, "deleted wiki page");
    Ok(StatusCode::NO_CONTENT)
}
