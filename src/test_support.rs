//! In-process fake of the notes API for tests.
//!
//! Notes, tags and categories are stored as raw JSON so tests can seed the
//! odd encodings real servers produce. Any route can be made to fail with a
//! chosen status, and every request is recorded with its content headers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::normalize::normalize_tag_collection;

/// A request as the fake server saw it
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    pub notes: Vec<Value>,
    pub tags: Vec<Value>,
    pub categories: Vec<Value>,
    pub next_id: i64,
    pub failures: HashMap<&'static str, (u16, String)>,
    pub seen: Vec<SeenRequest>,
    pub health_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.lock().next_id = 100;
        api
    }

    pub fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap()
    }

    pub fn with_notes(self, notes: Vec<Value>) -> Self {
        self.lock().notes = notes;
        self
    }

    pub fn with_tags(self, tags: Vec<Value>) -> Self {
        self.lock().tags = tags;
        self
    }

    pub fn with_categories(self, categories: Vec<Value>) -> Self {
        self.lock().categories = categories;
        self
    }

    /// Make a route answer with `status` and `body`
    pub fn fail(&self, route: &'static str, status: u16, body: &str) {
        self.respond(route, status, body);
    }

    /// Make a route answer with a canned body, success statuses included
    pub fn respond(&self, route: &'static str, status: u16, body: &str) {
        self.lock().failures.insert(route, (status, body.to_string()));
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.lock().seen.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().seen.len()
    }

    pub fn count(&self, method: &str, path_suffix: &str) -> usize {
        self.lock()
            .seen
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(path_suffix))
            .count()
    }

    fn failure(&self, route: &str) -> Option<Response> {
        self.lock().failures.get(route).map(|(status, body)| {
            let status = StatusCode::from_u16(*status).unwrap();
            (status, body.clone()).into_response()
        })
    }

    fn next_id(&self) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }
}

fn id_of(value: &Value) -> Option<i64> {
    value.get("id").and_then(Value::as_i64)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, r#"{"error":"not found"}"#).into_response()
}

async fn record(State(api): State<FakeApi>, request: Request, next: Next) -> Response {
    let seen = {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        SeenRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(String::from),
            content_type: header_value(header::CONTENT_TYPE),
            accept: header_value(header::ACCEPT),
        }
    };
    api.lock().seen.push(seen);
    next.run(request).await
}

async fn list_notes(State(api): State<FakeApi>) -> Response {
    if let Some(failure) = api.failure("list_notes") {
        return failure;
    }
    Json(Value::Array(api.lock().notes.clone())).into_response()
}

async fn create_note(State(api): State<FakeApi>, Json(mut body): Json<Value>) -> Response {
    if let Some(failure) = api.failure("create_note") {
        return failure;
    }
    let id = api.next_id();
    body["id"] = json!(id);
    api.lock().notes.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_note(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    if let Some(failure) = api.failure("get_note") {
        return failure;
    }
    let state = api.lock();
    match state.notes.iter().find(|n| id_of(n) == Some(id)) {
        Some(note) => Json(note.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_note(
    State(api): State<FakeApi>,
    Path(id): Path<i64>,
    Json(mut body): Json<Value>,
) -> Response {
    if let Some(failure) = api.failure("update_note") {
        return failure;
    }
    body["id"] = json!(id);
    let mut state = api.lock();
    match state.notes.iter_mut().find(|n| id_of(n) == Some(id)) {
        Some(note) => {
            *note = body.clone();
            Json(body).into_response()
        }
        None => not_found(),
    }
}

async fn delete_note(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    if let Some(failure) = api.failure("delete_note") {
        return failure;
    }
    let mut state = api.lock();
    let before = state.notes.len();
    state.notes.retain(|n| id_of(n) != Some(id));
    if state.notes.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn search_tags(
    State(api): State<FakeApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(failure) = api.failure("search_tags") {
        return failure;
    }
    let wanted: Vec<String> = params
        .get("tags")
        .map(|t| t.split(',').map(String::from).collect())
        .unwrap_or_default();
    let state = api.lock();
    let matches: Vec<Value> = state
        .notes
        .iter()
        .filter(|n| {
            normalize_tag_collection(n.get("tags"))
                .iter()
                .any(|t| wanted.contains(&t.name))
        })
        .cloned()
        .collect();
    Json(Value::Array(matches)).into_response()
}

async fn search_category(
    State(api): State<FakeApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(failure) = api.failure("search_category") {
        return failure;
    }
    let wanted = params.get("category").cloned().unwrap_or_default();
    let state = api.lock();
    let matches: Vec<Value> = state
        .notes
        .iter()
        .filter(|n| n["category"]["name"].as_str() == Some(wanted.as_str()))
        .cloned()
        .collect();
    Json(Value::Array(matches)).into_response()
}

async fn list_tags(State(api): State<FakeApi>) -> Response {
    if let Some(failure) = api.failure("list_tags") {
        return failure;
    }
    Json(Value::Array(api.lock().tags.clone())).into_response()
}

async fn create_tag(State(api): State<FakeApi>, Json(mut body): Json<Value>) -> Response {
    if let Some(failure) = api.failure("create_tag") {
        return failure;
    }
    let id = api.next_id();
    body["id"] = json!(id);
    api.lock().tags.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_tag(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    let state = api.lock();
    match state.tags.iter().find(|t| id_of(t) == Some(id)) {
        Some(tag) => Json(tag.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_tag(
    State(api): State<FakeApi>,
    Path(id): Path<i64>,
    Json(mut body): Json<Value>,
) -> Response {
    body["id"] = json!(id);
    let mut state = api.lock();
    match state.tags.iter_mut().find(|t| id_of(t) == Some(id)) {
        Some(tag) => {
            *tag = body.clone();
            Json(body).into_response()
        }
        None => not_found(),
    }
}

async fn delete_tag(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    if let Some(failure) = api.failure("delete_tag") {
        return failure;
    }
    let mut state = api.lock();
    let before = state.tags.len();
    state.tags.retain(|t| id_of(t) != Some(id));
    if state.tags.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_categories(State(api): State<FakeApi>) -> Response {
    if let Some(failure) = api.failure("list_categories") {
        return failure;
    }
    Json(Value::Array(api.lock().categories.clone())).into_response()
}

async fn create_category(State(api): State<FakeApi>, Json(mut body): Json<Value>) -> Response {
    if let Some(failure) = api.failure("create_category") {
        return failure;
    }
    let id = api.next_id();
    body["id"] = json!(id);
    api.lock().categories.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_category(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    let state = api.lock();
    match state.categories.iter().find(|c| id_of(c) == Some(id)) {
        Some(category) => Json(category.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_category(
    State(api): State<FakeApi>,
    Path(id): Path<i64>,
    Json(mut body): Json<Value>,
) -> Response {
    body["id"] = json!(id);
    let mut state = api.lock();
    match state.categories.iter_mut().find(|c| id_of(c) == Some(id)) {
        Some(category) => {
            *category = body.clone();
            Json(body).into_response()
        }
        None => not_found(),
    }
}

async fn delete_category(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    let mut state = api.lock();
    let before = state.categories.len();
    state.categories.retain(|c| id_of(c) != Some(id));
    if state.categories.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Answers after two seconds
async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!([])).into_response()
}

/// The first call hangs for two seconds, later calls answer at once
async fn health(State(api): State<FakeApi>) -> Response {
    let call = {
        let mut state = api.lock();
        state.health_calls += 1;
        state.health_calls
    };
    if call == 1 {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    Json(json!([])).into_response()
}

fn router(api: FakeApi) -> Router {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route(
            "/api/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/api/notes/search/tags", get(search_tags))
        .route("/api/notes/search/category", get(search_category))
        .route("/api/tags", get(list_tags).post(create_tag))
        .route("/api/tags/:id", get(get_tag).put(update_tag).delete(delete_tag))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/slow", get(slow))
        .route("/api/health", get(health))
        .layer(middleware::from_fn_with_state(api.clone(), record))
        .with_state(api)
}

/// Serve the fake API on a random local port; returns its base URL
pub async fn spawn(api: FakeApi) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(api)).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// A base URL nothing listens on
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

pub fn transport(base_url: &str) -> crate::transport::HttpTransport {
    crate::transport::HttpTransport::with_timeout(base_url, Duration::from_secs(10)).unwrap()
}

/// Four notes covering every tag encoding the server has been seen to send
pub fn sample_notes() -> Vec<Value> {
    vec![
        json!({"id": 1, "title": "Quarterly report", "content": "numbers",
               "tags": [{"id": 4, "name": "work"}], "category": {"id": 1, "name": "Office"}}),
        json!({"id": 2, "title": "Shopping", "content": "milk",
               "tags": {"0": {"id": 3, "name": "personal"}}, "category": {"id": 2, "name": "Home"}}),
        json!({"id": 3, "title": "Startup idea", "content": "",
               "tags": [{"id": 5, "name": "idea"}, {"id": 4, "name": "work"}], "category": null}),
        json!({"id": 4, "title": "Untagged", "content": "", "tags": null, "category": null}),
    ]
}
