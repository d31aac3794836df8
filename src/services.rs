//! Resource services for notes, tags and categories.
//!
//! Each service owns its endpoint paths and composes the transport with the
//! normalizer. Transport failures are wrapped into operation errors
//! (`Fetch`, `Create`, `Update`, `Delete`) that keep the original cause.
//!
//! Only two operations recover locally instead of propagating:
//! - `TagService::list_all` falls back to the built-in system tags
//! - `NoteService::search_by_tags` / `search_by_category` fall back to a full
//!   fetch filtered on the client

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{NotesError, NotesResult, TransportError, TransportErrorKind};
use crate::models::{Category, NewCategory, Note, Tag};
use crate::normalize::{normalize_entity_list, normalize_note, normalize_note_list, outgoing_note};
use crate::search::{filter_by_category, filter_by_tags};
use crate::transport::{HealthMonitor, HttpTransport};
use crate::validation::{
    validate_category, validate_id, validate_note_draft, validate_note_update, validate_tag_name,
};

/// Names of the predefined system tags, in id order starting at 1
pub const SYSTEM_TAG_NAMES: [&str; 6] = ["important", "urgent", "personal", "work", "idea", "reminder"];

/// The built-in tag set used when the tag list cannot be fetched.
///
/// It is never written back to the server.
pub fn default_system_tags() -> Vec<Tag> {
    SYSTEM_TAG_NAMES
        .iter()
        .zip(1i64..)
        .map(|(name, id)| Tag::system(id, *name))
        .collect()
}

fn decode_error(err: serde_json::Error, raw: &Value) -> TransportError {
    TransportError {
        kind: TransportErrorKind::Decode,
        status: None,
        body: Some(raw.to_string()),
        message: format!("unexpected response shape: {}", err),
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: Value) -> Result<T, TransportError> {
    serde_json::from_value(raw.clone()).map_err(|e| decode_error(e, &raw))
}

fn log_failure(context: &str, err: &TransportError) {
    tracing::error!("Error {}: {}", context, err);
    if let Some(status) = err.status {
        tracing::error!("  Response status: {}", status);
    }
    if let Some(body) = &err.body {
        tracing::error!("  Response body: {}", body);
    }
}

/// Deduplicate names, keeping first occurrence order and dropping blanks.
fn distinct_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.to_string()))
        .map(String::from)
        .collect()
}

/// Notes resource
#[derive(Debug, Clone)]
pub struct NoteService {
    transport: HttpTransport,
    path: String,
}

impl NoteService {
    pub fn new(transport: HttpTransport, config: &Config) -> Self {
        Self::with_path(transport, &config.endpoints().notes)
    }

    pub fn with_path(transport: HttpTransport, path: &str) -> Self {
        Self {
            transport,
            path: path.to_string(),
        }
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Fetch all notes
    pub async fn list_all(&self) -> NotesResult<Vec<Note>> {
        self.try_list_all().await.map_err(|e| {
            log_failure("fetching notes", &e);
            NotesError::fetch("failed to fetch notes", e)
        })
    }

    async fn try_list_all(&self) -> Result<Vec<Note>, TransportError> {
        let raw = self.transport.get(&self.path).await?;
        normalize_note_list(&raw).map_err(|e| decode_error(e, &raw))
    }

    /// Get a note by id
    pub async fn get_by_id(&self, id: i64) -> NotesResult<Note> {
        validate_id(id, "id")?;
        let result = async {
            let raw = self.transport.get(&self.item_path(id)).await?;
            normalize_note(&raw).map_err(|e| decode_error(e, &raw))
        }
        .await;

        result.map_err(|e| {
            log_failure("fetching note", &e);
            NotesError::fetch(format!("failed to fetch note {}", id), e)
        })
    }

    /// Create a note from a draft; the result carries the server-assigned id
    pub async fn create(&self, draft: &Note) -> NotesResult<Note> {
        validate_note_draft(draft)?;
        let payload = outgoing_note(draft)?;
        tracing::debug!("Creating note '{}'", draft.title);

        let result: Result<Note, TransportError> = async {
            let raw = self.transport.post(&self.path, &payload).await?;
            let note = normalize_note(&raw).map_err(|e| decode_error(e, &raw))?;
            if note.id.is_none() {
                return Err(TransportError {
                    kind: TransportErrorKind::Decode,
                    status: None,
                    body: Some(raw.to_string()),
                    message: "created note has no id".to_string(),
                });
            }
            Ok(note)
        }
        .await;

        match result {
            Ok(note) => {
                tracing::info!("Created note {:?}", note.id);
                Ok(note)
            }
            Err(e) => {
                log_failure("creating note", &e);
                Err(NotesError::create("failed to create note", e))
            }
        }
    }

    /// Update a persisted note; the server's version is returned
    pub async fn update(&self, note: &Note) -> NotesResult<Note> {
        let id = validate_note_update(note)?;
        let payload = outgoing_note(note)?;

        let result = async {
            let raw = self.transport.put(&self.item_path(id), &payload).await?;
            normalize_note(&raw).map_err(|e| decode_error(e, &raw))
        }
        .await;

        match result {
            Ok(mut updated) => {
                if updated.id.is_none() {
                    tracing::debug!("Update response for note {} has no id, keeping request id", id);
                    updated.id = Some(id);
                }
                Ok(updated)
            }
            Err(e) => {
                log_failure("updating note", &e);
                Err(NotesError::update(format!("failed to update note {}", id), e))
            }
        }
    }

    /// Delete a note by id
    pub async fn delete(&self, id: i64) -> NotesResult<()> {
        validate_id(id, "id")?;
        self.transport.delete(&self.item_path(id)).await.map_err(|e| {
            log_failure("deleting note", &e);
            NotesError::delete(format!("failed to delete note {}", id), e)
        })?;
        tracing::info!("Deleted note {}", id);
        Ok(())
    }

    /// Notes carrying at least one of the given tag names.
    ///
    /// Uses the server-side search; when that fails, filters a full fetch.
    /// An empty selection matches nothing and issues no request.
    pub async fn search_by_tags(&self, tag_names: &[String]) -> NotesResult<Vec<Note>> {
        let names = distinct_names(tag_names);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let joined = names.join(",");
        let path = format!("{}/search/tags", self.path);
        let server = async {
            let raw = self.transport.get_with_query(&path, &[("tags", joined.as_str())]).await?;
            normalize_note_list(&raw).map_err(|e| decode_error(e, &raw))
        }
        .await;

        match server {
            Ok(notes) => Ok(notes),
            Err(e) => {
                tracing::warn!("Tag search endpoint failed ({}), filtering all notes locally", e);
                let all = self.list_all().await?;
                Ok(filter_by_tags(&all, &names))
            }
        }
    }

    /// Notes whose category name contains `category` (case-insensitive).
    ///
    /// Uses the server-side search; when that fails, filters a full fetch.
    pub async fn search_by_category(&self, category: &str) -> NotesResult<Vec<Note>> {
        let path = format!("{}/search/category", self.path);
        let server = async {
            let raw = self
                .transport
                .get_with_query(&path, &[("category", category)])
                .await?;
            normalize_note_list(&raw).map_err(|e| decode_error(e, &raw))
        }
        .await;

        match server {
            Ok(notes) => Ok(notes),
            Err(e) => {
                tracing::warn!(
                    "Category search endpoint failed ({}), filtering all notes locally",
                    e
                );
                let all = self.list_all().await?;
                Ok(filter_by_category(&all, category))
            }
        }
    }
}

/// Body for creating a custom tag
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTagRequest<'a> {
    name: &'a str,
    is_system_tag: bool,
}

/// Tags resource
#[derive(Debug, Clone)]
pub struct TagService {
    transport: HttpTransport,
    path: String,
}

impl TagService {
    pub fn new(transport: HttpTransport, config: &Config) -> Self {
        Self::with_path(transport, &config.endpoints().tags)
    }

    pub fn with_path(transport: HttpTransport, path: &str) -> Self {
        Self {
            transport,
            path: path.to_string(),
        }
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Fetch all tags, or the built-in system tags if the fetch fails.
    ///
    /// Tagging must stay usable while the backend is unreachable.
    pub async fn list_all(&self) -> Vec<Tag> {
        match self.try_list_all().await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!("Error fetching tags ({}), using built-in system tags", e);
                default_system_tags()
            }
        }
    }

    /// Fetch all tags without the built-in fallback
    pub async fn try_list_all(&self) -> NotesResult<Vec<Tag>> {
        let result = async {
            let raw = self.transport.get(&self.path).await?;
            normalize_entity_list::<Tag>(&raw).map_err(|e| decode_error(e, &raw))
        }
        .await;
        result.map_err(|e| NotesError::fetch("failed to fetch tags", e))
    }

    pub async fn get_by_id(&self, id: i64) -> NotesResult<Tag> {
        validate_id(id, "id")?;
        let result = async {
            let raw = self.transport.get(&self.item_path(id)).await?;
            decode::<Tag>(raw)
        }
        .await;
        result.map_err(|e| {
            log_failure("fetching tag", &e);
            NotesError::fetch(format!("failed to fetch tag {}", id), e)
        })
    }

    /// Create a custom (non-system) tag.
    ///
    /// Blank names are rejected before any request is made.
    pub async fn create_custom(&self, name: &str) -> NotesResult<Tag> {
        let name = validate_tag_name(name)?;
        let body = serde_json::to_value(NewTagRequest {
            name: &name,
            is_system_tag: false,
        })?;

        let result = async {
            let raw = self.transport.post(&self.path, &body).await?;
            decode::<Tag>(raw)
        }
        .await;

        match result {
            Ok(tag) => {
                tracing::info!("Created tag '{}' ({:?})", tag.name, tag.id);
                Ok(tag)
            }
            Err(e) => {
                log_failure("creating tag", &e);
                Err(NotesError::create(format!("failed to create tag '{}'", name), e))
            }
        }
    }

    /// Rename a custom tag. System tags are immutable.
    pub async fn update(&self, id: i64, tag: &Tag) -> NotesResult<Tag> {
        validate_id(id, "id")?;
        if tag.is_system_tag {
            return Err(NotesError::validation("isSystemTag", "system tags cannot be modified"));
        }
        let name = validate_tag_name(&tag.name)?;
        let body = serde_json::to_value(NewTagRequest {
            name: &name,
            is_system_tag: false,
        })?;

        let result = async {
            let raw = self.transport.put(&self.item_path(id), &body).await?;
            decode::<Tag>(raw)
        }
        .await;

        result.map_err(|e| {
            log_failure("updating tag", &e);
            NotesError::update(format!("failed to update tag {}", id), e)
        })
    }

    /// Delete a tag by id.
    ///
    /// Callers must not offer this for system tags; see `Tag::is_deletable`.
    pub async fn delete_by_id(&self, id: i64) -> NotesResult<()> {
        validate_id(id, "id")?;
        self.transport.delete(&self.item_path(id)).await.map_err(|e| {
            log_failure("deleting tag", &e);
            NotesError::delete(format!("failed to delete tag {}", id), e)
        })
    }
}

/// Categories resource
#[derive(Debug, Clone)]
pub struct CategoryService {
    transport: HttpTransport,
    path: String,
}

impl CategoryService {
    pub fn new(transport: HttpTransport, config: &Config) -> Self {
        Self::with_path(transport, &config.endpoints().categories)
    }

    pub fn with_path(transport: HttpTransport, path: &str) -> Self {
        Self {
            transport,
            path: path.to_string(),
        }
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    pub async fn list_all(&self) -> NotesResult<Vec<Category>> {
        let result = async {
            let raw = self.transport.get(&self.path).await?;
            normalize_entity_list::<Category>(&raw).map_err(|e| decode_error(e, &raw))
        }
        .await;
        result.map_err(|e| {
            log_failure("fetching categories", &e);
            NotesError::fetch("failed to fetch categories", e)
        })
    }

    pub async fn get_by_id(&self, id: i64) -> NotesResult<Category> {
        validate_id(id, "id")?;
        let result = async {
            let raw = self.transport.get(&self.item_path(id)).await?;
            decode::<Category>(raw)
        }
        .await;
        result.map_err(|e| {
            log_failure("fetching category", &e);
            NotesError::fetch(format!("failed to fetch category {}", id), e)
        })
    }

    pub async fn create(&self, category: &NewCategory) -> NotesResult<Category> {
        validate_category(category)?;
        let body = serde_json::to_value(category)?;
        let result = async {
            let raw = self.transport.post(&self.path, &body).await?;
            decode::<Category>(raw)
        }
        .await;
        result.map_err(|e| {
            log_failure("creating category", &e);
            NotesError::create("failed to create category", e)
        })
    }

    pub async fn update(&self, id: i64, category: &NewCategory) -> NotesResult<Category> {
        validate_id(id, "id")?;
        validate_category(category)?;
        let body = serde_json::to_value(category)?;
        let result = async {
            let raw = self.transport.put(&self.item_path(id), &body).await?;
            decode::<Category>(raw)
        }
        .await;
        result.map_err(|e| {
            log_failure("updating category", &e);
            NotesError::update(format!("failed to update category {}", id), e)
        })
    }

    pub async fn delete(&self, id: i64) -> NotesResult<()> {
        validate_id(id, "id")?;
        self.transport.delete(&self.item_path(id)).await.map_err(|e| {
            log_failure("deleting category", &e);
            NotesError::delete(format!("failed to delete category {}", id), e)
        })
    }
}

/// Everything a screen needs on load
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub notes: Vec<Note>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// All services for one API, built from one configuration
#[derive(Debug, Clone)]
pub struct NotesClient {
    pub notes: NoteService,
    pub tags: TagService,
    pub categories: CategoryService,
    transport: HttpTransport,
}

impl NotesClient {
    pub fn new(config: &Config) -> NotesResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self {
            notes: NoteService::new(transport.clone(), config),
            tags: TagService::new(transport.clone(), config),
            categories: CategoryService::new(transport.clone(), config),
            transport,
        })
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// A reachability monitor against the notes endpoint
    pub fn health_monitor(&self, config: &Config) -> HealthMonitor {
        HealthMonitor::new(self.transport.clone(), config)
    }

    /// Load notes, categories and tags concurrently.
    ///
    /// Fails as a whole if any request fails; nothing partial is returned.
    pub async fn load_dashboard(&self) -> NotesResult<Dashboard> {
        let (notes, categories, tags) = tokio::try_join!(
            self.notes.list_all(),
            self.categories.list_all(),
            async { Ok::<_, NotesError>(self.tags.list_all().await) },
        )?;
        Ok(Dashboard {
            notes,
            categories,
            tags,
        })
    }

    /// Load tags and categories concurrently, all-or-nothing
    pub async fn load_reference_data(&self) -> NotesResult<(Vec<Tag>, Vec<Category>)> {
        tokio::try_join!(
            async { Ok::<_, NotesError>(self.tags.list_all().await) },
            self.categories.list_all(),
        )
    }
}
