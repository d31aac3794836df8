//! Local state synchronization.
//!
//! A `HeldCollection` is the client's copy of a server collection. After a
//! mutation succeeds on the server, the server's answer is reconciled into the
//! copy without refetching. A mutation that fails leaves the copy untouched.
//!
//! Every change builds a new `Vec` and swaps the shared pointer, so a
//! snapshot taken for rendering is never observed half-updated.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::InsertPosition;
use crate::error::NotesResult;
use crate::models::{Category, NewCategory, Note, Tag};
use crate::services::{CategoryService, NoteService, TagService};

/// Number of leading notes shown as "recent"
pub const RECENT_WINDOW: usize = 10;

/// Entities that carry a server-assigned id
pub trait Identified {
    fn entity_id(&self) -> Option<i64>;
}

impl Identified for Note {
    fn entity_id(&self) -> Option<i64> {
        self.id
    }
}

impl Identified for Tag {
    fn entity_id(&self) -> Option<i64> {
        self.id
    }
}

impl Identified for Category {
    fn entity_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

/// Whether the held items reflect a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
    /// The last fetch failed; the items are whatever was held before it
    Failed(String),
}

/// Aggregate statistics, always derived from the held notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteStats {
    pub total: usize,
    /// Notes within the leading recent window
    pub recent: usize,
    /// Distinct category names in use
    pub categories: usize,
}

impl NoteStats {
    pub fn from_notes(notes: &[Note]) -> Self {
        let categories: HashSet<&str> = notes
            .iter()
            .filter_map(|n| n.category_name())
            .filter(|name| !name.is_empty())
            .collect();

        Self {
            total: notes.len(),
            recent: notes.len().min(RECENT_WINDOW),
            categories: categories.len(),
        }
    }
}

/// Client-side copy of a server collection
#[derive(Debug, Clone)]
pub struct HeldCollection<T> {
    items: Arc<Vec<T>>,
    position: InsertPosition,
    state: LoadState,
}

impl<T> Default for HeldCollection<T> {
    fn default() -> Self {
        Self::new(InsertPosition::default())
    }
}

impl<T> HeldCollection<T> {
    pub fn new(position: InsertPosition) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            position,
            state: LoadState::NotLoaded,
        }
    }
}

impl<T: Identified + Clone> HeldCollection<T> {
    pub fn from_items(items: Vec<T>, position: InsertPosition) -> Self {
        Self {
            items: Arc::new(items),
            position,
            state: LoadState::Loaded,
        }
    }

    /// An immutable view of the current items
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.entity_id() == Some(id))
    }

    /// Replace everything with a fresh fetch
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
        self.state = LoadState::Loaded;
    }

    /// Record a failed fetch without touching the held items
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.state = LoadState::Failed(message.into());
    }

    /// Insert an entity the server just created
    pub fn apply_created(&mut self, item: T) {
        let mut next = Vec::with_capacity(self.items.len() + 1);
        match self.position {
            InsertPosition::Front => {
                next.push(item);
                next.extend(self.items.iter().cloned());
            }
            InsertPosition::Back => {
                next.extend(self.items.iter().cloned());
                next.push(item);
            }
        }
        self.items = Arc::new(next);
    }

    /// Replace the entity with the same id.
    ///
    /// Returns false, leaving the items unchanged, when no entity matches.
    pub fn apply_updated(&mut self, item: T) -> bool {
        let Some(id) = item.entity_id() else {
            tracing::warn!("Ignoring update for an entity without an id");
            return false;
        };
        if !self.items.iter().any(|existing| existing.entity_id() == Some(id)) {
            tracing::warn!("Updated entity {} is not in the held collection", id);
            return false;
        }

        let next: Vec<T> = self
            .items
            .iter()
            .map(|existing| {
                if existing.entity_id() == Some(id) {
                    item.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        self.items = Arc::new(next);
        true
    }

    /// Remove the entity with the given id. Returns whether anything was removed.
    pub fn apply_deleted(&mut self, id: i64) -> bool {
        let next: Vec<T> = self
            .items
            .iter()
            .filter(|existing| existing.entity_id() != Some(id))
            .cloned()
            .collect();
        let removed = next.len() != self.items.len();
        if removed {
            self.items = Arc::new(next);
        }
        removed
    }
}

impl HeldCollection<Note> {
    /// Derived statistics for the held notes
    pub fn stats(&self) -> NoteStats {
        NoteStats::from_notes(&self.items)
    }

    /// Notes within the leading recent window
    pub fn recent(&self) -> &[Note] {
        &self.items[..self.items.len().min(RECENT_WINDOW)]
    }

    /// Refetch all notes. On failure the held notes stay as they were and the
    /// failure is recorded in the load state.
    pub async fn refresh(&mut self, service: &NoteService) -> NotesResult<()> {
        match service.list_all().await {
            Ok(notes) => {
                self.replace_all(notes);
                Ok(())
            }
            Err(e) => {
                self.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, service: &NoteService, draft: &Note) -> NotesResult<Note> {
        let created = service.create(draft).await?;
        self.apply_created(created.clone());
        Ok(created)
    }

    pub async fn update(&mut self, service: &NoteService, note: &Note) -> NotesResult<Note> {
        let updated = service.update(note).await?;
        self.apply_updated(updated.clone());
        Ok(updated)
    }

    pub async fn delete(&mut self, service: &NoteService, id: i64) -> NotesResult<()> {
        service.delete(id).await?;
        self.apply_deleted(id);
        Ok(())
    }
}

impl HeldCollection<Tag> {
    /// Refetch tags, falling back to the built-in set when unreachable
    pub async fn refresh(&mut self, service: &TagService) {
        self.replace_all(service.list_all().await);
    }

    pub async fn create_custom(&mut self, service: &TagService, name: &str) -> NotesResult<Tag> {
        let created = service.create_custom(name).await?;
        self.apply_created(created.clone());
        Ok(created)
    }

    pub async fn delete(&mut self, service: &TagService, id: i64) -> NotesResult<()> {
        service.delete_by_id(id).await?;
        self.apply_deleted(id);
        Ok(())
    }
}

impl HeldCollection<Category> {
    pub async fn refresh(&mut self, service: &CategoryService) -> NotesResult<()> {
        match service.list_all().await {
            Ok(categories) => {
                self.replace_all(categories);
                Ok(())
            }
            Err(e) => {
                self.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create(
        &mut self,
        service: &CategoryService,
        category: &NewCategory,
    ) -> NotesResult<Category> {
        let created = service.create(category).await?;
        self.apply_created(created.clone());
        Ok(created)
    }

    pub async fn update(
        &mut self,
        service: &CategoryService,
        id: i64,
        category: &NewCategory,
    ) -> NotesResult<Category> {
        let updated = service.update(id, category).await?;
        self.apply_updated(updated.clone());
        Ok(updated)
    }

    pub async fn delete(&mut self, service: &CategoryService, id: i64) -> NotesResult<()> {
        service.delete(id).await?;
        self.apply_deleted(id);
        Ok(())
    }
}
