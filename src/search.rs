//! Search functionality for notes.
//!
//! A search picks exactly one filter dimension, in strict priority order:
//! 1. tag names (any selected tag matches)
//! 2. category
//! 3. title keyword
//! 4. nothing: all notes
//!
//! Lower-priority filters are ignored when a higher one is set; they are not
//! combined.

use serde::{Deserialize, Serialize};

use crate::error::NotesResult;
use crate::models::Note;
use crate::services::NoteService;

/// What the user asked to search for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Selected tag names
    pub tags: Vec<String>,
    /// Selected category name
    pub category: Option<String>,
    /// Title keyword
    pub title: Option<String>,
}

/// The single filter a search will apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    ByTags(Vec<String>),
    ByCategory(String),
    ByTitle(String),
    All,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Check if search has any criteria
    pub fn is_empty(&self) -> bool {
        self.plan() == SearchPlan::All
    }

    /// Decide which single filter applies.
    pub fn plan(&self) -> SearchPlan {
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        if !tags.is_empty() {
            SearchPlan::ByTags(tags)
        } else if let Some(category) = non_blank(&self.category) {
            SearchPlan::ByCategory(category.to_string())
        } else if let Some(title) = non_blank(&self.title) {
            SearchPlan::ByTitle(title.to_string())
        } else {
            SearchPlan::All
        }
    }
}

/// Parse search input into criteria.
///
/// Supports:
/// - tag:name, repeatable
/// - category:name, the last one wins
/// - Free text, used as the title keyword
pub fn parse_search_input(search_input: &str) -> SearchCriteria {
    let mut criteria = SearchCriteria::new();
    let mut text_words = Vec::new();

    for word in search_input.split_whitespace() {
        let lower = word.to_lowercase();
        if lower.starts_with("tag:") {
            let tag_name = &word[4..];
            if !tag_name.is_empty() {
                criteria.tags.push(tag_name.to_string());
            }
        } else if lower.starts_with("category:") {
            let category = &word[9..];
            if !category.is_empty() {
                criteria.category = Some(category.to_string());
            }
        } else {
            text_words.push(word);
        }
    }

    if !text_words.is_empty() {
        criteria.title = Some(text_words.join(" "));
    }
    criteria
}

/// Notes with at least one tag named in `tag_names`.
pub fn filter_by_tags(notes: &[Note], tag_names: &[String]) -> Vec<Note> {
    notes
        .iter()
        .filter(|note| {
            note.tags
                .iter()
                .any(|tag| tag_names.iter().any(|name| *name == tag.name))
        })
        .cloned()
        .collect()
}

/// Notes whose category name contains `category`, ignoring case.
///
/// Notes without a category never match.
pub fn filter_by_category(notes: &[Note], category: &str) -> Vec<Note> {
    let needle = category.to_lowercase();
    notes
        .iter()
        .filter(|note| {
            note.category_name()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Notes whose title contains `keyword`, ignoring case.
pub fn filter_by_title(notes: &[Note], keyword: &str) -> Vec<Note> {
    let needle = keyword.to_lowercase();
    notes
        .iter()
        .filter(|note| note.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Execute a search against the notes service.
pub async fn execute_search(notes: &NoteService, criteria: &SearchCriteria) -> NotesResult<Vec<Note>> {
    let plan = criteria.plan();
    tracing::debug!("Executing search plan {:?}", plan);

    match plan {
        SearchPlan::ByTags(tags) => notes.search_by_tags(&tags).await,
        SearchPlan::ByCategory(category) => notes.search_by_category(&category).await,
        SearchPlan::ByTitle(title) => {
            let all = notes.list_all().await?;
            Ok(filter_by_title(&all, &title))
        }
        SearchPlan::All => notes.list_all().await,
    }
}
