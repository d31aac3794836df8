//! Input validation for the notes client.
//!
//! These checks run before any request is issued, so a rejected input never
//! reaches the network. All validators return NotesError::Validation on failure.

use crate::error::{NotesError, NotesResult};
use crate::models::{NewCategory, Note};

pub const MAX_TAG_NAME_LENGTH: usize = 100;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_NOTE_CONTENT_LENGTH: usize = 100_000; // 100KB of text
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// Validate a tag name and return it trimmed.
pub fn validate_tag_name(name: &str) -> NotesResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NotesError::validation("name", "tag name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(NotesError::validation(
            "name",
            format!("tag name exceeds maximum length of {}", MAX_TAG_NAME_LENGTH),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a server-assigned id.
pub fn validate_id(id: i64, field_name: &str) -> NotesResult<i64> {
    if id <= 0 {
        return Err(NotesError::validation(
            field_name,
            format!("must be a positive integer, got {}", id),
        ));
    }
    Ok(id)
}

pub fn validate_note_title(title: &str) -> NotesResult<()> {
    if title.trim().is_empty() {
        return Err(NotesError::validation("title", "title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(NotesError::validation(
            "title",
            format!("title exceeds maximum length of {}", MAX_TITLE_LENGTH),
        ));
    }
    Ok(())
}

pub fn validate_note_content(content: &str) -> NotesResult<()> {
    if content.len() > MAX_NOTE_CONTENT_LENGTH {
        return Err(NotesError::validation(
            "content",
            format!(
                "content exceeds maximum length of {} bytes",
                MAX_NOTE_CONTENT_LENGTH
            ),
        ));
    }
    Ok(())
}

/// Validate a note draft before it is sent for creation.
pub fn validate_note_draft(note: &Note) -> NotesResult<()> {
    if note.id.is_some() {
        return Err(NotesError::validation(
            "id",
            "a new note must not carry an id",
        ));
    }
    validate_note_fields(note)
}

/// Validate a persisted note before it is sent as an update.
///
/// Returns the note id.
pub fn validate_note_update(note: &Note) -> NotesResult<i64> {
    let id = note
        .id
        .ok_or_else(|| NotesError::validation("id", "cannot update a note without an id"))?;
    validate_id(id, "id")?;
    validate_note_fields(note)?;
    Ok(id)
}

fn validate_note_fields(note: &Note) -> NotesResult<()> {
    validate_note_title(&note.title)?;
    validate_note_content(&note.content)?;
    for tag in &note.tags {
        validate_tag_name(&tag.name)?;
    }
    Ok(())
}

pub fn validate_category(category: &NewCategory) -> NotesResult<()> {
    let name = category.name.trim();
    if name.is_empty() {
        return Err(NotesError::validation("name", "category name cannot be empty"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(NotesError::validation(
            "name",
            format!(
                "category name exceeds maximum length of {}",
                MAX_CATEGORY_NAME_LENGTH
            ),
        ));
    }
    Ok(())
}
