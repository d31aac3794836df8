//! Data models for the notes client.
//!
//! This module defines the entities exchanged with the API: Note, Tag and
//! Category. Ids are server-assigned integers; a Note or Tag without an id is
//! a draft that has not been persisted yet.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents a note.
///
/// Tags and category are embedded by value, the way the API transmits them.
/// Fields the API sends that this client does not model are kept in `extra`
/// so an update never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Server-assigned identifier (None for a draft)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Ordered tags; no two share a name
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    /// Create a new draft note
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            category: None,
            extra: Map::new(),
        }
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Attach a tag by name.
    ///
    /// The name is trimmed; empty names and names already present are ignored.
    /// Returns whether the tag was added.
    pub fn add_tag(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.attach_tag(Tag::named(name))
    }

    /// Attach a tag unless the note already carries the same tag.
    ///
    /// Returns whether the tag was added.
    pub fn attach_tag(&mut self, tag: Tag) -> bool {
        if self.tags.iter().any(|t| t.same_as(&tag) || t.name == tag.name) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Detach every tag with the given name. Returns whether anything changed.
    pub fn remove_tag(&mut self, name: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.name != name);
        self.tags.len() != before
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// Represents a tag.
///
/// System tags are a fixed predefined set; they cannot be edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_false",
        skip_serializing_if = "is_false"
    )]
    pub is_system_tag: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Some servers send `"isSystemTag": null` for custom tags
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

impl Tag {
    /// Create an unpersisted custom tag
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_system_tag: false,
        }
    }

    pub fn system(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            is_system_tag: true,
        }
    }

    /// Check if two tags denote the same tag (by id when both have one, else by name)
    pub fn same_as(&self, other: &Tag) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name,
        }
    }

    /// System tags must never be offered for deletion
    pub fn is_deletable(&self) -> bool {
        !self.is_system_tag && self.id.is_some()
    }
}

/// Represents a category a note may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Category body for create and update requests (the id travels in the path)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_draft() {
        let note = Note::new("Groceries", "milk");

        assert!(note.id.is_none());
        assert!(note.tags.is_empty());
        assert!(note.category.is_none());
    }

    #[test]
    fn test_add_tag_trims_and_dedupes() {
        let mut note = Note::new("T", "");

        assert!(note.add_tag("  work "));
        assert!(!note.add_tag("work"));
        assert!(!note.add_tag("   "));
        assert!(note.add_tag("idea"));

        assert_eq!(note.tag_names(), vec!["work", "idea"]);
    }

    #[test]
    fn test_remove_tag() {
        let mut note = Note::new("T", "");
        note.add_tag("work");
        note.add_tag("idea");

        assert!(note.remove_tag("work"));
        assert!(!note.remove_tag("work"));
        assert_eq!(note.tag_names(), vec!["idea"]);
    }

    #[test]
    fn test_attach_tag_matches_by_id_then_name() {
        let mut note = Note::new("T", "");

        assert!(note.attach_tag(Tag::system(4, "work")));
        assert!(!note.attach_tag(Tag::named("work")));
        assert!(!note.attach_tag(Tag {
            id: Some(4),
            name: "Work".to_string(),
            is_system_tag: true,
        }));
        assert!(note.attach_tag(Tag::system(5, "idea")));
        assert!(!note.add_tag("idea"));

        assert_eq!(note.tag_names(), vec!["work", "idea"]);
        assert_eq!(note.tags[0].id, Some(4));
    }

    #[test]
    fn test_tag_same_as() {
        let persisted = Tag::system(4, "work");
        let renamed = Tag {
            id: Some(4),
            name: "Work".to_string(),
            is_system_tag: true,
        };
        assert!(persisted.same_as(&renamed));
        assert!(persisted.same_as(&Tag::named("work")));
        assert!(!Tag::system(5, "work").same_as(&persisted));
    }

    #[test]
    fn test_system_tags_not_deletable() {
        assert!(!Tag::system(1, "important").is_deletable());
        assert!(!Tag::named("draft").is_deletable());
        let custom = Tag {
            id: Some(9),
            name: "books".to_string(),
            is_system_tag: false,
        };
        assert!(custom.is_deletable());
    }

    #[test]
    fn test_draft_serializes_without_id() {
        let mut note = Note::new("A", "x");
        note.add_tag("work");
        let value = serde_json::to_value(&note).unwrap();

        assert_eq!(
            value,
            json!({"title": "A", "content": "x", "tags": [{"name": "work"}], "category": null})
        );
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": 3,
            "title": "A",
            "content": "",
            "tags": [],
            "category": null,
            "createdAt": "2025-01-01T00:00:00"
        });
        let note: Note = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(note.extra.get("createdAt"), Some(&json!("2025-01-01T00:00:00")));
        assert_eq!(serde_json::to_value(&note).unwrap(), raw);
    }

    #[test]
    fn test_tag_wire_names() {
        let tag: Tag = serde_json::from_value(json!({"id": 1, "name": "urgent", "isSystemTag": true}))
            .unwrap();
        assert!(tag.is_system_tag);

        let tag: Tag = serde_json::from_value(json!({"name": "mine"})).unwrap();
        assert!(!tag.is_system_tag);
        assert!(tag.id.is_none());
    }

    #[test]
    fn test_null_system_flag_reads_as_custom() {
        let tag: Tag =
            serde_json::from_value(json!({"id": 4, "name": "work", "isSystemTag": null})).unwrap();
        assert_eq!(tag.id, Some(4));
        assert!(!tag.is_system_tag);
    }
}
