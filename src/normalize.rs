//! Payload normalization.
//!
//! The API does not serialize collection-typed fields the same way across
//! server versions: a note's `tags` may arrive as an array, as a keyed object
//! (`{"0": {...}, "1": {...}}`), as `null`, or be missing altogether. Every
//! ingress point runs through this module so the rest of the crate only ever
//! sees `Vec<Tag>`.
//!
//! Set-typed collections on the server serialize to JSON arrays and take the
//! sequence path. Keyed objects keep server order (`serde_json` is built with
//! `preserve_order`).

use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};

use crate::models::{Note, Tag};

/// Structural shape of a raw tag collection
#[derive(Debug)]
enum TagShape<'a> {
    Absent,
    Sequence(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Unsupported(&'a Value),
}

fn classify(input: Option<&Value>) -> TagShape<'_> {
    match input {
        None | Some(Value::Null) => TagShape::Absent,
        Some(Value::Array(items)) => TagShape::Sequence(items),
        Some(Value::Object(map)) => TagShape::Keyed(map),
        Some(other) => TagShape::Unsupported(other),
    }
}

fn tag_from_value(value: &Value) -> Option<Tag> {
    match value {
        Value::Null => None,
        Value::Object(_) => match serde_json::from_value::<Tag>(value.clone()) {
            Ok(tag) => Some(tag),
            Err(e) => {
                tracing::trace!("Dropping malformed tag {}: {}", value, e);
                None
            }
        },
        other => {
            tracing::trace!("Dropping non-object tag value {}", other);
            None
        }
    }
}

/// Turn any supported tag encoding into an ordered sequence of tags.
///
/// Never fails: unsupported shapes and malformed entries produce nothing.
/// Order is input order for sequences and value-iteration order for keyed
/// objects; null entries are dropped.
pub fn normalize_tag_collection(input: Option<&Value>) -> Vec<Tag> {
    match classify(input) {
        TagShape::Absent => Vec::new(),
        TagShape::Sequence(items) => items.iter().filter_map(tag_from_value).collect(),
        TagShape::Keyed(map) => map.values().filter_map(tag_from_value).collect(),
        TagShape::Unsupported(value) => {
            tracing::debug!("Unsupported tag collection shape: {}", value);
            Vec::new()
        }
    }
}

/// Normalize a single note-shaped payload.
///
/// All fields are kept as sent; only `tags` is replaced by its canonical form.
pub fn normalize_note(raw: &Value) -> Result<Note, serde_json::Error> {
    let object = raw
        .as_object()
        .ok_or_else(|| serde_json::Error::custom(format!("expected a note object, got {}", raw)))?;

    let mut copy = object.clone();
    let tags = normalize_tag_collection(object.get("tags"));
    copy.insert("tags".to_string(), serde_json::to_value(tags)?);

    serde_json::from_value(Value::Object(copy))
}

/// Normalize a note list payload.
///
/// Accepts a list or a bare note object (treated as a one-element list);
/// `null` yields an empty list.
pub fn normalize_note_list(raw: &Value) -> Result<Vec<Note>, serde_json::Error> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(normalize_note)
            .collect(),
        Value::Object(_) => Ok(vec![normalize_note(raw)?]),
        other => Err(serde_json::Error::custom(format!(
            "expected a list of notes, got {}",
            other
        ))),
    }
}

/// Normalize a list of plain entities (tags, categories), with the same
/// tolerance for a bare object as `normalize_note_list`.
pub fn normalize_entity_list<T: DeserializeOwned>(raw: &Value) -> Result<Vec<T>, serde_json::Error> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| serde_json::from_value(item.clone()))
            .collect(),
        Value::Object(_) => Ok(vec![serde_json::from_value(raw.clone())?]),
        other => Err(serde_json::Error::custom(format!(
            "expected a list, got {}",
            other
        ))),
    }
}

/// Build the wire body for a note, with `tags` in canonical array form.
pub fn outgoing_note(note: &Note) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(note)?;
    if let Value::Object(map) = &mut value {
        let tags = normalize_tag_collection(map.get("tags"));
        map.insert("tags".to_string(), serde_json::to_value(tags)?);
    }
    Ok(value)
}
