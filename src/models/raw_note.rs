//! Permissive record shape and the normalization into [`Note`].
//!
//! Remote rows and legacy local entries do not agree on field types: tags may
//! be an array or a comma-separated string, timestamps may be strings or epoch
//! milliseconds, ids may be integers. Everything goes through [`RawNote`]
//! before it crosses the facade.

use log::warn;
use serde::Deserialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::{DEFAULT_TITLE, Note, NoteId};

/// A note record as found in storage, with no shape guarantees.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawNote {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub tags: Value,
    #[serde(default)]
    pub created_at: Value,
    #[serde(default)]
    pub updated_at: Value,
}

impl RawNote {
    /// Parses a raw record from an arbitrary JSON value.
    ///
    /// Returns `None` when the value is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Returns `true` when the id field can address a note.
    pub fn has_usable_id(&self) -> bool {
        coerce_id(&self.id).is_some()
    }

    /// Normalizes the record using the current time for missing timestamps.
    pub fn normalize(self) -> Option<Note> {
        self.normalize_at(OffsetDateTime::now_utc())
    }

    /// Normalizes the record into the canonical note shape.
    ///
    /// Returns `None` when the record has no usable id, since such a note
    /// could never be updated or deleted.
    pub fn normalize_at(self, now: OffsetDateTime) -> Option<Note> {
        let Some(id) = coerce_id(&self.id) else {
            warn!("dropping note record without a usable id: {:?}", self.id);
            return None;
        };

        let title = match self.title {
            Value::String(s) if !s.is_empty() => s,
            _ => DEFAULT_TITLE.to_string(),
        };
        let content = match self.content {
            Value::String(s) => s,
            _ => String::new(),
        };

        Some(Note {
            id,
            title,
            content,
            tags: coerce_tags(&self.tags),
            created_at: coerce_timestamp(&self.created_at).unwrap_or(now),
            updated_at: coerce_timestamp(&self.updated_at).unwrap_or(now),
        })
    }
}

/// Coerces a tags field into a clean tag list.
///
/// Arrays keep their order with each element stringified; strings are split
/// on commas. Blank and null entries are dropped. Anything else is empty.
pub fn coerce_tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_tag).collect(),
        Value::String(s) => parse_tag_list(s),
        _ => Vec::new(),
    }
}

/// Splits a comma-separated tag string, trimming and dropping empty entries.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn coerce_tag(value: &Value) -> Option<String> {
    let tag = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!tag.is_empty()).then_some(tag)
}

fn coerce_id(value: &Value) -> Option<NoteId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(NoteId::new(s.clone())),
        Value::Number(n) => Some(NoteId::new(n.to_string())),
        _ => None,
    }
}

/// Reads an RFC 3339 string or epoch-milliseconds number, in UTC.
///
/// Strings without an offset, as a `timestamp` column returns them, are
/// taken to be UTC.
fn coerce_timestamp(value: &Value) -> Option<OffsetDateTime> {
    let without_offset =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
    let parsed = match value {
        Value::String(s) => OffsetDateTime::parse(s, &Rfc3339)
            .or_else(|_| PrimitiveDateTime::parse(s, without_offset).map(|t| t.assume_utc()))
            .ok()?,
        Value::Number(n) => {
            let millis = n.as_i64()?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?
        }
        _ => return None,
    };
    Some(parsed.to_offset(time::UtcOffset::UTC))
}
