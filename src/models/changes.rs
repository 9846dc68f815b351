use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::raw_note::coerce_tags;
use super::{DEFAULT_TITLE, Note, NoteBuilder, NoteId};

/// Inputs for creating a note. Every field is optional and defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteDraft {
    /// Creates an empty draft (`"Untitled"`, no content, no tags).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the tags.
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the note that the local store persists for this draft.
    pub fn into_note(self, id: NoteId, now: OffsetDateTime) -> Note {
        NoteBuilder::new()
            .id(id)
            .title(self.title.unwrap_or_default())
            .content(self.content.unwrap_or_default())
            .tags(self.tags.unwrap_or_default())
            .created_at(now)
            .updated_at(now)
            .build()
    }

    /// Row payload sent to the remote table on insert.
    pub fn to_row(&self, now: OffsetDateTime) -> Value {
        let stamp = format_timestamp(now);
        json!({
            "title": self.title.as_deref().unwrap_or(DEFAULT_TITLE),
            "content": self.content.as_deref().unwrap_or_default(),
            "tags": self.tags.clone().unwrap_or_default(),
            "created_at": stamp,
            "updated_at": stamp,
        })
    }
}

/// Partial changes to an existing note.
///
/// Absent fields are left untouched. `updated_at` is always refreshed by the
/// operation applying the update, even when no field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteUpdate {
    /// Creates an update that changes nothing but the update timestamp.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the new content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the new tags.
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Reads an update from loosely typed JSON.
    ///
    /// `title` and `content` are taken only when they are strings and `tags`
    /// only when it is an array; fields of any other type are ignored.
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);
        let tags = value
            .get("tags")
            .filter(|v| v.is_array())
            .map(coerce_tags);

        Self {
            title: text("title"),
            content: text("content"),
            tags,
        }
    }

    /// Returns `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    /// Applies the update to a note, refreshing `updated_at` to `now`.
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply_to(&self, note: &Note, now: OffsetDateTime) -> Note {
        let mut builder = NoteBuilder::new()
            .id(note.id.clone())
            .title(self.title.clone().unwrap_or_else(|| note.title.clone()))
            .content(self.content.clone().unwrap_or_else(|| note.content.clone()))
            .created_at(note.created_at)
            .updated_at(now);
        builder = match &self.tags {
            Some(tags) => builder.tags(tags.iter().cloned()),
            None => builder.tags(note.tags.iter().cloned()),
        };
        builder.build()
    }

    /// Row payload sent to the remote table: provided fields plus `updated_at`.
    pub fn to_row(&self, now: OffsetDateTime) -> Value {
        let mut row = Map::new();
        if let Some(title) = &self.title {
            row.insert("title".into(), Value::from(title.as_str()));
        }
        if let Some(content) = &self.content {
            row.insert("content".into(), Value::from(content.as_str()));
        }
        if let Some(tags) = &self.tags {
            row.insert("tags".into(), Value::from(tags.clone()));
        }
        row.insert("updated_at".into(), Value::from(format_timestamp(now)));
        Value::Object(row)
    }
}

/// Formats a timestamp the way rows carry it (RFC 3339, UTC).
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn draft_defaults_fill_missing_fields() {
        let now = datetime!(2024-06-01 09:00:00 UTC);
        let note = NoteDraft::new().into_note(NoteId::new("id-1"), now);

        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "");
        assert!(note.tags.is_empty());
        assert_eq!(note.created_at, now);
        assert_eq!(note.updated_at, now);
    }

    #[test]
    fn draft_row_carries_both_timestamps() {
        let now = datetime!(2024-06-01 09:00:00 UTC);
        let row = NoteDraft::new().title("Plan").tags(["work"]).to_row(now);

        assert_eq!(row["title"], "Plan");
        assert_eq!(row["content"], "");
        assert_eq!(row["tags"], json!(["work"]));
        assert_eq!(row["created_at"], "2024-06-01T09:00:00Z");
        assert_eq!(row["updated_at"], row["created_at"]);
    }

    #[test]
    fn from_json_ignores_wrongly_typed_fields() {
        let update = NoteUpdate::from_json(&json!({
            "title": 12,
            "content": "body",
            "tags": "a,b",
            "id": "hijack"
        }));

        assert_eq!(update.title, None);
        assert_eq!(update.content.as_deref(), Some("body"));
        assert_eq!(update.tags, None);
    }

    #[test]
    fn from_json_accepts_tag_arrays() {
        let update = NoteUpdate::from_json(&json!({ "tags": ["a", "", "b"] }));
        assert_eq!(update.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn apply_keeps_identity_and_creation_time() {
        let created = datetime!(2024-01-01 00:00:00 UTC);
        let now = datetime!(2024-01-05 00:00:00 UTC);
        let note = NoteBuilder::new()
            .id("n")
            .title("Old")
            .content("keep")
            .tags(["t"])
            .created_at(created)
            .build();

        let updated = NoteUpdate::new().title("New").apply_to(&note, now);

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "keep");
        assert_eq!(updated.tags, vec!["t"]);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, now);
    }

    #[test]
    fn update_row_contains_only_provided_fields() {
        let now = datetime!(2024-01-05 00:00:00 UTC);
        let row = NoteUpdate::new().content("x").to_row(now);
        let object = row.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(row["content"], "x");
        assert_eq!(row["updated_at"], "2024-01-05T00:00:00Z");
    }

    #[test]
    fn empty_update_reports_empty() {
        assert!(NoteUpdate::new().is_empty());
        assert!(!NoteUpdate::new().tags(Vec::<String>::new()).is_empty());
    }
}
