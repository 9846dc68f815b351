use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::NoteId;

/// Title given to notes that arrive without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A note in its canonical shape.
///
/// Every note handed out by the facade has been normalized: the title is
/// never empty, tags contain no blank entries, and both timestamps are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Opaque unique identifier.
    pub id: NoteId,
    /// The note's title.
    pub title: String,
    /// The note's body text.
    pub content: String,
    /// Ordered tag names.
    pub tags: Vec<String>,
    /// When this note was created. Never changes afterwards.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When this note was last created or updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Note {
    /// Returns `true` if the note carries `tag`, ignoring ASCII and Unicode case.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Returns `true` if `needle` (already lowercased) occurs in the title or content.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }
}

/// Builder for constructing `Note` instances with optional fields.
///
/// # Examples
///
/// ```
/// use notekeeper::NoteBuilder;
///
/// let note = NoteBuilder::new()
///     .id("n1")
///     .title("Groceries")
///     .build();
///
/// assert_eq!(note.id.as_str(), "n1");
/// assert_eq!(note.content, "");
/// assert!(note.tags.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NoteBuilder {
    id: Option<NoteId>,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the note ID.
    pub fn id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the note title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the note content.
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

    /// Sets the created timestamp.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the updated timestamp.
    pub fn updated_at(mut self, updated_at: OffsetDateTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the `Note`, using defaults for optional fields.
    ///
    /// An empty title becomes `"Untitled"` and blank tags are dropped, so the
    /// result is always in canonical shape.
    ///
    /// # Panics
    ///
    /// Panics if `id` has not been set.
    pub fn build(self) -> Note {
        let now = OffsetDateTime::now_utc();
        let created_at = self.created_at.unwrap_or(now);
        Note {
            id: self.id.expect("id is required"),
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: self.content.unwrap_or_default(),
            tags: self
                .tags
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_note_builder_applies_defaults() {
        let note = NoteBuilder::new().id("1").build();

        assert_eq!(note.id, NoteId::new("1"));
        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "");
        assert!(note.tags.is_empty());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_note_builder_drops_blank_tags() {
        let note = NoteBuilder::new()
            .id("1")
            .tags(["work", "  ", "", " home "])
            .build();

        assert_eq!(note.tags, vec!["work", "home"]);
    }

    #[test]
    fn test_note_serializes_timestamps_as_rfc3339() {
        let note = NoteBuilder::new()
            .id("1")
            .title("Dated")
            .created_at(datetime!(2024-03-01 12:00:00 UTC))
            .updated_at(datetime!(2024-03-02 08:30:00 UTC))
            .build();

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["created_at"], "2024-03-01T12:00:00Z");
        assert_eq!(json["updated_at"], "2024-03-02T08:30:00Z");
        assert_eq!(json["id"], "1");
    }

    #[test]
    fn test_has_tag_is_case_insensitive() {
        let note = NoteBuilder::new().id("1").tags(["Work"]).build();

        assert!(note.has_tag("work"));
        assert!(note.has_tag("WORK"));
        assert!(!note.has_tag("wor"));
    }

    #[test]
    fn test_matches_lowercase_checks_title_and_content() {
        let note = NoteBuilder::new()
            .id("1")
            .title("Groceries")
            .content("Milk, eggs")
            .build();

        assert!(note.matches_lowercase("grocer"));
        assert!(note.matches_lowercase("milk"));
        assert!(!note.matches_lowercase("bread"));
    }
}
