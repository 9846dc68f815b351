use crate::Note;

/// Filters for listing notes. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring matched against title or content.
    pub search: String,
    /// Case-insensitive exact tag membership.
    pub tag: String,
}

impl ListQuery {
    /// A query with no filters.
    pub fn all() -> Self {
        Self::default()
    }

    /// Sets the free-text search term.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the tag filter.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// The search term with surrounding whitespace removed.
    pub fn search_term(&self) -> &str {
        self.search.trim()
    }

    /// The tag filter with surrounding whitespace removed.
    pub fn tag_term(&self) -> &str {
        self.tag.trim()
    }

    /// Returns `true` when neither filter is set.
    pub fn is_unfiltered(&self) -> bool {
        self.search_term().is_empty() && self.tag_term().is_empty()
    }
}

/// Applies search and tag filters, then sorts by `updated_at` descending.
///
/// The sort is stable, so notes with equal timestamps keep their stored order.
pub fn filter_notes(mut notes: Vec<Note>, query: &ListQuery) -> Vec<Note> {
    if query.is_unfiltered() {
        sort_recent_first(&mut notes);
        return notes;
    }

    let term = query.search_term().to_lowercase();
    let tag = query.tag_term();

    let mut matched: Vec<Note> = notes
        .into_iter()
        .filter(|n| term.is_empty() || n.matches_lowercase(&term))
        .filter(|n| tag.is_empty() || n.has_tag(tag))
        .collect();
    sort_recent_first(&mut matched);
    matched
}

/// Sorts notes most recently updated first.
pub fn sort_recent_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
