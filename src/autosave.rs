//! Debounced saving of editor changes.
//!
//! The editor holds a draft of the selected note. Every edit restarts a quiet
//! timer; once the timer has run out the draft is handed back as a single
//! [`PendingSave`]. The caller polls with [`Autosave::take_due`] from its event
//! loop, the same way the list search is debounced.

use std::time::{Duration, Instant};

use log::debug;

use crate::{Note, NoteId, NoteUpdate, parse_tag_list};

/// Quiet period before a draft is saved.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// What happens to an unsaved draft when another note is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchPolicy {
    /// Drop the pending edit. Edits made within the quiet period before a
    /// switch are lost.
    #[default]
    Discard,
    /// Hand the pending edit back to the caller so it can be saved.
    Flush,
}

/// Field values currently shown in the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorDraft {
    pub title: String,
    pub content: String,
    /// Tags as typed: comma-separated.
    pub tags_input: String,
}

impl EditorDraft {
    /// Loads the draft from a stored note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags_input: note.tags.join(", "),
        }
    }

    /// The update that saves every field of this draft.
    pub fn to_update(&self) -> NoteUpdate {
        NoteUpdate::new()
            .title(self.title.clone())
            .content(self.content.clone())
            .tags(parse_tag_list(&self.tags_input))
    }
}

/// An update ready to be issued for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub id: NoteId,
    pub update: NoteUpdate,
}

/// Per-note debouncer for editor saves.
#[derive(Debug, Clone)]
pub struct Autosave {
    delay: Duration,
    policy: SwitchPolicy,
    note_id: Option<NoteId>,
    draft: EditorDraft,
    changed_at: Option<Instant>,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Autosave {
    /// Creates a debouncer with the given quiet period and the `Discard` policy.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            policy: SwitchPolicy::default(),
            note_id: None,
            draft: EditorDraft::default(),
            changed_at: None,
        }
    }

    /// Sets the policy applied to unsaved edits on note switch.
    pub fn with_switch_policy(mut self, policy: SwitchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The switch policy.
    pub fn switch_policy(&self) -> SwitchPolicy {
        self.policy
    }

    /// The note being edited, if any.
    pub fn current_note(&self) -> Option<&NoteId> {
        self.note_id.as_ref()
    }

    /// The editor's current field values.
    pub fn draft(&self) -> &EditorDraft {
        &self.draft
    }

    /// Starts editing `note` (or nothing), replacing the current draft.
    ///
    /// Re-selecting the note already being edited keeps the draft. Under
    /// `Flush` the previous note's unsaved edit is returned.
    pub fn begin(&mut self, note: Option<&Note>) -> Option<PendingSave> {
        let next = note.map(|n| &n.id);
        if next.is_some() && next == self.note_id.as_ref() {
            return None;
        }

        let flushed = match self.policy {
            SwitchPolicy::Flush => self.take_pending(),
            SwitchPolicy::Discard => {
                if let (true, Some(id)) = (self.is_dirty(), &self.note_id) {
                    debug!("discarding unsaved edit of note {id} on switch");
                }
                None
            }
        };

        self.note_id = note.map(|n| n.id.clone());
        self.draft = note.map(EditorDraft::from_note).unwrap_or_default();
        self.changed_at = None;
        flushed
    }

    /// Replaces the title field.
    pub fn edit_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
        self.touch();
    }

    /// Replaces the content field.
    pub fn edit_content(&mut self, content: impl Into<String>) {
        self.draft.content = content.into();
        self.touch();
    }

    /// Replaces the comma-separated tags field.
    pub fn edit_tags_input(&mut self, tags: impl Into<String>) {
        self.draft.tags_input = tags.into();
        self.touch();
    }

    fn touch(&mut self) {
        if self.note_id.is_some() {
            self.changed_at = Some(Instant::now());
        }
    }

    /// Returns `true` while an edit is waiting to be saved.
    pub fn is_dirty(&self) -> bool {
        self.changed_at.is_some()
    }

    /// Returns `true` if an edit is pending and the quiet period had elapsed by `now`.
    pub fn is_due_at(&self, now: Instant) -> bool {
        match self.changed_at {
            Some(changed_at) => now.saturating_duration_since(changed_at) >= self.delay,
            None => false,
        }
    }

    /// Returns `true` if an edit is pending and the quiet period has elapsed.
    pub fn is_due(&self) -> bool {
        self.is_due_at(Instant::now())
    }

    /// Takes the pending save if it was due at `now`.
    pub fn take_due_at(&mut self, now: Instant) -> Option<PendingSave> {
        if !self.is_due_at(now) {
            return None;
        }
        self.take_pending()
    }

    /// Takes the pending save if it is due.
    pub fn take_due(&mut self) -> Option<PendingSave> {
        self.take_due_at(Instant::now())
    }

    /// Cancels any pending save without issuing it.
    pub fn clear(&mut self) {
        self.changed_at = None;
    }

    fn take_pending(&mut self) -> Option<PendingSave> {
        self.changed_at.take()?;
        let id = self.note_id.clone()?;
        Some(PendingSave {
            id,
            update: self.draft.to_update(),
        })
    }
}
