use std::collections::BTreeMap;
use std::time::Instant;

use log::warn;

use crate::autosave::{Autosave, PendingSave};
use crate::service::{Backend, NotesService};
use crate::store::{KeyValueStore, ListQuery, sort_recent_first};
use crate::{Note, NoteDraft, NoteId};

/// Application state shared by the list, editor and tag sidebar views.
///
/// Holds the active filters, the notes they matched, the selection and the
/// editor's autosave state. Every change goes through the notes facade.
pub struct NotesSession<S: KeyValueStore> {
    service: NotesService<S>,
    query: ListQuery,
    notes: Vec<Note>,
    tags: Vec<String>,
    selected: Option<NoteId>,
    autosave: Autosave,
    last_backend: Option<Backend>,
}

impl<S: KeyValueStore> NotesSession<S> {
    /// Creates a session with default autosave settings. Nothing is loaded yet.
    pub fn new(service: NotesService<S>) -> Self {
        Self::with_autosave(service, Autosave::default())
    }

    /// Creates a session with a configured autosave.
    pub fn with_autosave(service: NotesService<S>, autosave: Autosave) -> Self {
        Self {
            service,
            query: ListQuery::all(),
            notes: Vec::new(),
            tags: Vec::new(),
            selected: None,
            autosave,
            last_backend: None,
        }
    }

    /// Returns the notes facade.
    pub fn service(&self) -> &NotesService<S> {
        &self.service
    }

    /// Notes matching the current filters, most recently updated first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Every known tag, sorted.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The active filters.
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// The selected note id, if any.
    pub fn selected_id(&self) -> Option<&NoteId> {
        self.selected.as_ref()
    }

    /// The selected note, if it is among the loaded notes.
    pub fn selected_note(&self) -> Option<&Note> {
        let id = self.selected.as_ref()?;
        self.notes.iter().find(|n| &n.id == id)
    }

    /// Editor state for the selected note.
    pub fn autosave(&self) -> &Autosave {
        &self.autosave
    }

    /// Mutable editor state, for feeding field edits.
    pub fn autosave_mut(&mut self) -> &mut Autosave {
        &mut self.autosave
    }

    /// Backend that served the most recent facade call.
    pub fn last_backend(&self) -> Option<Backend> {
        self.last_backend
    }

    /// Reloads notes and tags for the current filters.
    ///
    /// Keeps the selection if it is still listed, otherwise selects the first note.
    pub fn refresh(&mut self) {
        let served = self.service.list(&self.query);
        self.last_backend = Some(served.backend());
        self.notes = served.into_value();

        let still_listed = self
            .selected
            .as_ref()
            .is_some_and(|id| self.notes.iter().any(|n| &n.id == id));
        if !still_listed {
            let first = self.notes.first().map(|n| n.id.clone());
            self.select(first);
        }

        self.tags = self.service.list_all_tags().into_value();
    }

    /// Sets the search filter and reloads.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.refresh();
    }

    /// Sets the tag filter (empty for all notes) and reloads.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.query.tag = tag.into();
        self.refresh();
    }

    /// Selects a note and loads it into the editor.
    ///
    /// Under the flush switch policy, the previous note's unsaved edit is saved first.
    pub fn select(&mut self, id: Option<NoteId>) {
        self.selected = id;
        let note = self.selected_note().cloned();
        if let Some(save) = self.autosave.begin(note.as_ref()) {
            self.save(save);
        }
    }

    /// Creates an empty note, reloads, and selects it.
    pub fn new_note(&mut self) -> Note {
        let served = self.service.create(NoteDraft::new());
        self.last_backend = Some(served.backend());
        let note = served.into_value();

        self.refresh();
        self.select(Some(note.id.clone()));
        note
    }

    /// Deletes a note and reloads. A deleted selection moves to the first note.
    ///
    /// Returns `false` when the note was not deleted; the caller must tell the
    /// user so they do not assume it is gone.
    pub fn delete_note(&mut self, id: &NoteId) -> bool {
        let served = self.service.delete(id);
        self.last_backend = Some(served.backend());
        let deleted = served.into_value();
        if !deleted {
            warn!("note {id} was not deleted");
        }

        self.refresh();
        deleted
    }

    /// Issues the editor save if its quiet period has elapsed by `now`.
    ///
    /// Returns the saved note when an update went through.
    pub fn tick_at(&mut self, now: Instant) -> Option<Note> {
        let save = self.autosave.take_due_at(now)?;
        self.save(save)
    }

    /// Issues the editor save if it is due.
    pub fn tick(&mut self) -> Option<Note> {
        self.tick_at(Instant::now())
    }

    fn save(&mut self, save: PendingSave) -> Option<Note> {
        let served = self.service.update(&save.id, &save.update);
        self.last_backend = Some(served.backend());
        let updated = served.into_value()?;

        if let Some(slot) = self.notes.iter_mut().find(|n| n.id == updated.id) {
            *slot = updated.clone();
            sort_recent_first(&mut self.notes);
        }
        if save.update.tags.is_some() {
            self.tags = self.service.list_all_tags().into_value();
        }
        Some(updated)
    }

    /// Number of loaded notes carrying each tag.
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.notes.iter().flat_map(|n| &n.tags) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Sum of all per-tag counts over the loaded notes.
    pub fn total_tag_count(&self) -> usize {
        self.tag_counts().values().sum()
    }
}
