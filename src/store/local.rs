use log::{error, info, warn};
use serde_json::Value;
use time::OffsetDateTime;

use super::{KeyValueStore, ListQuery, StoreError, filter_notes};
use crate::{Note, NoteDraft, NoteId, NoteUpdate, RawNote};

/// Storage slot holding the serialized note collection.
pub const STORAGE_KEY: &str = "notes_local_v1";

/// The note collection kept in a local key/value store.
///
/// Every operation is a full read-modify-write of the whole collection. An
/// unreadable slot reads as empty, and a failed write is logged and dropped,
/// so none of these methods can fail.
pub struct LocalNotes<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> LocalNotes<'a, S> {
    /// Wraps a key/value store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reads and normalizes the stored collection in stored order.
    ///
    /// Records stored without an id are given a fresh local id, and the
    /// repaired collection is written back so the id stays stable.
    pub fn read(&self) -> Vec<Note> {
        match self.try_read() {
            Ok((notes, false)) => notes,
            Ok((notes, true)) => {
                info!("assigned ids to local notes stored without one");
                self.write(&notes);
                notes
            }
            Err(e) => {
                warn!("local note store unreadable, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    fn try_read(&self) -> Result<(Vec<Note>, bool), StoreError> {
        let Some(raw) = self.store.get(STORAGE_KEY)? else {
            return Ok((Vec::new(), false));
        };
        if raw.trim().is_empty() {
            return Ok((Vec::new(), false));
        }
        let parsed: Value = serde_json::from_str(&raw)?;
        let Value::Array(items) = parsed else {
            warn!("local note store does not hold a list, treating as empty");
            return Ok((Vec::new(), false));
        };

        let mut repaired = false;
        let mut notes: Vec<Note> = Vec::with_capacity(items.len());
        for mut record in items.into_iter().filter_map(RawNote::from_value) {
            if !record.has_usable_id() {
                let id = self.fresh_id(&notes);
                record.id = Value::from(id.as_str());
                repaired = true;
            }
            notes.extend(record.normalize());
        }
        Ok((notes, repaired))
    }

    /// Replaces the stored collection.
    pub fn write(&self, notes: &[Note]) {
        let result = serde_json::to_string(notes)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set(STORAGE_KEY, &json));
        if let Err(e) = result {
            error!("failed to write local note store: {e}");
        }
    }

    /// Lists notes matching `query`, most recently updated first.
    pub fn list(&self, query: &ListQuery) -> Vec<Note> {
        filter_notes(self.read(), query)
    }

    /// Creates a note with a fresh local id and puts it at the head of the collection.
    pub fn create(&self, draft: NoteDraft, now: OffsetDateTime) -> Note {
        let mut notes = self.read();
        let note = draft.into_note(self.fresh_id(&notes), now);
        notes.insert(0, note.clone());
        self.write(&notes);
        note
    }

    /// Applies `update` to the note with `id` in place.
    ///
    /// Returns `None` when no such note is stored.
    pub fn update(&self, id: &NoteId, update: &NoteUpdate, now: OffsetDateTime) -> Option<Note> {
        let mut notes = self.read();
        let slot = notes.iter_mut().find(|n| &n.id == id)?;
        let updated = update.apply_to(slot, now);
        *slot = updated.clone();
        self.write(&notes);
        Some(updated)
    }

    /// Removes the note with `id`. Removing an absent id is a no-op.
    pub fn delete(&self, id: &NoteId) -> bool {
        let mut notes = self.read();
        notes.retain(|n| &n.id != id);
        self.write(&notes);
        true
    }

    fn fresh_id(&self, existing: &[Note]) -> NoteId {
        loop {
            let id = NoteId::generate_local();
            if existing.iter().all(|n| n.id != id) {
                return id;
            }
        }
    }
}
