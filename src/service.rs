//! Notes facade: one entry point for note CRUD over the remote or local store.
//!
//! Each operation resolves its backend independently through the configured
//! [`RemoteProvider`]. List, create and update fall back to the local store
//! when the remote call fails. Delete never falls back: removing a note only
//! locally while the remote still holds it would resurrect it later.
//!
//! No operation returns an error. Failures are logged and show up only as
//! `None` (update not found) or `false` (delete failed).

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, error, warn};
use time::OffsetDateTime;

use crate::config::{EnvRemoteProvider, LocalOnly, RemoteProvider};
use crate::remote::{RemoteError, RemoteSource};
use crate::store::{KeyValueStore, ListQuery, LocalNotes, filter_notes};
use crate::{Note, NoteDraft, NoteId, NoteUpdate, RawNote};

/// Which backend produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The hosted table answered.
    Remote,
    /// The hosted table is configured but failed; the local store answered.
    Fallback,
    /// No hosted table is configured; the local store answered.
    Local,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Fallback => write!(f, "fallback"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A facade result tagged with the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served<T> {
    value: T,
    backend: Backend,
}

impl<T> Served<T> {
    /// Wraps a value produced by `backend`.
    pub fn new(value: T, backend: Backend) -> Self {
        Self { value, backend }
    }

    /// Borrows the value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwraps the value, discarding the backend tag.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The backend that produced the value.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Returns `true` when the remote failed and the local store answered instead.
    pub fn is_fallback(&self) -> bool {
        self.backend == Backend::Fallback
    }

    /// Maps the value, keeping the backend tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Served<U> {
        Served {
            value: f(self.value),
            backend: self.backend,
        }
    }
}

/// Facade over note persistence.
///
/// # Examples
///
/// ```
/// use notekeeper::{ListQuery, MemoryStore, NoteDraft, NotesService};
///
/// let service = NotesService::local_only(MemoryStore::new());
/// let note = service.create(NoteDraft::new().title("Groceries")).into_value();
///
/// let listed = service.list(&ListQuery::all().search("grocer")).into_value();
/// assert_eq!(listed, vec![note]);
/// ```
pub struct NotesService<S: KeyValueStore> {
    store: S,
    provider: Box<dyn RemoteProvider>,
}

impl<S: KeyValueStore> NotesService<S> {
    /// Creates a facade that reads remote settings from the environment on every call.
    pub fn new(store: S) -> Self {
        Self::with_provider(store, EnvRemoteProvider)
    }

    /// Creates a facade that never contacts a remote backend.
    pub fn local_only(store: S) -> Self {
        Self::with_provider(store, LocalOnly)
    }

    /// Creates a facade with a custom backend resolver.
    pub fn with_provider(store: S, provider: impl RemoteProvider + 'static) -> Self {
        Self {
            store,
            provider: Box::new(provider),
        }
    }

    /// Returns the local key/value store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn local(&self) -> LocalNotes<'_, S> {
        LocalNotes::new(&self.store)
    }

    /// Lists notes matching `query`, most recently updated first.
    pub fn list(&self, query: &ListQuery) -> Served<Vec<Note>> {
        let Some(remote) = self.provider.connect() else {
            return Served::new(self.local().list(query), Backend::Local);
        };

        match remote_list(remote.as_ref(), query) {
            Ok(notes) => Served::new(notes, Backend::Remote),
            Err(e) => {
                error!("remote list failed, using local store: {e}");
                Served::new(self.local().list(query), Backend::Fallback)
            }
        }
    }

    /// Creates a note and returns it in canonical shape.
    ///
    /// The id comes from the remote table when it accepts the insert, otherwise
    /// from the local store, where the note is placed first in the collection.
    pub fn create(&self, draft: NoteDraft) -> Served<Note> {
        let now = OffsetDateTime::now_utc();
        let Some(remote) = self.provider.connect() else {
            return Served::new(self.local().create(draft, now), Backend::Local);
        };

        let inserted = remote
            .insert(&draft.to_row(now))
            .and_then(|row| normalize_row(row, "insert"));
        match inserted {
            Ok(note) => {
                debug!("created note {} remotely", note.id);
                Served::new(note, Backend::Remote)
            }
            Err(e) => {
                error!("remote create failed, using local store: {e}");
                Served::new(self.local().create(draft, now), Backend::Fallback)
            }
        }
    }

    /// Applies `update` to the note with `id`, refreshing `updated_at`.
    ///
    /// Returns `None` inside the envelope when no such note exists in the
    /// backend that ends up serving the call.
    pub fn update(&self, id: &NoteId, update: &NoteUpdate) -> Served<Option<Note>> {
        let now = OffsetDateTime::now_utc();
        let Some(remote) = self.provider.connect() else {
            return Served::new(self.local().update(id, update, now), Backend::Local);
        };

        let updated = remote
            .update(id, &update.to_row(now))
            .and_then(|row| normalize_row(row, "update"));
        match updated {
            Ok(note) => Served::new(Some(note), Backend::Remote),
            Err(e) => {
                error!("remote update of {id} failed, using local store: {e}");
                let local = self.local().update(id, update, now);
                if local.is_none() {
                    warn!("note {id} not found in local store either");
                }
                Served::new(local, Backend::Fallback)
            }
        }
    }

    /// Deletes the note with `id`.
    ///
    /// With a remote configured, returns `false` when the remote fails or
    /// reports that no row matched, and leaves the local store untouched.
    /// Without one, deletes locally and always succeeds.
    pub fn delete(&self, id: &NoteId) -> Served<bool> {
        let Some(remote) = self.provider.connect() else {
            return Served::new(self.local().delete(id), Backend::Local);
        };

        let deleted = match remote.delete(id) {
            Ok(Some(_)) => true,
            Ok(None) => {
                warn!("remote delete of {id} matched no row");
                false
            }
            Err(e) => {
                error!("remote delete of {id} failed: {e}");
                false
            }
        };
        Served::new(deleted, Backend::Remote)
    }

    /// Every tag used by any note, deduplicated and sorted (case-sensitive).
    pub fn list_all_tags(&self) -> Served<Vec<String>> {
        self.list(&ListQuery::all()).map(|notes| {
            notes
                .into_iter()
                .flat_map(|n| n.tags)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
    }
}

/// Lists remote rows, then filters and sorts them like the local store does
/// so tag matching is case-insensitive on every backend.
fn remote_list(remote: &dyn RemoteSource, query: &ListQuery) -> Result<Vec<Note>, RemoteError> {
    let notes: Vec<Note> = remote
        .query(query)?
        .into_iter()
        .filter_map(RawNote::normalize)
        .collect();
    Ok(filter_notes(notes, query))
}

fn normalize_row(row: RawNote, operation: &str) -> Result<Note, RemoteError> {
    row.normalize().ok_or_else(|| RemoteError::Api {
        message: format!("{operation} returned a row without an id"),
    })
}
