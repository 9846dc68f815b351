pub mod autosave;
pub mod config;
pub mod logging;
pub mod models;
pub mod remote;
pub mod service;
pub mod session;
pub mod store;
pub mod utils;

pub use autosave::{Autosave, EditorDraft, PendingSave, SwitchPolicy};
pub use config::{EnvRemoteProvider, LocalOnly, RemoteConfig, RemoteProvider};
pub use models::{
    DEFAULT_TITLE, Note, NoteBuilder, NoteDraft, NoteId, NoteUpdate, RawNote, parse_tag_list,
};
pub use remote::{RemoteClient, RemoteClientBuilder, RemoteError, RemoteSource};
pub use service::{Backend, NotesService, Served};
pub use session::NotesSession;
pub use store::{KeyValueStore, ListQuery, LocalNotes, MemoryStore, SqliteStore, StoreError};
