//! Local persistence: key/value backends and the note collection stored in them.

mod filter;
mod kv;
mod local;
mod sqlite;

pub use filter::{ListQuery, filter_notes, sort_recent_first};
pub use kv::{KeyValueStore, MemoryStore, StoreError};
pub use local::{LocalNotes, STORAGE_KEY};
pub use sqlite::SqliteStore;
