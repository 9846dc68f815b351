mod changes;
mod ids;
mod note;
mod raw_note;

pub use changes::{NoteDraft, NoteUpdate, format_timestamp};
pub use ids::NoteId;
pub use note::{DEFAULT_TITLE, Note, NoteBuilder};
pub use raw_note::{RawNote, coerce_tags, parse_tag_list};
