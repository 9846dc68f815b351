use std::thread::sleep;
use std::time::Duration;

use notekeeper::store::STORAGE_KEY;
use notekeeper::{
    Backend, KeyValueStore, ListQuery, MemoryStore, NoteDraft, NoteId, NoteUpdate, NotesService,
    SqliteStore,
};
use tempfile::tempdir;

fn service() -> NotesService<MemoryStore> {
    NotesService::local_only(MemoryStore::new())
}

#[test]
fn test_groceries_scenario_without_remote() {
    let service = service();

    let created = service.create(
        NoteDraft::new()
            .title("Groceries")
            .content("milk, eggs")
            .tags(["home"]),
    );
    assert_eq!(created.backend(), Backend::Local);
    let note = created.into_value();

    assert!(note.id.is_local());
    assert_eq!(note.tags, vec!["home"]);
    assert_eq!(
        note.created_at.unix_timestamp(),
        note.updated_at.unix_timestamp()
    );

    let by_search = service.list(&ListQuery::all().search("milk")).into_value();
    assert_eq!(by_search, vec![note.clone()]);

    let by_tag = service.list(&ListQuery::all().tag("home")).into_value();
    assert_eq!(by_tag, vec![note]);

    let other_tag = service.list(&ListQuery::all().tag("work")).into_value();
    assert!(other_tag.is_empty());
}

#[test]
fn test_created_note_is_listed_exactly_once() {
    let service = service();
    service.create(NoteDraft::new().title("one"));
    let created = service.create(NoteDraft::new().title("two")).into_value();

    let listed = service.list(&ListQuery::all()).into_value();
    let matches = listed.iter().filter(|n| n.id == created.id).count();
    assert_eq!(matches, 1);
    assert_eq!(listed.len(), 2);
}

#[test]
fn test_list_is_sorted_by_update_time_descending() {
    let service = service();
    let a = service.create(NoteDraft::new().title("a")).into_value();
    sleep(Duration::from_millis(2));
    let b = service.create(NoteDraft::new().title("b")).into_value();
    sleep(Duration::from_millis(2));
    service.update(&a.id, &NoteUpdate::new().content("touched"));

    let listed = service.list(&ListQuery::all()).into_value();
    let ids: Vec<&NoteId> = listed.iter().map(|n| &n.id).collect();
    assert_eq!(ids, vec![&a.id, &b.id]);
    assert!(
        listed
            .windows(2)
            .all(|pair| pair[0].updated_at >= pair[1].updated_at)
    );
}

#[test]
fn test_update_title_leaves_other_fields() {
    let service = service();
    let before = service
        .create(NoteDraft::new().title("Old").content("body").tags(["t"]))
        .into_value();
    sleep(Duration::from_millis(2));

    let after = service
        .update(&before.id, &NoteUpdate::new().title("New"))
        .into_value()
        .expect("note exists");

    assert_eq!(after.title, "New");
    assert_eq!(after.content, before.content);
    assert_eq!(after.tags, before.tags);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);

    let listed = service.list(&ListQuery::all()).into_value();
    assert_eq!(listed, vec![after]);
}

#[test]
fn test_update_unknown_id_returns_none() {
    let service = service();
    let result = service.update(&NoteId::new("ghost"), &NoteUpdate::new().title("x"));
    assert_eq!(result.backend(), Backend::Local);
    assert_eq!(result.into_value(), None);
}

#[test]
fn test_local_delete_is_idempotent() {
    let service = service();
    let note = service.create(NoteDraft::new()).into_value();

    assert!(service.delete(&note.id).into_value());
    assert!(service.delete(&note.id).into_value());
    assert!(service.delete(&NoteId::new("never-existed")).into_value());
    assert!(service.list(&ListQuery::all()).into_value().is_empty());
}

#[test]
fn test_list_all_tags_dedups_and_sorts() {
    let service = service();
    service.create(NoteDraft::new().tags(["b", "a"]));
    service.create(NoteDraft::new().tags(["a", "c"]));

    assert_eq!(service.list_all_tags().into_value(), vec!["a", "b", "c"]);
}

#[test]
fn test_list_all_tags_is_case_sensitive() {
    let service = service();
    service.create(NoteDraft::new().tags(["work", "Work", "alpha"]));

    assert_eq!(
        service.list_all_tags().into_value(),
        vec!["Work", "alpha", "work"]
    );
}

#[test]
fn test_every_note_is_in_canonical_shape() {
    let store = MemoryStore::new();
    store
        .set(
            STORAGE_KEY,
            r#"[
                {"id":"legacy-1","title":"","tags":"x, ,y","updated_at":"2024-01-01T00:00:00Z"},
                {"id":"legacy-2","content":null,"tags":[null,"", "z"]}
            ]"#,
        )
        .unwrap();
    let service = NotesService::local_only(store);

    for note in service.list(&ListQuery::all()).into_value() {
        assert!(!note.title.is_empty());
        assert!(note.tags.iter().all(|t| !t.trim().is_empty()));
    }
}

#[test]
fn test_corrupt_store_lists_empty_and_recovers_on_write() {
    let store = MemoryStore::new();
    store.set(STORAGE_KEY, "not json at all").unwrap();
    let service = NotesService::local_only(store);

    assert!(service.list(&ListQuery::all()).into_value().is_empty());

    let note = service.create(NoteDraft::new().title("fresh")).into_value();
    assert_eq!(service.list(&ListQuery::all()).into_value(), vec![note]);
}

#[test]
fn test_sqlite_store_persists_across_services() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let created = {
        let service = NotesService::local_only(SqliteStore::open(&path).unwrap());
        service
            .create(NoteDraft::new().title("durable").tags(["keep"]))
            .into_value()
    };

    let reopened = NotesService::local_only(SqliteStore::open(&path).unwrap());
    assert_eq!(
        reopened.list(&ListQuery::all()).into_value(),
        vec![created]
    );
}
