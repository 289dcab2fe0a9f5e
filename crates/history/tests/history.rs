use chrono::{DateTime, TimeZone, Utc};
use manos_history::{
    FileStore, HISTORY_KEY, History, HistoryEntry, HistoryError, KeyValueStore, MemoryStore,
};

fn at(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

#[test]
fn entries_list_most_recent_first() {
    let mut history = History::new(MemoryStore::default());
    history.save_at("First", "<p>one</p>", at(1_000)).unwrap();
    history.save_at("Second", "<p>two</p>", at(2_000)).unwrap();

    let titles: Vec<_> = history
        .list()
        .unwrap()
        .into_iter()
        .map(|entry| entry.title)
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[test]
fn blank_title_defaults_and_blank_content_is_rejected() {
    let mut history = History::new(MemoryStore::default());

    let entry = history.save_at("   ", "<p>x</p>", at(5)).unwrap();
    assert_eq!(entry.title, "Untitled Draft");
    assert_eq!(entry.id, "5");

    assert!(matches!(
        history.save_at("Empty", " \n\t", at(6)),
        Err(HistoryError::EmptyContent)
    ));
    assert_eq!(history.list().unwrap().len(), 1);
}

#[test]
fn ids_stay_unique_within_the_same_millisecond() {
    let mut history = History::new(MemoryStore::default());
    let a = history.save_at("a", "<p>a</p>", at(42)).unwrap();
    let b = history.save_at("b", "<p>b</p>", at(42)).unwrap();
    let c = history.save_at("c", "<p>c</p>", at(42)).unwrap();

    assert_eq!((a.id.as_str(), b.id.as_str(), c.id.as_str()), ("42", "43", "44"));
}

#[test]
fn delete_and_get_by_id() {
    let mut history = History::new(MemoryStore::default());
    let keep = history.save_at("keep", "<p>k</p>", at(1)).unwrap();
    let gone = history.save_at("drop", "<p>d</p>", at(2)).unwrap();

    assert!(history.delete(&gone.id).unwrap());
    assert!(!history.delete(&gone.id).unwrap());
    assert_eq!(history.get(&keep.id).unwrap(), keep);
    assert!(matches!(history.get(&gone.id), Err(HistoryError::NotFound(id)) if id == gone.id));
}

#[test]
fn preview_strips_markup_and_truncates() {
    let entry = HistoryEntry {
        id: "1".into(),
        title: "t".into(),
        content: format!("<h1>Title</h1><p>{}</p>", "x".repeat(100)),
        date: at(1),
    };
    let preview = entry.preview();
    assert!(preview.starts_with("Titlexxx"));
    assert_eq!(preview.chars().count(), 60);
}

#[test]
fn reads_entries_written_by_the_browser_app() {
    let mut store = MemoryStore::default();
    store
        .set(
            HISTORY_KEY,
            r#"[{"id":"1700000000000","title":"Draft","content":"<p>Hi</p>","date":"2023-11-14T22:13:20.000Z"}]"#,
        )
        .unwrap();

    let history = History::new(store);
    let entries = history.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].date, at(1_700_000_000_000));
}

#[test]
fn corrupt_storage_is_reported() {
    let mut store = MemoryStore::default();
    store.set(HISTORY_KEY, "not json").unwrap();

    assert!(matches!(History::new(store).list(), Err(HistoryError::Corrupt(_))));
}

#[test]
fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("data");

    let mut history = History::new(FileStore::new(&nested));
    assert!(history.list().unwrap().is_empty());
    let saved = history.save("Kept", "<p>on disk</p>").unwrap();

    assert!(nested.join("rich_text_editor_history.json").is_file());
    let reopened = History::new(FileStore::new(&nested));
    assert_eq!(reopened.list().unwrap(), vec![saved]);
}
