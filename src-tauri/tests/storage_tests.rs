mod common;

use offline_translate_lib::storage::{ModelStorage, StorageError};
use serde_json::json;

#[test]
fn saved_model_reads_back_with_record() {
    let dir = common::temp_dir("storage_roundtrip");
    let storage = ModelStorage::open(&dir, None).unwrap();

    let saved = storage
        .save("en-es", "Xenova/opus-mt-en-es", b"weights", "1700000000000")
        .unwrap();
    assert_eq!(saved.size, 7);

    let stored = storage.get("en-es").unwrap().expect("model should be stored");
    assert_eq!(stored.blob, b"weights");
    assert_eq!(stored.record.model_id, "Xenova/opus-mt-en-es");
    assert_eq!(stored.record.version, "1700000000000");
    assert!(storage.has("en-es").unwrap());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_model_is_absent_not_an_error() {
    let dir = common::temp_dir("storage_missing");
    let storage = ModelStorage::open(&dir, None).unwrap();

    assert!(storage.get("fr-en").unwrap().is_none());
    assert!(!storage.has("fr-en").unwrap());
    storage.delete("fr-en").expect("deleting a missing key is fine");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn record_without_blob_reads_as_absent() {
    let dir = common::temp_dir("storage_orphan");
    let storage = ModelStorage::open(&dir, None).unwrap();
    storage.save("en-fr", "Xenova/opus-mt-en-fr", b"abc", "1").unwrap();

    std::fs::remove_file(dir.join("models").join("en-fr.bin")).unwrap();

    assert!(storage.get("en-fr").unwrap().is_none());
    assert!(!storage.has("en-fr").unwrap());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn overwrite_replaces_blob_and_leaves_no_temp_files() {
    let dir = common::temp_dir("storage_overwrite");
    let storage = ModelStorage::open(&dir, None).unwrap();
    storage.save("en-de", "Xenova/opus-mt-en-de", b"old", "1").unwrap();
    storage.save("en-de", "Xenova/opus-mt-en-de", b"newer", "2").unwrap();

    let stored = storage.get("en-de").unwrap().unwrap();
    assert_eq!(stored.blob, b"newer");
    assert_eq!(stored.record.version, "2");

    let leftovers: Vec<_> = std::fs::read_dir(dir.join("models"))
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn list_all_is_sorted_by_name() {
    let dir = common::temp_dir("storage_list");
    let storage = ModelStorage::open(&dir, None).unwrap();
    storage.save("fr-en", "Xenova/opus-mt-fr-en", b"1", "1").unwrap();
    storage.save("de-en", "Xenova/opus-mt-de-en", b"2", "1").unwrap();
    storage.save("en-es", "Xenova/opus-mt-en-es", b"3", "1").unwrap();

    let names: Vec<_> = storage
        .list_all()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["de-en", "en-es", "fr-en"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn quota_rejects_oversized_writes() {
    let dir = common::temp_dir("storage_quota");
    let storage = ModelStorage::open(&dir, Some(4096)).unwrap();

    storage.save("en-es", "Xenova/opus-mt-en-es", &[0; 1000], "1").unwrap();
    let err = storage
        .save("en-fr", "Xenova/opus-mt-en-fr", &[0; 8000], "1")
        .unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { needed: 8000, .. }));
    assert!(!storage.has("en-fr").unwrap());

    let usage = storage.usage();
    assert_eq!(usage.quota, 4096);
    assert!(usage.used >= 1000);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn quota_counts_replaced_entry_as_free() {
    let dir = common::temp_dir("storage_quota_replace");
    let storage = ModelStorage::open(&dir, Some(4096)).unwrap();

    storage.save("en-es", "Xenova/opus-mt-en-es", &[0; 2500], "1").unwrap();
    storage
        .save("en-es", "Xenova/opus-mt-en-es", &[1; 3000], "2")
        .expect("replacing frees the old blob's space");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unsafe_names_are_rejected() {
    let dir = common::temp_dir("storage_names");
    let storage = ModelStorage::open(&dir, None).unwrap();

    for name in ["", "../escape", "a/b", "a\\b", ".hidden"] {
        let err = storage.save(name, "id", b"x", "1").unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)), "{name:?} accepted");
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn metadata_survives_reopen_and_clear_all_removes_everything() {
    let dir = common::temp_dir("storage_meta");
    {
        let storage = ModelStorage::open(&dir, None).unwrap();
        storage.set_meta("version-a", json!("123")).unwrap();
        storage.set_meta("etag-a", json!("abc")).unwrap();
        storage.save("en-es", "Xenova/opus-mt-en-es", b"x", "1").unwrap();
    }

    let storage = ModelStorage::open(&dir, None).unwrap();
    assert_eq!(storage.get_meta("version-a").unwrap(), Some(json!("123")));
    assert_eq!(storage.get_meta("missing").unwrap(), None);

    storage.clear_all().unwrap();
    assert!(storage.list_all().unwrap().is_empty());
    assert_eq!(storage.get_meta("etag-a").unwrap(), None);
    storage
        .save("en-es", "Xenova/opus-mt-en-es", b"x", "1")
        .expect("store stays usable after clearing");

    let _ = std::fs::remove_dir_all(&dir);
}
