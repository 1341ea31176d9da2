mod common;

use std::sync::Arc;

use common::{FakeFetcher, Route, HOST};
use offline_translate_lib::cache::{etag_key, version_key, CacheError, ModelCache};
use offline_translate_lib::storage::ModelStorage;
use serde_json::json;

const EN_ES_URL: &str = "https://models.test/Xenova/opus-mt-en-es/resolve/main/model.onnx";

fn cache(label: &str) -> (ModelCache<Arc<FakeFetcher>>, Arc<FakeFetcher>, std::path::PathBuf) {
    let dir = common::temp_dir(label);
    let storage = Arc::new(ModelStorage::open(&dir, None).unwrap());
    let fetcher = Arc::new(FakeFetcher::new());
    let cache = ModelCache::new(storage, Arc::clone(&fetcher), format!("{HOST}/"));
    (cache, fetcher, dir)
}

#[test]
fn model_url_follows_host_layout() {
    let (cache, _, dir) = cache("cache_url");
    assert_eq!(cache.model_url("Xenova/opus-mt-en-es"), EN_ES_URL);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn uncached_pair_reports_unknown_version() {
    let (cache, _, dir) = cache("cache_status");
    let status = cache.is_cached("en", "es").unwrap();
    assert!(!status.is_cached);
    assert_eq!(status.size, 0);
    assert_eq!(status.version, "unknown");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn download_stores_model_and_reports_progress() {
    let (cache, fetcher, dir) = cache("cache_download");
    let body = vec![7u8; 20_000];
    fetcher.route(EN_ES_URL, Route::ok(&body).with_etag("abc123"));

    let mut progress = Vec::new();
    cache
        .download_and_cache("en", "es", |p| progress.push(p))
        .unwrap();

    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().copied(), Some(100.0));

    let status = cache.is_cached("en", "es").unwrap();
    assert!(status.is_cached);
    assert_eq!(status.size, 20_000);
    assert_ne!(status.version, "unknown");

    let storage = cache.storage();
    assert_eq!(
        storage.get_meta(&version_key("Xenova/opus-mt-en-es")).unwrap(),
        Some(json!(status.version))
    );
    assert_eq!(
        storage.get_meta(&etag_key("Xenova/opus-mt-en-es")).unwrap(),
        Some(json!("abc123"))
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn second_download_is_a_no_op() {
    let (cache, fetcher, dir) = cache("cache_idempotent");
    fetcher.route(EN_ES_URL, Route::ok(b"model"));

    cache.download_and_cache("en", "es", |_| {}).unwrap();
    let mut calls = 0;
    cache.download_and_cache("en", "es", |_| calls += 1).unwrap();

    assert_eq!(fetcher.get_count(EN_ES_URL), 1);
    assert_eq!(calls, 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unknown_length_downloads_without_progress() {
    let (cache, fetcher, dir) = cache("cache_no_length");
    let mut route = Route::ok(b"model bytes");
    route.content_length = None;
    fetcher.route(EN_ES_URL, route);

    let mut calls = 0;
    cache.download_and_cache("en", "es", |_| calls += 1).unwrap();
    assert_eq!(calls, 0);
    assert!(cache.is_cached("en", "es").unwrap().is_cached);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn http_error_stores_nothing() {
    let (cache, fetcher, dir) = cache("cache_http_error");
    fetcher.route(EN_ES_URL, Route::status(503));

    let err = cache.download_and_cache("en", "es", |_| {}).unwrap_err();
    assert!(matches!(err, CacheError::Download(_)));
    assert!(err.to_string().contains("503"));
    assert!(!cache.is_cached("en", "es").unwrap().is_cached);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn truncated_body_stores_nothing() {
    let (cache, fetcher, dir) = cache("cache_truncated");
    fetcher.route(EN_ES_URL, Route::ok(&[1; 50]).with_length(100));

    let err = cache.download_and_cache("en", "es", |_| {}).unwrap_err();
    assert!(err.to_string().contains("incomplete"));
    assert!(!cache.is_cached("en", "es").unwrap().is_cached);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn network_failure_surfaces_fetch_error() {
    let (cache, fetcher, dir) = cache("cache_offline");
    fetcher.set_offline(true);

    let err = cache.download_and_cache("en", "es", |_| {}).unwrap_err();
    assert!(matches!(err, CacheError::Fetch(_)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_pair_never_touches_network() {
    let (cache, fetcher, dir) = cache("cache_unsupported");

    let err = cache.download_and_cache("en", "en", |_| {}).unwrap_err();
    assert!(matches!(err, CacheError::UnsupportedPair(_)));
    assert_eq!(fetcher.total_gets(), 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn remove_and_list_cached() {
    let (cache, fetcher, dir) = cache("cache_list");
    fetcher.route(EN_ES_URL, Route::ok(b"es"));
    fetcher.route(
        "https://models.test/Xenova/opus-mt-en-fr/resolve/main/model.onnx",
        Route::ok(b"fr!"),
    );
    cache.download_and_cache("en", "es", |_| {}).unwrap();
    cache.download_and_cache("en", "fr", |_| {}).unwrap();

    let listed = cache.list_cached().unwrap();
    let keys: Vec<_> = listed.iter().map(|m| m.model_key.as_str()).collect();
    assert_eq!(keys, vec!["en-es", "en-fr"]);
    assert_eq!(listed[1].model_id, "Xenova/opus-mt-en-fr");
    assert_eq!(cache.cached_size("en", "fr").unwrap(), 3);

    cache.remove("en", "es").unwrap();
    assert!(!cache.is_cached("en", "es").unwrap().is_cached);
    assert_eq!(cache.list_cached().unwrap().len(), 1);

    cache.clear_all().unwrap();
    assert!(cache.list_cached().unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn update_check_compares_etags() {
    let (cache, fetcher, dir) = cache("cache_update");
    assert!(!cache.check_for_update("en", "es").unwrap());

    fetcher.route(EN_ES_URL, Route::ok(b"v1").with_etag("v1"));
    cache.download_and_cache("en", "es", |_| {}).unwrap();
    assert!(!cache.check_for_update("en", "es").unwrap());

    fetcher.route(EN_ES_URL, Route::ok(b"v2").with_etag("v2"));
    assert!(cache.check_for_update("en", "es").unwrap());

    fetcher.set_offline(true);
    assert!(!cache.check_for_update("en", "es").unwrap());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn model_without_version_marker_needs_update() {
    let (cache, fetcher, dir) = cache("cache_no_version");
    cache
        .storage()
        .save("en-es", "Xenova/opus-mt-en-es", b"legacy", "0")
        .unwrap();

    assert!(cache.check_for_update("en", "es").unwrap());
    assert_eq!(fetcher.head_count(), 0);

    let _ = std::fs::remove_dir_all(&dir);
}
