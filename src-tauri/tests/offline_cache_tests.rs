mod common;

use std::sync::Arc;

use common::{FakeFetcher, Route};
use offline_translate_lib::net::{
    AssetRequest, Destination, OfflineCache, ResponseSource, MODEL_CACHE, STATIC_CACHE,
};

const ORIGIN: &str = "tauri://localhost";
const MODEL_URL: &str = "https://models.test/Xenova/opus-mt-en-es/resolve/main/config.json";

fn offline(label: &str) -> (OfflineCache<Arc<FakeFetcher>>, Arc<FakeFetcher>, std::path::PathBuf) {
    let dir = common::temp_dir(label);
    let fetcher = Arc::new(FakeFetcher::new());
    let cache = OfflineCache::new(
        &dir,
        ORIGIN,
        vec!["models.test".to_string()],
        Arc::clone(&fetcher),
    );
    (cache, fetcher, dir)
}

#[test]
fn model_requests_are_recognized_by_host() {
    let (cache, _, dir) = offline("offline_hosts");
    assert!(cache.is_model_request(MODEL_URL));
    assert!(cache.is_model_request("https://cdn.example.org/model.onnx"));
    assert!(!cache.is_model_request("tauri://localhost/index.html"));
    assert!(!cache.is_model_request("https://example.org/app.js"));
    assert!(!cache.is_model_request("not a url"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn model_files_are_served_cache_first() {
    let (cache, fetcher, dir) = offline("offline_cache_first");
    fetcher.route(MODEL_URL, Route::ok(b"{\"eos_token_id\":0}"));
    let request = AssetRequest::asset(MODEL_URL, Destination::Other);

    let first = cache.respond(&request).unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(first.source, ResponseSource::Network);

    fetcher.set_offline(true);
    let second = cache.respond(&request).unwrap();
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(second.body.read_all().unwrap(), b"{\"eos_token_id\":0}");
    assert_eq!(fetcher.get_count(MODEL_URL), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn model_download_reports_progress() {
    let (cache, fetcher, dir) = offline("offline_progress");
    fetcher.route(MODEL_URL, Route::ok(&[3; 10_000]));

    let mut seen = Vec::new();
    cache
        .respond_with_progress(
            &AssetRequest::asset(MODEL_URL, Destination::Other),
            &mut |received, total| seen.push((received, total)),
        )
        .unwrap();

    assert_eq!(seen.last().copied(), Some((10_000, Some(10_000))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_model_responses_are_not_cached() {
    let (cache, fetcher, dir) = offline("offline_model_404");
    let request = AssetRequest::asset(MODEL_URL, Destination::Other);

    let missing = cache.respond(&request).unwrap();
    assert_eq!(missing.status, 404);

    fetcher.route(MODEL_URL, Route::ok(b"config"));
    let found = cache.respond(&request).unwrap();
    assert_eq!(found.status, 200);
    assert_eq!(fetcher.get_count(MODEL_URL), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn truncated_model_download_is_discarded() {
    let (cache, fetcher, dir) = offline("offline_truncated");
    fetcher.route(MODEL_URL, Route::ok(b"short").with_length(500));
    let request = AssetRequest::asset(MODEL_URL, Destination::Other);

    assert!(cache.respond(&request).is_err());

    fetcher.set_offline(true);
    assert!(cache.respond(&request).is_err(), "nothing should be cached");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn documents_fall_back_to_cache_when_offline() {
    let (cache, fetcher, dir) = offline("offline_documents");
    let url = "tauri://localhost/app.js";
    fetcher.route(url, Route::ok(b"console.log(1)"));
    let request = AssetRequest::asset(url, Destination::Script);

    let online = cache.respond(&request).unwrap();
    assert_eq!(online.source, ResponseSource::Network);

    fetcher.set_offline(true);
    let offline = cache.respond(&request).unwrap();
    assert_eq!(offline.source, ResponseSource::Cache);
    assert_eq!(offline.status, 200);
    assert_eq!(offline.body.read_all().unwrap(), b"console.log(1)");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn uncacheable_destinations_are_not_stored() {
    let (cache, fetcher, dir) = offline("offline_other");
    let url = "tauri://localhost/data.bin";
    fetcher.route(url, Route::ok(b"data"));
    let request = AssetRequest::asset(url, Destination::Other);

    cache.respond(&request).unwrap();
    fetcher.set_offline(true);

    let offline = cache.respond(&request).unwrap();
    assert_eq!(offline.status, 408);
    assert_eq!(offline.source, ResponseSource::Offline);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn offline_navigation_serves_index_or_placeholder() {
    let (cache, fetcher, dir) = offline("offline_navigation");
    fetcher.set_offline(true);

    let placeholder = cache
        .respond(&AssetRequest::navigation("tauri://localhost/settings"))
        .unwrap();
    assert_eq!(placeholder.status, 503);
    assert_eq!(placeholder.body.read_all().unwrap(), b"Offline");

    fetcher.set_offline(false);
    fetcher.route("tauri://localhost/index.html", Route::ok(b"<html></html>"));
    cache.install();
    fetcher.set_offline(true);

    let index = cache
        .respond(&AssetRequest::navigation("tauri://localhost/settings"))
        .unwrap();
    assert_eq!(index.status, 200);
    assert_eq!(index.source, ResponseSource::Cache);
    assert_eq!(index.body.read_all().unwrap(), b"<html></html>");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn install_skips_missing_assets() {
    let (cache, fetcher, dir) = offline("offline_install");
    fetcher.route("tauri://localhost/", Route::ok(b"root"));

    cache.install();

    assert_eq!(fetcher.total_gets(), 3);
    fetcher.set_offline(true);
    let manifest = cache
        .respond(&AssetRequest::asset(
            "tauri://localhost/manifest.json",
            Destination::Other,
        ))
        .unwrap();
    assert_eq!(manifest.status, 408);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn activate_removes_stale_generations_only() {
    let (cache, fetcher, dir) = offline("offline_activate");
    fetcher.route(MODEL_URL, Route::ok(b"config"));
    cache
        .respond(&AssetRequest::asset(MODEL_URL, Destination::Other))
        .unwrap();
    std::fs::create_dir_all(dir.join("static-v0")).unwrap();
    std::fs::create_dir_all(dir.join("models-v0")).unwrap();

    cache.activate();

    assert!(!dir.join("static-v0").exists());
    assert!(!dir.join("models-v0").exists());
    assert!(dir.join(MODEL_CACHE).exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn clear_empties_both_caches() {
    let (cache, fetcher, dir) = offline("offline_clear");
    fetcher.route(MODEL_URL, Route::ok(b"config"));
    fetcher.route("tauri://localhost/index.html", Route::ok(b"<html></html>"));
    cache.install();
    cache
        .respond(&AssetRequest::asset(MODEL_URL, Destination::Other))
        .unwrap();

    cache.clear().unwrap();

    assert!(!dir.join(STATIC_CACHE).exists());
    assert!(!dir.join(MODEL_CACHE).exists());
    cache.clear().expect("clearing twice is fine");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dev_server_shell_survives_going_offline() {
    let dir = common::temp_dir("offline_dev_shell");
    let fetcher = Arc::new(FakeFetcher::new());
    let cache = OfflineCache::new(
        &dir,
        "http://localhost:1420",
        vec!["models.test".to_string()],
        Arc::clone(&fetcher),
    );
    fetcher.route("http://localhost:1420/index.html", Route::ok(b"<html>shell</html>"));

    cache.install();
    cache.activate();
    fetcher.set_offline(true);

    let page = cache
        .respond(&AssetRequest::navigation("http://localhost:1420/"))
        .unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.source, ResponseSource::Cache);
    assert_eq!(page.body.read_all().unwrap(), b"<html>shell</html>");
    assert!(dir.join(STATIC_CACHE).is_dir());

    let _ = std::fs::remove_dir_all(&dir);
}
