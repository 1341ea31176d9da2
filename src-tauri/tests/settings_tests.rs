mod common;

use offline_translate_lib::error::AppError;
use offline_translate_lib::settings::{default_storage_root, Settings, SettingsError};

#[test]
fn defaults_point_at_the_public_model_host() {
    let settings = Settings::default();
    assert_eq!(settings.model_host, "https://huggingface.co");
    assert_eq!(settings.model_host_name().as_deref(), Some("huggingface.co"));
    assert_eq!(settings.source_lang, "en");
    assert_eq!(settings.target_lang, "es");
    assert_eq!(settings.storage_root(), default_storage_root());
    assert_eq!(settings.quota_bytes(), None);
    assert!(settings.validate().is_ok());
}

#[test]
fn blank_storage_path_uses_default_root() {
    let settings = Settings {
        storage_path: Some("   ".into()),
        ..Settings::default()
    };
    assert_eq!(settings.storage_root(), default_storage_root());
    assert!(settings.validate().is_ok());
}

#[test]
fn custom_storage_path_must_exist() {
    let dir = common::temp_dir("settings_path");
    let good = Settings {
        storage_path: Some(dir.display().to_string()),
        ..Settings::default()
    };
    assert_eq!(good.storage_root(), dir);
    assert!(good.validate().is_ok());

    let bad = Settings {
        storage_path: Some(dir.join("missing").display().to_string()),
        ..Settings::default()
    };
    assert!(matches!(bad.validate(), Err(SettingsError::InvalidPath(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn model_host_must_be_a_url() {
    let settings = Settings {
        model_host: "huggingface.co".into(),
        ..Settings::default()
    };
    assert!(settings.model_host_name().is_none());
    assert!(matches!(settings.validate(), Err(SettingsError::InvalidHost(_))));
}

#[test]
fn quota_is_megabytes() {
    let settings = Settings {
        storage_quota_mb: Some(2),
        ..Settings::default()
    };
    assert_eq!(settings.quota_bytes(), Some(2 * 1024 * 1024));

    let zero = Settings {
        storage_quota_mb: Some(0),
        ..Settings::default()
    };
    assert_eq!(zero.quota_bytes(), None);
}

#[test]
fn settings_use_camel_case_on_the_wire() {
    let value = serde_json::to_value(Settings::default()).unwrap();
    assert_eq!(value["modelHost"], "https://huggingface.co");
    assert_eq!(value["storagePath"], serde_json::Value::Null);

    let parsed: Settings = serde_json::from_value(serde_json::json!({
        "storagePath": null,
        "modelHost": "https://mirror.example.org",
        "storageQuotaMb": 512,
        "sourceLang": "fr",
        "targetLang": "en"
    }))
    .unwrap();
    assert_eq!(parsed.storage_quota_mb, Some(512));
    assert_eq!(parsed.model_host_name().as_deref(), Some("mirror.example.org"));
}

#[test]
fn app_errors_serialize_as_user_messages() {
    let err = AppError::from(SettingsError::InvalidHost("x".into()));
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        serde_json::json!(SettingsError::InvalidHost("x".into()).user_message())
    );
}
