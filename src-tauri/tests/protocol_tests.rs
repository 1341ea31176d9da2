use offline_translate_lib::worker::protocol::*;
use serde_json::json;

#[test]
fn translate_request_wire_shape() {
    let request = WorkerRequest::translate("Hello", "en", "es");
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "type": "translate",
            "payload": { "text": "Hello", "sourceLang": "en", "targetLang": "es" }
        })
    );
    assert_eq!(request.kind(), "translate");
}

#[test]
fn load_and_unload_request_wire_shape() {
    let load = WorkerRequest::load_model("Xenova/opus-mt-en-fr", "en", "fr");
    assert_eq!(
        serde_json::to_value(&load).unwrap(),
        json!({
            "type": "loadModel",
            "payload": { "modelId": "Xenova/opus-mt-en-fr", "sourceLang": "en", "targetLang": "fr" }
        })
    );

    let unload = WorkerRequest::unload_model();
    assert_eq!(
        serde_json::to_value(&unload).unwrap(),
        json!({ "type": "unloadModel", "payload": {} })
    );
}

#[test]
fn responses_use_lowercase_status_and_snake_case_codes() {
    assert_eq!(
        serde_json::to_value(WorkerResponse::status(Status::Ready, "Model loaded")).unwrap(),
        json!({ "type": "status", "payload": { "status": "ready", "message": "Model loaded" } })
    );
    assert_eq!(
        serde_json::to_value(WorkerResponse::error(ErrorCode::ModelNotLoaded, "Model not loaded"))
            .unwrap(),
        json!({ "type": "error", "payload": { "message": "Model not loaded", "code": "model_not_loaded" } })
    );
    assert_eq!(
        serde_json::to_value(WorkerResponse::loaded("Xenova/opus-mt-en-es")).unwrap(),
        json!({ "type": "loaded", "payload": { "modelId": "Xenova/opus-mt-en-es", "status": "ready" } })
    );
}

#[test]
fn result_omits_missing_confidence() {
    let value = serde_json::to_value(WorkerResponse::result("Hola".into(), None)).unwrap();
    assert_eq!(
        value,
        json!({ "type": "result", "payload": { "translation": "Hola", "isPartial": false } })
    );

    let update = serde_json::to_value(WorkerResponse::update("Ho")).unwrap();
    assert_eq!(update["payload"]["isPartial"], json!(true));
}

#[test]
fn progress_is_clamped() {
    let WorkerResponse::Progress(high) = WorkerResponse::progress(140.0, None) else {
        panic!("expected progress");
    };
    assert_eq!(high.progress, 100.0);

    let WorkerResponse::Progress(low) = WorkerResponse::progress(-3.0, Some("x".into())) else {
        panic!("expected progress");
    };
    assert_eq!(low.progress, 0.0);
    assert_eq!(low.status.as_deref(), Some("x"));
}

#[test]
fn responses_decode_from_wire() {
    let response: WorkerResponse = serde_json::from_value(json!({
        "type": "progress",
        "payload": { "progress": 42.5 }
    }))
    .unwrap();
    assert_eq!(response, WorkerResponse::progress(42.5, None));
}

#[test]
fn decode_request_ignores_unknown_types() {
    assert_eq!(
        decode_request(json!({ "type": "summarize", "payload": {} })).unwrap(),
        None
    );
    assert_eq!(decode_request(json!({ "payload": {} })).unwrap(), None);
    assert_eq!(decode_request(json!("translate")).unwrap(), None);
}

#[test]
fn decode_request_rejects_malformed_known_types() {
    assert!(decode_request(json!({ "type": "translate", "payload": { "text": 5 } })).is_err());
    assert!(decode_request(json!({ "type": "loadModel" })).is_err());
}

#[test]
fn decode_request_accepts_valid_envelopes() {
    let decoded = decode_request(json!({
        "type": "translate",
        "payload": { "text": "Bonjour", "sourceLang": "fr", "targetLang": "en" }
    }))
    .unwrap();
    assert_eq!(decoded, Some(WorkerRequest::translate("Bonjour", "fr", "en")));
}

#[test]
fn only_request_level_failures_end_a_translation() {
    assert!(ErrorCode::ModelNotLoaded.ends_translation());
    assert!(ErrorCode::EmptyInput.ends_translation());
    assert!(ErrorCode::TranslateFailed.ends_translation());
    assert!(!ErrorCode::LoadFailed.ends_translation());
    assert!(!ErrorCode::WorkerPanic.ends_translation());
    assert!(!ErrorCode::UnknownMessage.ends_translation());
}
