//! Browser speech and clipboard bindings.
//!
//! Everything here is looked up at runtime so the UI degrades to hidden
//! controls on webviews without the Web Speech API.

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "navigator", "clipboard"], js_name = writeText, catch)]
    async fn clipboard_write_text(text: &str) -> Result<JsValue, JsValue>;
}

fn global_prop(name: &str) -> Option<JsValue> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn set_prop(target: &JsValue, name: &str, value: &JsValue) -> Result<(), String> {
    Reflect::set(target, &JsValue::from_str(name), value)
        .map(|_| ())
        .map_err(crate::api::extract_error)
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, String> {
    let method = Reflect::get(target, &JsValue::from_str(name))
        .map_err(crate::api::extract_error)?
        .dyn_into::<Function>()
        .map_err(|_| format!("{name} is not a function"))?;
    Reflect::apply(&method, target, args).map_err(crate::api::extract_error)
}

pub async fn copy_to_clipboard(text: &str) -> Result<(), String> {
    clipboard_write_text(text)
        .await
        .map(|_| ())
        .map_err(crate::api::extract_error)
}

pub fn synthesis_supported() -> bool {
    global_prop("speechSynthesis").is_some() && global_prop("SpeechSynthesisUtterance").is_some()
}

/// Speaks `text`, cancelling whatever is currently being spoken.
pub fn speak(text: &str, lang: &str) -> Result<(), String> {
    let synth = global_prop("speechSynthesis").ok_or("Speech synthesis not supported")?;
    let ctor = global_prop("SpeechSynthesisUtterance")
        .ok_or("Speech synthesis not supported")?
        .dyn_into::<Function>()
        .map_err(|_| "Speech synthesis not supported".to_string())?;

    call_method(&synth, "cancel", &Array::new())?;

    let utterance = Reflect::construct(&ctor, &Array::of1(&JsValue::from_str(text)))
        .map_err(crate::api::extract_error)?;
    set_prop(&utterance, "lang", &JsValue::from_str(lang))?;
    call_method(&synth, "speak", &Array::of1(&utterance))?;
    Ok(())
}

pub fn stop_speaking() {
    if let Some(synth) = global_prop("speechSynthesis") {
        let _ = call_method(&synth, "cancel", &Array::new());
    }
}

fn recognition_ctor() -> Option<Function> {
    global_prop("SpeechRecognition")
        .or_else(|| global_prop("webkitSpeechRecognition"))
        .and_then(|v| v.dyn_into::<Function>().ok())
}

pub fn recognition_supported() -> bool {
    recognition_ctor().is_some()
}

/// A running continuous recognition session. Stops when dropped.
pub struct Recognizer {
    inner: JsValue,
    _on_result: Closure<dyn FnMut(JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
    _on_end: Closure<dyn FnMut()>,
}

impl Recognizer {
    /// `on_transcript` gets `(text, is_final)` for every result; interim
    /// text is reported separately from finalized text.
    pub fn start(
        lang: &str,
        mut on_transcript: impl FnMut(String, bool) + 'static,
        mut on_error: impl FnMut(String) + 'static,
        mut on_end: impl FnMut() + 'static,
    ) -> Result<Self, String> {
        let ctor = recognition_ctor().ok_or("Speech recognition not supported")?;
        let inner = Reflect::construct(&ctor, &Array::new()).map_err(crate::api::extract_error)?;

        set_prop(&inner, "continuous", &JsValue::TRUE)?;
        set_prop(&inner, "interimResults", &JsValue::TRUE)?;
        set_prop(&inner, "lang", &JsValue::from_str(lang))?;

        let on_result = Closure::wrap(Box::new(move |event: JsValue| {
            let (final_text, interim_text) = collect_transcripts(&event);
            if !final_text.is_empty() {
                on_transcript(final_text, true);
            }
            if !interim_text.is_empty() {
                on_transcript(interim_text, false);
            }
        }) as Box<dyn FnMut(JsValue)>);

        let on_error_cb = Closure::wrap(Box::new(move |event: JsValue| {
            let reason = Reflect::get(&event, &JsValue::from_str("error"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| "unknown".to_string());
            on_error(format!("Speech recognition error: {reason}"));
        }) as Box<dyn FnMut(JsValue)>);

        let on_end_cb = Closure::wrap(Box::new(move || on_end()) as Box<dyn FnMut()>);

        set_prop(&inner, "onresult", on_result.as_ref())?;
        set_prop(&inner, "onerror", on_error_cb.as_ref())?;
        set_prop(&inner, "onend", on_end_cb.as_ref())?;

        call_method(&inner, "start", &Array::new())?;

        Ok(Self {
            inner,
            _on_result: on_result,
            _on_error: on_error_cb,
            _on_end: on_end_cb,
        })
    }

    pub fn stop(&self) {
        let _ = call_method(&self.inner, "stop", &Array::new());
    }
}

impl Drop for Recognizer {
    fn drop(&mut self) {
        for handler in ["onresult", "onerror", "onend"] {
            let _ = set_prop(&self.inner, handler, &JsValue::NULL);
        }
        self.stop();
    }
}

fn collect_transcripts(event: &JsValue) -> (String, String) {
    let start = Reflect::get(event, &JsValue::from_str("resultIndex"))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0) as u32;
    let Ok(results) = Reflect::get(event, &JsValue::from_str("results")) else {
        return (String::new(), String::new());
    };
    let len = Reflect::get(&results, &JsValue::from_str("length"))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0) as u32;

    let mut final_text = String::new();
    let mut interim_text = String::new();
    for i in start..len {
        let Ok(result) = Reflect::get_u32(&results, i) else {
            continue;
        };
        let is_final = Reflect::get(&result, &JsValue::from_str("isFinal"))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let transcript = Reflect::get_u32(&result, 0)
            .and_then(|alt| Reflect::get(&alt, &JsValue::from_str("transcript")))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        if is_final {
            final_text.push_str(&transcript);
        } else {
            interim_text.push_str(&transcript);
        }
    }
    (final_text, interim_text)
}
